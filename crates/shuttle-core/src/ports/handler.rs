//! TaskHandler port - タスクの実処理

use async_trait::async_trait;

/// Processes one task at a time for a [`Worker`](crate::Worker).
///
/// The task is borrowed for the duration of the call. Any error (or panic) is
/// caught by the worker loop and reported to its
/// [`ErrorHook`](crate::ports::ErrorHook) together with the task.
///
/// # 使用例
/// ```ignore
/// struct PrintHandler;
///
/// #[async_trait]
/// impl TaskHandler<String> for PrintHandler {
///     async fn handle(&self, task: &String) -> anyhow::Result<()> {
///         println!("{task}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHandler<T>: Send + Sync {
    async fn handle(&self, task: &T) -> anyhow::Result<()>;
}
