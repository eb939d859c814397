//! Worker - 1 本の実行タスクを持ち、TaskQueue からタスクを取り出して処理する
//!
//! # ライフサイクル
//! - `set_task_queue()` → `start()` → `stop()` / `join()`
//! - `start()` / `stop()` / `set_task_queue()` は同じ lifecycle lock で直列化
//! - 1 インスタンスにつき実行は 1 回だけ（再起動は `WorkerError::AlreadyTerminated`）
//!
//! # 停止の段階
//! 1. run flag を下ろす（Running -> StopRequested）。ループは次の反復の先頭で気付く
//! 2. `stop_timeout` だけ待つ
//! 3. まだ終わっていなければ CancellationToken を cancel（dequeue / handle 中の待ちを解く）
//! 4. ループが終わるまで無期限に待つ

mod run_loop;
mod state;

pub use self::state::WorkerState;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use self::run_loop::RunLoop;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::ports::{ErrorHook, LogErrorHook, TaskHandler, TaskQueue};

/// State only touched under the lifecycle lock.
struct Lifecycle<T> {
    queue: Option<Arc<dyn TaskQueue<T>>>,
    /// Set by the first successful `start()`; never cleared.
    launched: bool,
    handle: Option<JoinHandle<()>>,
}

/// Runs one dequeue/dispatch loop on its own tokio task.
///
/// # 使用例
/// ```ignore
/// let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_millis(100)));
/// let worker = Worker::builder(MyHandler)
///     .name("fetcher")
///     .stop_timeout(Duration::from_secs(5))
///     .build();
///
/// worker.set_task_queue(queue.clone()).await?;
/// worker.start().await?;
/// queue.enqueue(task).await?;
/// worker.stop().await;
/// ```
///
/// The loop task is detached from the owner: dropping the tokio runtime does not
/// wait for it, and dropping the `Worker` cancels it.
pub struct Worker<T> {
    name: Arc<str>,
    stop_timeout: Duration,
    handler: Arc<dyn TaskHandler<T>>,
    hook: Arc<dyn ErrorHook<T>>,
    state: Arc<watch::Sender<WorkerState>>,
    cancel: CancellationToken,
    lifecycle: Mutex<Lifecycle<T>>,
}

impl<T: Debug + Send + Sync + 'static> Worker<T> {
    /// Worker with default config and the logging error hook.
    pub fn new(handler: impl TaskHandler<T> + 'static) -> Self {
        Self::builder(handler).build()
    }

    pub fn builder(handler: impl TaskHandler<T> + 'static) -> WorkerBuilder<T> {
        WorkerBuilder::new(handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Bind the queue the loop pulls from. Must happen before `start()`.
    ///
    /// Rebinding before start is last-write-wins. Once the worker has started
    /// the queue is fixed and rebinding fails with [`WorkerError::QueueLocked`].
    pub async fn set_task_queue(&self, queue: Arc<dyn TaskQueue<T>>) -> Result<(), WorkerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.launched {
            warn!(worker = %self.name, "task queue rebind rejected, worker already started");
            return Err(WorkerError::QueueLocked);
        }
        lifecycle.queue = Some(queue);
        info!(worker = %self.name, "task queue set");
        Ok(())
    }

    /// Launch the loop. A no-op while the worker is already running.
    pub async fn start(&self) -> Result<(), WorkerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.launched {
            if self.state().is_stopped() {
                warn!(worker = %self.name, "start ignored, worker already ran once");
                return Err(WorkerError::AlreadyTerminated);
            }
            return Ok(());
        }
        let queue = lifecycle.queue.clone().ok_or(WorkerError::QueueNotSet)?;

        self.state.send_replace(WorkerState::Running);
        let run_loop = RunLoop {
            name: Arc::clone(&self.name),
            queue,
            handler: Arc::clone(&self.handler),
            hook: Arc::clone(&self.hook),
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        };
        lifecycle.handle = Some(tokio::spawn(run_loop.run()));
        lifecycle.launched = true;

        info!(worker = %self.name, "worker started");
        Ok(())
    }

    /// Stop the loop and wait until it has exited.
    ///
    /// Clears the run flag, waits up to `stop_timeout`, then cancels the loop
    /// and waits without bound. Returns only once the loop task is gone. Safe to
    /// call repeatedly and concurrently; later calls find nothing to stop.
    ///
    /// Never fails. If the caller drops this future mid-wait the loop keeps its
    /// stop request and a later `stop()` resumes waiting.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.state.send_if_modified(|state| {
            if *state == WorkerState::Running {
                *state = WorkerState::StopRequested;
                true
            } else {
                false
            }
        });

        let Some(handle) = lifecycle.handle.as_mut() else {
            return;
        };

        info!(worker = %self.name, "worker is joined, waiting until it stops");
        let waited = tokio::time::timeout(self.stop_timeout, &mut *handle).await;
        let joined = match waited {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    worker = %self.name,
                    timeout_ms = u64::try_from(self.stop_timeout.as_millis()).unwrap_or(u64::MAX),
                    "worker has not stopped in time, cancelling"
                );
                self.cancel.cancel();
                handle.await
            }
        };
        lifecycle.handle = None;

        if let Err(e) = joined {
            warn!(worker = %self.name, error = %e, "worker task ended abnormally");
        }
        self.state.send_replace(WorkerState::Stopped);
        info!(worker = %self.name, "worker stopped");
    }

    /// Wait until the loop has exited on its own. Never requests a stop.
    ///
    /// Returns immediately on a stopped worker, including one never started.
    pub async fn join(&self) {
        let mut rx = self.state.subscribe();
        // Err only if the sender is gone, which cannot happen while `self` lives.
        let _ = rx.wait_for(|state| state.is_stopped()).await;
    }
}

impl<T> Drop for Worker<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builder for [`Worker`]; the handler is the only required collaborator.
pub struct WorkerBuilder<T> {
    handler: Arc<dyn TaskHandler<T>>,
    hook: Option<Arc<dyn ErrorHook<T>>>,
    config: WorkerConfig,
}

impl<T: Debug + Send + Sync + 'static> WorkerBuilder<T> {
    pub fn new(handler: impl TaskHandler<T> + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            hook: None,
            config: WorkerConfig::default(),
        }
    }

    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Replace the default [`LogErrorHook`].
    pub fn error_hook(mut self, hook: impl ErrorHook<T> + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Worker<T> {
        let hook: Arc<dyn ErrorHook<T>> = match self.hook {
            Some(hook) => hook,
            None => Arc::new(LogErrorHook::new(self.config.name.clone())),
        };
        let (state, _) = watch::channel(WorkerState::Stopped);

        Worker {
            name: Arc::from(self.config.name.as_str()),
            stop_timeout: self.config.stop_timeout(),
            handler: self.handler,
            hook,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle {
                queue: None,
                launched: false,
                handle: None,
            }),
        }
    }
}
