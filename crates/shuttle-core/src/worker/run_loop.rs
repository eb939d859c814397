//! RunLoop - dequeue → handle → (失敗なら) フック、を繰り返すループ本体
//!
//! # フロー
//! 1. 反復の先頭で `state == Running && queue.is_started()` を確認
//! 2. `dequeue()`（cancel と競合させる）
//! 3. タスクがあれば `handle(&task)`（cancel と競合させる）
//! 4. エラー / panic は TaskQueueException に包んで ErrorHook へ。ループは続行
//! 5. 空振り / dequeue 失敗の後は `yield_now()` で他タスクに譲る
//!
//! cancel が勝った場合は実行中の future を drop してループを抜けます。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::WorkerState;
use crate::error::TaskQueueException;
use crate::ports::{ErrorHook, TaskHandler, TaskQueue};

pub(crate) struct RunLoop<T> {
    pub(crate) name: Arc<str>,
    pub(crate) queue: Arc<dyn TaskQueue<T>>,
    pub(crate) handler: Arc<dyn TaskHandler<T>>,
    pub(crate) hook: Arc<dyn ErrorHook<T>>,
    pub(crate) state: Arc<watch::Sender<WorkerState>>,
    pub(crate) cancel: CancellationToken,
}

/// Publishes `Stopped` however the loop future ends (return, panic, drop).
struct ExitGuard(Arc<watch::Sender<WorkerState>>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.send_replace(WorkerState::Stopped);
    }
}

impl<T: Send + Sync + 'static> RunLoop<T> {
    pub(crate) async fn run(self) {
        let _exit = ExitGuard(Arc::clone(&self.state));
        info!(worker = %self.name, "worker loop started");

        while self.keeps_running() {
            let dequeued = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(worker = %self.name, "worker cancelled while waiting for a task");
                    break;
                }
                r = AssertUnwindSafe(self.queue.dequeue()).catch_unwind() => r,
            };

            let task = match dequeued {
                Ok(Ok(Some(task))) => task,
                Ok(Ok(None)) => {
                    trace!(worker = %self.name, "no task available");
                    // dequeue may return straight away; give the runtime a turn
                    tokio::task::yield_now().await;
                    continue;
                }
                Ok(Err(e)) => {
                    self.report(TaskQueueException::dequeue(e.into()));
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(payload) => {
                    self.report(TaskQueueException::dequeue(panic_to_error(payload)));
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            debug!(worker = %self.name, "dispatching task");
            let handled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(worker = %self.name, "worker cancelled while handling a task");
                    break;
                }
                r = AssertUnwindSafe(self.handler.handle(&task)).catch_unwind() => r,
            };

            let cause = match handled {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => panic_to_error(payload),
            };
            self.report(TaskQueueException::handler(task, cause));
        }

        info!(worker = %self.name, "worker loop finished");
    }

    /// Liveness is sampled once per iteration, never mid-iteration.
    fn keeps_running(&self) -> bool {
        self.state.borrow().keeps_running() && self.queue.is_started()
    }

    fn report(&self, error: TaskQueueException<T>) {
        let hook = &self.hook;
        if std::panic::catch_unwind(AssertUnwindSafe(|| hook.on_error(error))).is_err() {
            error!(worker = %self.name, "error hook panicked; failure dropped");
        }
    }
}

fn panic_to_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("panicked: {msg}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_errors() {
        let e = panic_to_error(Box::new("static"));
        assert_eq!(e.to_string(), "panicked: static");

        let e = panic_to_error(Box::new(String::from("owned")));
        assert_eq!(e.to_string(), "panicked: owned");

        let e = panic_to_error(Box::new(42_u8));
        assert_eq!(e.to_string(), "panicked: non-string panic payload");
    }
}
