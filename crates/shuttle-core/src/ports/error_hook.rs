//! ErrorHook port - ループ内の失敗の報告先
//!
//! フックは報告するだけで、ループを止めることはできません。

use std::fmt::Debug;

use crate::error::TaskQueueException;

/// Receives every failure the worker loop catches.
///
/// Called on the worker's own task, between two iterations. A slow hook delays
/// the next `dequeue()`.
pub trait ErrorHook<T>: Send + Sync {
    fn on_error(&self, error: TaskQueueException<T>);
}

impl<T, F> ErrorHook<T> for F
where
    F: Fn(TaskQueueException<T>) + Send + Sync,
{
    fn on_error(&self, error: TaskQueueException<T>) {
        self(error)
    }
}

/// Default hook: one `error` event per failure, then carry on.
#[derive(Debug, Clone, Default)]
pub struct LogErrorHook {
    worker: String,
}

impl LogErrorHook {
    pub fn new(worker: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
        }
    }
}

impl<T: Debug> ErrorHook<T> for LogErrorHook {
    fn on_error(&self, error: TaskQueueException<T>) {
        tracing::error!(
            worker = %self.worker,
            kind = ?error.kind(),
            task = ?error.task(),
            cause = %format_args!("{:#}", error.cause()),
            "{}",
            error.message()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closures_are_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook = {
            let seen = Arc::clone(&seen);
            move |e: TaskQueueException<u32>| seen.lock().unwrap().push(e.into_task())
        };

        hook.on_error(TaskQueueException::handler(7, anyhow::anyhow!("bad")));
        hook.on_error(TaskQueueException::dequeue(anyhow::anyhow!("io")));

        assert_eq!(*seen.lock().unwrap(), vec![Some(7), None]);
    }

    #[test]
    fn log_hook_does_not_panic() {
        let hook = LogErrorHook::new("w-1");
        hook.on_error(TaskQueueException::handler(
            "task-a",
            anyhow::anyhow!("inner").context("outer"),
        ));
    }
}
