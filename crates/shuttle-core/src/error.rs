//! Errors - ライフサイクル誤用・キュー障害・ループ内の失敗
//!
//! - [`WorkerError`]: `start()` / `set_task_queue()` の呼び出し側のミス
//! - [`QueueError`]: `TaskQueue::dequeue()` などキュー側の失敗
//! - [`TaskQueueException`]: ループ内で捕捉した失敗をエラーフックに渡すための包み

use thiserror::Error;

/// Lifecycle misuse reported to the owner of a [`Worker`](crate::Worker).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("no task queue bound; call set_task_queue() before start()")]
    QueueNotSet,

    #[error("task queue cannot be rebound after the worker has started")]
    QueueLocked,

    #[error("worker has already run once and cannot be restarted")]
    AlreadyTerminated,
}

/// Errors a [`TaskQueue`](crate::ports::TaskQueue) may raise.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("config decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Which step of one loop iteration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Fetching the next task failed; no task is attached.
    Dequeue,

    /// The handler failed on a task it was given.
    Handler,
}

/// A failure caught inside the worker loop.
///
/// The loop builds one of these for every failed iteration and hands it to the
/// [`ErrorHook`](crate::ports::ErrorHook). It is never retried or re-queued.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskQueueException<T> {
    message: String,
    task: Option<T>,
    #[source]
    cause: anyhow::Error,
}

impl<T> TaskQueueException<T> {
    pub(crate) const DEQUEUE_MESSAGE: &'static str = "exception in dequeue";
    pub(crate) const HANDLER_MESSAGE: &'static str = "exception in handler";

    pub fn new(message: impl Into<String>, task: Option<T>, cause: anyhow::Error) -> Self {
        Self {
            message: message.into(),
            task,
            cause,
        }
    }

    pub(crate) fn dequeue(cause: anyhow::Error) -> Self {
        Self::new(Self::DEQUEUE_MESSAGE, None, cause)
    }

    pub(crate) fn handler(task: T, cause: anyhow::Error) -> Self {
        Self::new(Self::HANDLER_MESSAGE, Some(task), cause)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The task being processed when the failure happened, if one was dequeued.
    pub fn task(&self) -> Option<&T> {
        self.task.as_ref()
    }

    pub fn into_task(self) -> Option<T> {
        self.task
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    pub fn kind(&self) -> FailureKind {
        if self.task.is_some() {
            FailureKind::Handler
        } else {
            FailureKind::Dequeue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn handler_exception_carries_task_and_cause() {
        let err = TaskQueueException::handler("b", anyhow::anyhow!("boom"));

        assert_eq!(err.to_string(), "exception in handler");
        assert_eq!(err.task(), Some(&"b"));
        assert_eq!(err.kind(), FailureKind::Handler);
        assert_eq!(err.cause().to_string(), "boom");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
        assert_eq!(err.into_task(), Some("b"));
    }

    #[test]
    fn dequeue_exception_has_no_task() {
        let err: TaskQueueException<u32> =
            TaskQueueException::dequeue(QueueError::OperationFailed("io".into()).into());

        assert_eq!(err.message(), "exception in dequeue");
        assert!(err.task().is_none());
        assert_eq!(err.kind(), FailureKind::Dequeue);
        assert!(
            err.cause()
                .downcast_ref::<QueueError>()
                .is_some_and(|e| matches!(e, QueueError::OperationFailed(_)))
        );
    }

    #[test]
    fn worker_error_messages_mention_the_fix() {
        assert!(WorkerError::QueueNotSet.to_string().contains("set_task_queue"));
        assert!(WorkerError::AlreadyTerminated.to_string().contains("restarted"));
    }
}
