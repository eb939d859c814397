//! InMemoryTaskQueue - 開発用の FIFO タスクキュー
//!
//! # 学習ポイント
//! - tokio の Mutex + Notify による短時間ブロッキングの dequeue
//! - AtomicBool による non-blocking な `is_started()`
//! - `shutdown()` による producer 側からのワーカー停止

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::error::QueueError;
use crate::ports::TaskQueue;

/// In-process FIFO queue.
///
/// # 実装詳細
/// - `VecDeque<T>` を Mutex で保護
/// - enqueue 時に Notify で待機中の dequeue を起こす
/// - `dequeue()` は最大 `poll_timeout` だけ待ち、何もなければ `Ok(None)`
///
/// After [`shutdown`](Self::shutdown) the queue refuses new tasks and reports
/// `is_started() == false`; tasks already queued can still be dequeued.
pub struct InMemoryTaskQueue<T> {
    tasks: Mutex<VecDeque<T>>,
    notify: Notify,
    started: AtomicBool,
    poll_timeout: Duration,
}

impl<T: Send + 'static> InMemoryTaskQueue<T> {
    pub fn new(poll_timeout: Duration) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            started: AtomicBool::new(true),
            poll_timeout,
        }
    }

    pub async fn enqueue(&self, task: T) -> Result<(), QueueError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        self.tasks.lock().await.push_back(task);
        // Notify outside the lock
        self.notify.notify_one();
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Stop accepting tasks and flip `is_started()` to false.
    pub fn shutdown(&self) {
        self.started.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl<T: Send + 'static> TaskQueue<T> for InMemoryTaskQueue<T> {
    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        // None: the timeout is too large to represent, wait for a push or shutdown only
        let deadline = Instant::now().checked_add(self.poll_timeout);
        loop {
            // Register before checking so a push or shutdown in between is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(task) = self.tasks.lock().await.pop_front() {
                return Ok(Some(task));
            }
            if !self.is_started() {
                return Ok(None);
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn dequeue_is_fifo() {
        let queue = InMemoryTaskQueue::new(Duration::from_millis(50));
        for n in 1..=3 {
            queue.enqueue(n).await.unwrap();
        }
        assert_eq!(queue.len().await, 3);

        assert_eq!(queue.dequeue().await.unwrap(), Some(1));
        assert_eq!(queue.dequeue().await.unwrap(), Some(2));
        assert_eq!(queue.dequeue().await.unwrap(), Some(3));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn dequeue_times_out_with_none() {
        let queue: InMemoryTaskQueue<u32> = InMemoryTaskQueue::new(Duration::from_millis(200));
        let start = Instant::now();
        let popped = queue.dequeue().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn enqueue_wakes_dequeue() {
        let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_secs(5)));

        let pop = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.dequeue().await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.enqueue("wake").await.unwrap();

        let popped = tokio::time::timeout(Duration::from_secs(1), pop)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(popped, Some("wake"));
    }

    #[tokio::test]
    async fn shutdown_releases_waiters_and_closes() {
        let queue: Arc<InMemoryTaskQueue<u32>> =
            Arc::new(InMemoryTaskQueue::new(Duration::from_secs(5)));

        let pop = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.dequeue().await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.shutdown();

        let popped = tokio::time::timeout(Duration::from_secs(1), pop)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(popped, None);
        assert!(!queue.is_started());
        assert_eq!(queue.enqueue(1).await, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn unbounded_poll_timeout_waits_instead_of_overflowing() {
        let queue: Arc<InMemoryTaskQueue<u32>> = Arc::new(InMemoryTaskQueue::new(Duration::MAX));

        assert!(
            tokio::time::timeout(Duration::from_millis(50), queue.dequeue())
                .await
                .is_err()
        );

        let pop = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.dequeue().await.unwrap() }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(7).await.unwrap();

        let popped = tokio::time::timeout(Duration::from_secs(1), pop)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(popped, Some(7));
    }

    #[tokio::test]
    async fn shutdown_keeps_queued_tasks_drainable() {
        let queue = InMemoryTaskQueue::new(Duration::from_millis(10));
        queue.enqueue('a').await.unwrap();
        queue.shutdown();

        assert_eq!(queue.dequeue().await.unwrap(), Some('a'));
        assert_eq!(queue.dequeue().await.unwrap(), None);
    }
}
