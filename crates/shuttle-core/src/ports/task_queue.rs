//! TaskQueue port - ワーカーに仕事を供給するキュー
//!
//! キューの保存方式・producer 側・待ち方は実装に任せます。
//! Worker が呼ぶのは `dequeue()` と `is_started()` だけです。

use async_trait::async_trait;

use crate::error::QueueError;

/// Source of tasks for a [`Worker`](crate::Worker).
///
/// # Contract
/// - `dequeue()` may wait. `Ok(None)` means "nothing right now, ask again" and is
///   not an error.
/// - `is_started()` must not block and must be callable while another call is
///   parked inside `dequeue()`. Once it returns `false` the worker loop exits at
///   its next iteration boundary.
/// - A queue shared by several workers synchronises itself; the worker adds no
///   locking around these calls.
#[async_trait]
pub trait TaskQueue<T>: Send + Sync {
    async fn dequeue(&self) -> Result<Option<T>, QueueError>;

    fn is_started(&self) -> bool;
}
