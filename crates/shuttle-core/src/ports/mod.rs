//! Ports - ワーカーが依存する抽象化レイヤー
//!
//! Worker はこの 3 つの trait だけを知っています。
//!
//! # 主要な trait
//! - **TaskQueue**: タスクの取り出し元（dequeue / is_started）
//! - **TaskHandler**: 取り出したタスクの実処理
//! - **ErrorHook**: ループ内で捕捉した失敗の報告先

pub mod task_queue;
pub mod handler;
pub mod error_hook;

pub use self::task_queue::TaskQueue;
pub use self::handler::TaskHandler;
pub use self::error_hook::{ErrorHook, LogErrorHook};
