//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskQueue**: プロセス内 FIFO キュー
//!
//! 本番用のキュー（Redis, PostgreSQL など）は別クレートに置く想定です。

pub mod inmem_queue;

pub use self::inmem_queue::InMemoryTaskQueue;
