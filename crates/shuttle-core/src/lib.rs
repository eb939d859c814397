//! shuttle-core
//!
//! Single-worker lifecycle for pulling tasks off a queue.
//!
//! # モジュール構成
//! - **ports**: 抽象化レイヤー（TaskQueue, TaskHandler, ErrorHook）
//! - **worker**: Worker 本体（start / stop / join とループ）
//! - **impls**: 実装（InMemoryTaskQueue など開発用）
//! - **config**: WorkerConfig
//! - **error**: エラー型（WorkerError, QueueError, TaskQueueException）
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the binary.

pub mod config;
pub mod error;
pub mod impls;
pub mod ports;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{ConfigError, FailureKind, QueueError, TaskQueueException, WorkerError};
pub use worker::{Worker, WorkerBuilder, WorkerState};
