use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

use shuttle_core::impls::InMemoryTaskQueue;
use shuttle_core::ports::TaskHandler;
use shuttle_core::{Worker, WorkerConfig};

#[derive(Debug, Deserialize)]
struct Job {
    id: u32,
    name: String,
}

/// Greets every job; jobs named "boom" fail to show the loop carrying on.
struct HelloHandler;

#[async_trait]
impl TaskHandler<Job> for HelloHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        if job.name == "boom" {
            anyhow::bail!("job {} refused to run", job.id);
        }
        sleep(Duration::from_millis(50)).await;
        println!("Hello, {}! (job {})", job.name, job.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) 設定とキューを用意
    let config = WorkerConfig::from_env()?;
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_millis(200)));

    // (B) worker を起動（1 本）
    let worker = Worker::builder(HelloHandler).config(config).build();
    worker.set_task_queue(queue.clone()).await?;
    worker.start().await?;

    // (C) ジョブ投入（JSON から decode）
    let jobs: Vec<Job> = serde_json::from_str(
        r#"[
            {"id": 1, "name": "weft"},
            {"id": 2, "name": "boom"},
            {"id": 3, "name": "warp"}
        ]"#,
    )?;
    for job in jobs {
        queue.enqueue(job).await?;
    }

    // (D) キューが空になるまでポーリングで待つ
    while !queue.is_empty().await {
        sleep(Duration::from_millis(50)).await;
    }

    // (E) キュー側から止めて、worker の自然終了を待つ（処理中のジョブは join が待つ）
    queue.shutdown();
    worker.join().await;
    println!("worker state after join: {}", worker.state());

    // 止まっている worker への stop() は何もしない
    worker.stop().await;
    Ok(())
}
