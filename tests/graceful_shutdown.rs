use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use stagepipe::prelude::*;

mod common;
use common::collect_into;

#[tokio::test]
async fn terminate_is_idempotent() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let steps = vec![
        builder.basic(BasicConfig::new("noop", Ok)),
        builder.terminal(collect_into(&collected)),
    ];

    let mut pipeline = builder.pipeline(PipelineConfig::new(10), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many(0..5).await;
    pipeline.wait_till_done().await;

    pipeline.terminate().await;
    pipeline.terminate().await;

    assert_eq!(collected.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn feeding_after_terminate_is_ignored() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let steps = vec![
        builder.basic(BasicConfig::new("noop", Ok)),
        builder.terminal(collect_into(&collected)),
    ];

    let mut pipeline = builder.pipeline(PipelineConfig::new(10), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many(0..5).await;
    pipeline.wait_till_done().await;
    pipeline.terminate().await;

    pipeline.feed_one(99).await;
    pipeline.feed_many(100..110).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(collected.lock().unwrap().len(), 5);
    assert_eq!(pipeline.tokens_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parent_cancellation_stops_workers_promptly() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let steps = vec![
        builder.basic(BasicConfig::new("slow", |x| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(x)
        })),
        builder.terminal(collect_into(&collected)),
    ];

    let mut pipeline = builder.pipeline(PipelineConfig::new(128), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    // far more work than can finish before the cancel lands
    pipeline.feed_many(0..50).await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    cancel.cancel();
    let start = Instant::now();
    pipeline.terminate().await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_secs(1),
        "terminate should return promptly after cancel, took {:?}",
        elapsed
    );
    assert!(
        collected.lock().unwrap().len() < 50,
        "cancellation should land before the feed is fully processed"
    );
}
