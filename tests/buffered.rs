use std::sync::{Arc, Mutex};
use std::time::Duration;

use stagepipe::prelude::*;

mod common;
use common::{collect_into, wait_for};

#[tokio::test]
async fn threshold_sum_emits_and_flushes() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let window = builder
        .buffered(
            BufferedConfig::new("threshold-sum", 10).input_triggered_process(|window: &[i64]| {
                if window.len() >= 10 {
                    BufferedOutput {
                        emit: Some(window.iter().sum()),
                        flush: true,
                    }
                } else {
                    BufferedOutput::default()
                }
            }),
        )
        .expect("buffered config");
    let steps = vec![
        builder.filter(FilterConfig::new("even", |x| x % 2 == 0)),
        window,
        builder.terminal(collect_into(&collected)),
    ];

    let mut pipeline = builder.pipeline(PipelineConfig::new(16), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many(1..=20).await;
    pipeline.wait_till_done().await;

    // 2 + 4 + ... + 20
    assert_eq!(&*collected.lock().unwrap(), &[110]);
    assert_eq!(pipeline.tokens_count(), 0);

    pipeline.terminate().await;
}

#[tokio::test]
async fn pass_less_window_retains_tokens() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let window = builder
        .buffered(
            BufferedConfig::new("moving-mean", 5).input_triggered_process(|window: &[i64]| {
                BufferedOutput {
                    emit: Some(window.iter().sum::<i64>() / window.len() as i64),
                    flush: false,
                }
            }),
        )
        .expect("buffered config");
    let steps = vec![
        builder.filter(FilterConfig::new("even", |x| x % 2 == 0)),
        window,
        builder.terminal(collect_into(&collected)),
    ];

    let mut pipeline = builder.pipeline(PipelineConfig::new(16), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many([2, 4, 6, 8, 10]).await;

    let emitted = {
        let collected = Arc::clone(&collected);
        wait_for(
            move || collected.lock().unwrap().len() == 5,
            Duration::from_secs(2),
        )
        .await
    };
    assert!(emitted, "every admission should trigger one emission");
    assert_eq!(&*collected.lock().unwrap(), &[2, 3, 4, 5, 6]);

    // the window never flushes, so the pipeline intentionally never drains
    assert_eq!(pipeline.tokens_count(), 5);

    pipeline.terminate().await;
}

#[tokio::test]
async fn pass_through_overwrite_transfers_accounting() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let window = builder
        .buffered(
            BufferedConfig::new("tail-window", 3)
                .pass_through(true)
                .input_triggered_process(|_window: &[i64]| BufferedOutput::default()),
        )
        .expect("buffered config");
    let steps = vec![window, builder.terminal(collect_into(&collected))];

    let mut pipeline = builder.pipeline(PipelineConfig::new(16), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many(0..5).await;

    let forwarded = {
        let collected = Arc::clone(&collected);
        wait_for(
            move || collected.lock().unwrap().len() == 5,
            Duration::from_secs(2),
        )
        .await
    };
    assert!(forwarded, "pass-through should forward every admission");
    assert_eq!(&*collected.lock().unwrap(), &[0, 1, 2, 3, 4]);

    // only the retained window entries are still alive: increments stop at
    // the window capacity once overwrites begin
    assert_eq!(pipeline.tokens_count(), 3);

    pipeline.terminate().await;
}

#[tokio::test]
async fn time_triggered_process_flushes_the_window() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let window = builder
        .buffered(BufferedConfig::new("periodic-sum", 10).time_triggered_process(
            |window: &[i64]| {
                if window.is_empty() {
                    BufferedOutput::default()
                } else {
                    BufferedOutput {
                        emit: Some(window.iter().sum()),
                        flush: true,
                    }
                }
            },
            Duration::from_millis(50),
        ))
        .expect("buffered config");
    let steps = vec![window, builder.terminal(collect_into(&collected))];

    let mut pipeline = builder.pipeline(PipelineConfig::new(16), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many([1, 2, 3]).await;
    pipeline.wait_till_done().await;

    // ticks may split the feed across windows, the total is what matters
    let total: i64 = collected.lock().unwrap().iter().sum();
    assert_eq!(total, 6);
    assert_eq!(pipeline.tokens_count(), 0);

    pipeline.terminate().await;
}

#[tokio::test]
async fn window_replicas_share_one_buffer() {
    let collected = Arc::new(Mutex::new(Vec::<i64>::new()));

    let builder: Builder<i64> = Builder::new();
    let window = builder
        .buffered(
            BufferedConfig::new("shared-window", 5)
                .replicas(2)
                .input_triggered_process(|window: &[i64]| {
                    if window.len() >= 5 {
                        BufferedOutput {
                            emit: Some(window.iter().sum()),
                            flush: true,
                        }
                    } else {
                        BufferedOutput::default()
                    }
                }),
        )
        .expect("buffered config");
    let steps = vec![window, builder.terminal(collect_into(&collected))];

    let mut pipeline = builder.pipeline(PipelineConfig::new(16), steps);
    pipeline.init().expect("init");
    let cancel = CancelToken::default();
    pipeline.run(&cancel);

    pipeline.feed_many(1..=5).await;
    pipeline.wait_till_done().await;

    assert_eq!(&*collected.lock().unwrap(), &[15]);
    assert_eq!(pipeline.tokens_count(), 0);

    pipeline.terminate().await;
}
