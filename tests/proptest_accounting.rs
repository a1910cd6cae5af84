use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use stagepipe::prelude::*;

/// Drives an arbitrary feed through filter → basic → terminal and returns the
/// collected output plus the final in-flight count.
fn run_filter_chain(items: Vec<i64>, threshold: i64) -> (Vec<i64>, u64) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(async move {
        let collected = Arc::new(Mutex::new(Vec::<i64>::new()));
        let out = Arc::clone(&collected);

        let builder: Builder<i64> = Builder::new();
        let steps = vec![
            builder.filter(FilterConfig::new("at-least", move |x| *x >= threshold)),
            builder.basic(BasicConfig::new("plus-one", |x| Ok(x + 1))),
            builder.terminal(TerminalConfig::new("collect", move |item| {
                out.lock().unwrap().push(item);
            })),
        ];

        let mut pipeline = builder.pipeline(PipelineConfig::new(8), steps);
        pipeline.init().expect("init");
        let cancel = CancelToken::default();
        pipeline.run(&cancel);

        pipeline.feed_many(items).await;
        pipeline.wait_till_done().await;
        let tokens = pipeline.tokens_count();
        pipeline.terminate().await;

        let collected = collected.lock().unwrap().clone();
        (collected, tokens)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn filter_chain_accounts_for_every_token(
        items in proptest::collection::vec(-1000i64..1000, 0..200),
        threshold in -1000i64..1000,
    ) {
        let expected: Vec<i64> = items
            .iter()
            .copied()
            .filter(|x| *x >= threshold)
            .map(|x| x + 1)
            .collect();

        let (collected, tokens) = run_filter_chain(items, threshold);

        // single replicas everywhere, so FIFO order holds end to end
        prop_assert_eq!(collected, expected);
        prop_assert_eq!(tokens, 0);
    }
}
