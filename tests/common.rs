#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stagepipe::pipeline::config::TerminalConfig;

/// Terminal config that appends every consumed token to `out`.
pub fn collect_into<E: Send + 'static>(out: &Arc<Mutex<Vec<E>>>) -> TerminalConfig<E> {
    let out = Arc::clone(out);
    TerminalConfig::new("collect", move |item| {
        out.lock().expect("collector mutex poisoned").push(item);
    })
}

/// Polls `predicate` until it holds or `timeout` elapses. Returns the final
/// verdict so callers can assert on it.
pub async fn wait_for(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
