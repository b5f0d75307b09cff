//! Generic periodic poller
//!
//! Invokes the tick once immediately, then on a fixed period until
//! cancelled. Every tick is an independent attempt; retry after a fallback
//! is simply the next tick, with no backoff and no circuit breaking.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawn a polling loop for one data source
///
/// Cancellation stops the timer; a tick already in flight runs to
/// completion (its HTTP work is bounded by the request timeout).
pub fn spawn_poller<F, Fut>(
    name: &'static str,
    interval: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tick().await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Polling loop for '{}' cancelled", name);
                    break;
                }
            }
        }
    })
}
