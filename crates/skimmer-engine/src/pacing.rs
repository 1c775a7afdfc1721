//! Randomized settle delays between scrolls.
//!
//! A fixed cadence both hammers the page driver and looks nothing like a
//! human reading a feed, so every scroll is followed by a uniformly jittered
//! pause.

use std::time::Duration;

use rand::Rng;

/// Sleeps for a uniformly random duration in `[min_ms, max_ms]`.
pub(crate) async fn settle_delay(min_ms: u64, max_ms: u64) {
    let ms = if max_ms > min_ms {
        rand::rng().random_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    tracing::trace!(ms, "settle delay");
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
