//! Drives one harvest run end to end.

use skimmer_core::RunConfig;
use skimmer_engine::driver::PageDriver;
use skimmer_engine::{EngineConfig, HarvestEngine, StopReason};
use skimmer_sink::open_sink;

/// Executes a single run against an already-open feed page and prints its
/// summary. Returns the stop reason so the caller can abandon a batch when
/// the browser itself is gone.
///
/// # Errors
///
/// Returns an error only for invalid configuration; a started run always
/// completes with an outcome.
pub(crate) async fn execute(
    page: &dyn PageDriver,
    run: &RunConfig,
) -> anyhow::Result<StopReason> {
    let query = run.to_query()?;
    tracing::info!(
        keyword = query.keyword.as_deref().unwrap_or(""),
        account = query.account.as_deref().unwrap_or(""),
        latest = query.latest,
        "starting run"
    );

    let mut sink = open_sink(&run.output);
    let outcome = HarvestEngine::new(page, sink.as_mut(), query, EngineConfig::default())
        .run()
        .await;

    match &outcome.stop {
        StopReason::SessionExpired => {
            tracing::warn!("session expired; log in again with a headed browser");
        }
        StopReason::ContentTimeout => {
            tracing::warn!("feed never rendered; the run collected nothing new");
        }
        StopReason::DriverLost(reason) => {
            tracing::error!(%reason, "browser session lost");
        }
        _ => {}
    }

    println!(
        "collected {} new records ({} total) -> {} [{}]",
        outcome.newly_collected,
        outcome.records.len(),
        run.output.display(),
        outcome.stop
    );
    Ok(outcome.stop)
}
