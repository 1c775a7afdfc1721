//! Command line interface for harvesting the x.com search feed.

mod batch;
mod runner;

use std::path::PathBuf;

use clap::Parser;
use skimmer_browser::{ChromeSession, LaunchOptions};
use skimmer_core::RunConfig;
use skimmer_engine::StopReason;

#[derive(Debug, Parser)]
#[command(name = "skimmer")]
#[command(about = "Incremental harvester for the x.com search feed")]
struct Cli {
    /// Batch configuration file (JSON). When given, the search flags below
    /// are taken from the file instead.
    config: Option<PathBuf>,

    /// Keyword or phrase to search for.
    #[arg(short, long)]
    keyword: Option<String>,

    /// Restrict the harvest to posts authored by this account.
    #[arg(short = 'a', long)]
    from_account: Option<String>,

    /// Stop after collecting this many new records.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Oldest acceptable post date (YYYY-MM-DD).
    #[arg(short, long)]
    since_date: Option<String>,

    /// Newest acceptable post date (YYYY-MM-DD).
    #[arg(short, long)]
    until_date: Option<String>,

    /// Output file; a `.csv` extension selects the tabular sink, anything
    /// else the JSON sink.
    #[arg(short, long, default_value = "records.json")]
    output: PathBuf,

    /// Harvest the live-ranked feed, stopping at the 24-hour boundary.
    #[arg(long)]
    latest: bool,

    /// Run the browser without a visible window. Requires a profile that is
    /// already logged in.
    #[arg(long)]
    headless: bool,

    /// Browser profile directory; reuse it across runs to keep the session.
    #[arg(long, env = "SKIMMER_PROFILE_DIR", default_value = ".skimmer-profile")]
    profile_dir: PathBuf,

    /// Attach to a running browser over this CDP endpoint instead of
    /// launching one.
    #[arg(long, env = "SKIMMER_CDP_URL")]
    cdp_url: Option<String>,
}

impl Cli {
    fn runs(&self) -> anyhow::Result<Vec<RunConfig>> {
        match &self.config {
            Some(path) => Ok(batch::runs_from_file(path, &self.output)?),
            None => Ok(vec![RunConfig {
                keyword: self.keyword.clone(),
                from_account: self.from_account.clone(),
                since: self.since_date.clone(),
                until: self.until_date.clone(),
                latest: self.latest,
                limit: self.limit,
                output: self.output.clone(),
            }]),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let runs = cli.runs()?;

    let session = match &cli.cdp_url {
        Some(url) => ChromeSession::connect(url).await?,
        None => {
            ChromeSession::launch(&LaunchOptions {
                profile_dir: cli.profile_dir.clone(),
                headless: cli.headless,
            })
            .await?
        }
    };
    let page = session.open_page().await?;

    let mut failed = 0usize;
    for run in &runs {
        match runner::execute(&page, run).await {
            Ok(StopReason::DriverLost(reason)) => {
                tracing::error!(%reason, "abandoning remaining runs");
                failed += 1;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                // One bad run configuration does not abort the batch.
                tracing::error!(error = %e, "run failed");
                failed += 1;
            }
        }
    }

    session.shutdown();
    if failed > 0 {
        anyhow::bail!("{failed} of {} runs failed", runs.len());
    }
    Ok(())
}
