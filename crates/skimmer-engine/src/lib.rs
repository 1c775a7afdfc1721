pub mod driver;
pub mod engine;
pub mod extract;
pub mod followers;
pub mod metrics;
mod pacing;
pub mod query;
pub mod timestamp;

pub use driver::{DriverError, ElementHandle, PageDriver};
pub use engine::{EngineConfig, HarvestEngine, HarvestOutcome, StopReason};
pub use followers::FollowerCache;
pub use query::{build_feed_url, build_search_query};
pub use timestamp::parse_feed_timestamp;
