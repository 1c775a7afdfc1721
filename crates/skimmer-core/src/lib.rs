pub mod error;
pub mod query;
pub mod record;
pub mod run;

pub use error::ConfigError;
pub use query::{Query, QueryMode};
pub use record::{PublishedAt, Record, NOT_AVAILABLE};
pub use run::RunConfig;
