//! The page-driver capability surface consumed by the engine.
//!
//! The engine never assumes anything about the rendering layer beyond these
//! two traits. Every lookup has optional/empty return semantics so that the
//! extractor's multi-fallback logic reads as an ordered list of strategies,
//! each returning nothing rather than failing. The production implementation
//! lives in `skimmer-browser`; tests script an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {reason}")]
    Script { reason: String },

    #[error("browser session lost: {0}")]
    Lost(String),
}

/// One rendered page. The engine drives exactly one feed page per run, plus
/// short-lived profile pages opened through [`PageDriver::open_page`] for
/// follower lookups.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Blocks until at least one element matches `selector`, or times out.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// All elements currently matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError>;

    /// Evaluates a JS expression in page context and returns its JSON value.
    async fn evaluate_script(&self, js: &str) -> Result<serde_json::Value, DriverError>;

    /// Scrolls the viewport down by one viewport height.
    async fn scroll_by_viewport(&self) -> Result<(), DriverError>;

    /// Current document scroll height; stagnation signals exhausted content.
    async fn page_height(&self) -> Result<u64, DriverError>;

    /// Opens a fresh page in the same browser context (shared session).
    async fn open_page(&self) -> Result<Box<dyn PageDriver>, DriverError>;

    /// Closes this page. Errors are not actionable and are swallowed by
    /// implementations; the engine calls this on sub-pages only.
    async fn close(&self);
}

/// One element inside a page, able to resolve sub-elements, text, and
/// attributes. Missing sub-elements and attributes are `None`, never errors.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>, DriverError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError>;

    /// Visible inner text, empty string when the element renders no text.
    async fn text(&self) -> Result<String, DriverError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;
}
