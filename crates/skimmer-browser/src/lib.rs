//! Chromium adapter for the harvest engine's page-driver traits.
//!
//! Thin by intent: every method is one CDP call (or a short poll loop), with
//! no harvest logic. Sessions run against a persistent profile directory so
//! that an interactive login survives across runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use skimmer_engine::driver::{DriverError, ElementHandle, PageDriver};
use thiserror::Error;
use tokio::task::JoinHandle;

const SELECTOR_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser configuration rejected: {0}")]
    Config(String),

    #[error("CDP session failed: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// How to obtain a browser to drive.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Profile directory holding cookies and local storage. Reusing one
    /// directory across runs keeps the authenticated session alive.
    pub profile_dir: PathBuf,
    /// Headed mode is required for the one-time interactive login; harvest
    /// runs afterwards work headless.
    pub headless: bool,
}

/// One launched (or attached) Chromium instance plus its CDP event pump.
pub struct ChromeSession {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches a local Chromium with a persistent profile.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Config`] for a rejected configuration and
    /// [`BrowserError::Cdp`] when the browser fails to start.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let mut config = BrowserConfig::builder()
            .user_data_dir(&options.profile_dir)
            .window_size(1280, 1024);
        if !options.headless {
            config = config.with_head();
        }
        let config = config.build().map_err(BrowserError::Config)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        tracing::info!(profile = %options.profile_dir.display(), "browser launched");
        Ok(ChromeSession {
            browser: Arc::new(browser),
            handler_task,
        })
    }

    /// Attaches to an already-running browser over its CDP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Cdp`] when the endpoint is unreachable.
    pub async fn connect(cdp_url: &str) -> Result<Self, BrowserError> {
        let (browser, mut handler) = Browser::connect(cdp_url).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        tracing::info!(%cdp_url, "attached to running browser");
        Ok(ChromeSession {
            browser: Arc::new(browser),
            handler_task,
        })
    }

    /// Opens the page the engine will drive.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Cdp`] when the page cannot be created.
    pub async fn open_page(&self) -> Result<ChromePage, BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromePage {
            browser: Arc::clone(&self.browser),
            page,
        })
    }

    /// Stops the event pump. The browser process itself outlives the
    /// session when attached, and exits with the launched child otherwise.
    pub fn shutdown(self) {
        self.handler_task.abort();
    }
}

/// One CDP page, usable as the engine's [`PageDriver`].
pub struct ChromePage {
    browser: Arc<Browser>,
    page: Page,
}

fn lost(e: chromiumoxide::error::CdpError) -> DriverError {
    DriverError::Lost(e.to_string())
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url.to_owned())
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.page.url().await.map_err(lost)?.unwrap_or_default())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.page.find_elements(selector).await {
                Ok(elements) if !elements.is_empty() => return Ok(()),
                // Missing elements and transient DOM errors both mean
                // "not there yet".
                Ok(_) | Err(_) => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: selector.to_owned(),
                    timeout,
                });
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromeElement { element: e }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn evaluate_script(&self, js: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| DriverError::Script {
                reason: e.to_string(),
            })?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn scroll_by_viewport(&self) -> Result<(), DriverError> {
        self.page
            .evaluate("window.scrollBy(0, window.innerHeight)")
            .await
            .map_err(|e| DriverError::Script {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn page_height(&self) -> Result<u64, DriverError> {
        let value = self.evaluate_script("document.body.scrollHeight").await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    async fn open_page(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(lost)?;
        Ok(Box::new(ChromePage {
            browser: Arc::clone(&self.browser),
            page,
        }))
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!(error = %e, "page close failed");
        }
    }
}

struct ChromeElement {
    element: Element,
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>, DriverError> {
        match self.element.find_element(selector).await {
            Ok(found) => Ok(Some(Box::new(ChromeElement { element: found }))),
            // chromiumoxide reports "no match" as an error; the extractor
            // wants an empty result either way.
            Err(_) => Ok(None),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        let found = self.element.find_elements(selector).await.unwrap_or_default();
        Ok(found
            .into_iter()
            .map(|e| Box::new(ChromeElement { element: e }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self
            .element
            .inner_text()
            .await
            .ok()
            .flatten()
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.element.attribute(name).await.ok().flatten())
    }
}
