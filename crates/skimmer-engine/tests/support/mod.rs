//! Scripted in-memory driver for engine tests.
//!
//! `FakeDriver` answers feed queries from a script of windows: each scroll
//! advances to the next window of elements and the next page height, so a
//! test describes exactly what the engine "sees" scroll by scroll.

// Each test binary uses a different slice of this module.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use skimmer_engine::driver::{DriverError, ElementHandle, PageDriver};
use skimmer_engine::extract;

/// Leaf element: fixed text plus attributes, no children.
#[derive(Debug, Clone, Default)]
pub struct Node {
    text: String,
    attrs: Vec<(String, String)>,
}

impl Node {
    fn text(text: &str) -> Self {
        Node {
            text: text.to_owned(),
            attrs: Vec::new(),
        }
    }

    fn attr(name: &str, value: &str) -> Self {
        Node {
            text: String::new(),
            attrs: vec![(name.to_owned(), value.to_owned())],
        }
    }

    fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_owned();
        self
    }
}

#[async_trait]
impl ElementHandle for Node {
    async fn query(&self, _selector: &str) -> Result<Option<Box<dyn ElementHandle>>, DriverError> {
        Ok(None)
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        Ok(Vec::new())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }
}

/// One feed element, assembled field by field. Selector lookups answer with
/// the same structure the extractor expects from the live page.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    status_href: Option<String>,
    author_hrefs: Vec<String>,
    body: Option<String>,
    name_block: Option<String>,
    image_srcs: Vec<String>,
    datetime_attr: Option<String>,
    time_text: Option<String>,
    aria_labels: Vec<String>,
    reply_text: Option<String>,
    repost_text: Option<String>,
    like_text: Option<String>,
    free_texts: Vec<String>,
}

impl FakeElement {
    /// A well-formed post by `handle` carrying `id`, with a body and an
    /// RFC 3339 timestamp.
    pub fn post(handle: &str, id: &str, datetime: &str) -> Self {
        FakeElement {
            status_href: Some(format!("/{handle}/status/{id}")),
            author_hrefs: vec![format!("/{handle}")],
            body: Some(format!("body of {id}")),
            name_block: Some(format!("Someone\n@{handle}")),
            datetime_attr: Some(datetime.to_owned()),
            ..FakeElement::default()
        }
    }

    /// A slot with no status anchor, as rendered for ads and spacers.
    pub fn promoted() -> Self {
        FakeElement {
            free_texts: vec!["Promoted".to_owned()],
            ..FakeElement::default()
        }
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_owned());
        self
    }

    pub fn no_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn name_block(mut self, text: &str) -> Self {
        self.name_block = Some(text.to_owned());
        self
    }

    pub fn time_text(mut self, text: &str) -> Self {
        self.datetime_attr = None;
        self.time_text = Some(text.to_owned());
        self
    }

    pub fn aria_label(mut self, label: &str) -> Self {
        self.aria_labels.push(label.to_owned());
        self
    }

    pub fn reply_text(mut self, text: &str) -> Self {
        self.reply_text = Some(text.to_owned());
        self
    }

    pub fn repost_text(mut self, text: &str) -> Self {
        self.repost_text = Some(text.to_owned());
        self
    }

    pub fn like_text(mut self, text: &str) -> Self {
        self.like_text = Some(text.to_owned());
        self
    }

    pub fn free_text(mut self, text: &str) -> Self {
        self.free_texts.push(text.to_owned());
        self
    }

    pub fn image(mut self, src: &str) -> Self {
        self.image_srcs.push(src.to_owned());
        self
    }

    fn time_node(&self) -> Option<Node> {
        match (&self.datetime_attr, &self.time_text) {
            (Some(attr), _) => Some(
                Node::attr("datetime", attr).with_text(self.time_text.as_deref().unwrap_or("")),
            ),
            (None, Some(text)) => Some(Node::text(text)),
            (None, None) => None,
        }
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>, DriverError> {
        let node = match selector {
            extract::STATUS_ANCHOR => self
                .status_href
                .as_deref()
                .map(|href| Node::attr("href", href)),
            extract::TWEET_TEXT => self.body.as_deref().map(Node::text),
            extract::NAME_BLOCK => self.name_block.as_deref().map(Node::text),
            extract::TIME_NODE => self.time_node(),
            extract::REPLY_CONTROL => self.reply_text.as_deref().map(Node::text),
            extract::REPOST_CONTROL => self.repost_text.as_deref().map(Node::text),
            extract::LIKE_CONTROL => self.like_text.as_deref().map(Node::text),
            _ => None,
        };
        Ok(node.map(|n| Box::new(n) as Box<dyn ElementHandle>))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        let nodes: Vec<Node> = match selector {
            extract::AUTHOR_LINK => self
                .author_hrefs
                .iter()
                .map(|href| Node::attr("href", href))
                .collect(),
            extract::MEDIA_IMAGE => self
                .image_srcs
                .iter()
                .map(|src| Node::attr("src", src))
                .collect(),
            extract::LABELED => self
                .aria_labels
                .iter()
                .map(|label| Node::attr("aria-label", label))
                .collect(),
            extract::FREE_TEXT => self.free_texts.iter().map(|t| Node::text(t)).collect(),
            _ => Vec::new(),
        };
        Ok(nodes
            .into_iter()
            .map(|n| Box::new(n) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.body.clone().unwrap_or_default())
    }

    async fn attribute(&self, _name: &str) -> Result<Option<String>, DriverError> {
        Ok(None)
    }
}

/// Scripted feed page. Each `scroll_by_viewport` advances the window index;
/// the last window and height repeat once the script runs out.
pub struct FakeDriver {
    windows: Vec<Vec<FakeElement>>,
    heights: Vec<u64>,
    url: Mutex<String>,
    step: AtomicUsize,
    body_text: String,
    redirect_to: Option<String>,
}

impl FakeDriver {
    pub fn new(windows: Vec<Vec<FakeElement>>, heights: Vec<u64>) -> Self {
        FakeDriver {
            windows,
            heights,
            url: Mutex::new(String::new()),
            step: AtomicUsize::new(0),
            body_text: "Search results".to_owned(),
            redirect_to: None,
        }
    }

    pub fn with_body_text(mut self, text: &str) -> Self {
        self.body_text = text.to_owned();
        self
    }

    /// Every navigation lands on `url` instead of the requested one.
    pub fn with_redirect(mut self, url: &str) -> Self {
        self.redirect_to = Some(url.to_owned());
        self
    }

    fn window(&self) -> &[FakeElement] {
        let step = self.step.load(Ordering::SeqCst);
        let idx = step.min(self.windows.len().saturating_sub(1));
        self.windows.get(idx).map_or(&[], Vec::as_slice)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let landed = self.redirect_to.as_deref().unwrap_or(url);
        *self.url.lock().unwrap() = landed.to_owned();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if self.window().is_empty() {
            return Err(DriverError::Timeout {
                what: selector.to_owned(),
                timeout,
            });
        }
        Ok(())
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        Ok(self
            .window()
            .iter()
            .cloned()
            .map(|e| Box::new(e) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn evaluate_script(&self, _js: &str) -> Result<serde_json::Value, DriverError> {
        Ok(serde_json::Value::String(self.body_text.clone()))
    }

    async fn scroll_by_viewport(&self) -> Result<(), DriverError> {
        self.step.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn page_height(&self) -> Result<u64, DriverError> {
        let step = self.step.load(Ordering::SeqCst);
        let idx = step.min(self.heights.len().saturating_sub(1));
        Ok(self.heights.get(idx).copied().unwrap_or(0))
    }

    async fn open_page(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        Ok(Box::new(StubPage))
    }

    async fn close(&self) {}
}

/// Empty sub-page: follower lookups against it find nothing, so the cache
/// falls back to `"N/A"`.
pub struct StubPage;

#[async_trait]
impl PageDriver for StubPage {
    async fn navigate(&self, _url: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(String::new())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        Err(DriverError::Timeout {
            what: selector.to_owned(),
            timeout,
        })
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, DriverError> {
        Ok(Vec::new())
    }

    async fn evaluate_script(&self, _js: &str) -> Result<serde_json::Value, DriverError> {
        Ok(serde_json::Value::Null)
    }

    async fn scroll_by_viewport(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn page_height(&self) -> Result<u64, DriverError> {
        Ok(0)
    }

    async fn open_page(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        Ok(Box::new(StubPage))
    }

    async fn close(&self) {}
}
