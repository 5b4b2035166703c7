//! Browser-automation capability surface
//!
//! The engine consumes navigation, querying, and scripting as capabilities of
//! a [`Driver`] implementation supplied by the caller. Nothing in this crate
//! talks to a concrete automation backend; tests use the scripted mock in
//! `test_utils`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::scrape_error::ScrapeResult;

/// Opaque handle to a DOM element, valid within the context it was queried
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Opaque handle to a navigation context (window/tab).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextHandle(pub String);

/// Where a query is rooted: the whole active document, or the subtree under
/// a previously-resolved element.
#[derive(Debug, Clone, Copy)]
pub enum QueryScope<'a> {
    Document,
    Within(&'a ElementHandle),
}

/// A browser cookie, shaped after the automation backends' JSON exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<f64>,
    /// Some backends reject this attribute on injection; session restore
    /// clears it before calling `add_cookie`.
    #[serde(
        rename = "sameSite",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub same_site: Option<String>,
}

/// Bounded retry policy for field resolution: `max_attempts` passes over the
/// candidate list with a fixed `delay` after each failed pass (the delay lets
/// asynchronous rendering catch up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single pass, no waiting.
    pub fn single_pass() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Zero-delay variant of this policy, for test harnesses.
    pub fn without_delay(self) -> Self {
        Self::new(self.max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// The capability surface the extraction engine depends on.
///
/// One context is active at a time; `query`, `text`, `click`, and
/// `execute_script` all operate against the active context. Implementations
/// report failures through `ScrapeError::Driver` or
/// `ScrapeError::InvalidExpression`.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate the active context to a URL.
    async fn navigate(&self, url: &str) -> ScrapeResult<()>;

    /// Evaluate a query expression, returning all matching elements.
    /// An expression matching nothing is `Ok(vec![])`, not an error.
    async fn query(
        &self,
        scope: QueryScope<'_>,
        expression: &str,
    ) -> ScrapeResult<Vec<ElementHandle>>;

    /// Visible text content of an element.
    async fn text(&self, element: &ElementHandle) -> ScrapeResult<String>;

    /// Named attribute of an element, `None` when absent.
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> ScrapeResult<Option<String>>;

    async fn click(&self, element: &ElementHandle) -> ScrapeResult<()>;

    /// Run a script in the active context (used for incremental scrolling).
    async fn execute_script(&self, script: &str) -> ScrapeResult<()>;

    /// Open a new navigation context at `url` without switching focus to it.
    async fn open_context(&self, url: &str) -> ScrapeResult<ContextHandle>;

    /// All open contexts, in creation order; the first is the original one.
    async fn contexts(&self) -> ScrapeResult<Vec<ContextHandle>>;

    async fn switch_to(&self, context: &ContextHandle) -> ScrapeResult<()>;

    /// Close the active context.
    async fn close_context(&self) -> ScrapeResult<()>;

    async fn add_cookie(&self, cookie: &Cookie) -> ScrapeResult<()>;

    async fn cookies(&self) -> ScrapeResult<Vec<Cookie>>;

    async fn refresh(&self) -> ScrapeResult<()>;

    /// Fixed wait. Centralized on the driver so test implementations can
    /// record the request and return immediately.
    async fn sleep(&self, duration: Duration);
}
