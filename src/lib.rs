//! Reel Metrics - Engagement metrics extraction for short-form video posts
//!
//! This crate provides a resilient field-extraction and navigation engine for
//! collecting per-post engagement metrics (caption, like/comment/view counts,
//! timestamp) from an account's listing page, driven by an external work list.
//! The platform's markup is unstable, so every field is located through an
//! ordered list of candidate query expressions with bounded retries.
//!
//! Browser automation itself is a collaborator: the engine only depends on the
//! [`Driver`] capability trait and never on a concrete automation backend.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports for easier access
pub use application::orchestrator::Orchestrator;
pub use domain::record::{Fetched, ItemRecord, RunResult, WorkItem};
pub use infrastructure::config::AppConfig;
pub use infrastructure::driver::{Driver, RetryPolicy};
pub use infrastructure::scrape_error::{ScrapeError, ScrapeResult};
