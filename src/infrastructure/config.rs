//! Run configuration
//!
//! Loaded once from a JSON file and shared read-only for the whole run.
//! Every knob has a default matching the production scrape cadence, so a
//! missing or partial file still yields a usable configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::driver::RetryPolicy;
use super::extraction::selectors::SelectorTable;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Platform origin; per-account listing URLs are derived from it.
    pub base_url: String,
    /// How many display-ordered posts to take when no specific target link
    /// is given.
    pub top_posts_per_account: usize,
    /// Scroll budget while searching the listing for a target item.
    pub max_scrolls: u32,
    pub field_retry: RetryConfig,
    pub delays: DelayConfig,
    pub selectors: SelectorTable,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1_000,
        }
    }
}

/// Fixed waits between navigation and rendering steps. All in milliseconds
/// in the file; exposed as `Duration` accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub page_load_ms: u64,
    pub render_ms: u64,
    pub scroll_ms: u64,
    pub after_close_ms: u64,
    pub between_items_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            page_load_ms: 5_000,
            render_ms: 3_000,
            scroll_ms: 2_000,
            after_close_ms: 1_000,
            between_items_ms: 5_000,
        }
    }
}

impl DelayConfig {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn render(&self) -> Duration {
        Duration::from_millis(self.render_ms)
    }

    pub fn scroll(&self) -> Duration {
        Duration::from_millis(self.scroll_ms)
    }

    pub fn after_close(&self) -> Duration {
        Duration::from_millis(self.after_close_ms)
    }

    pub fn between_items(&self) -> Duration {
        Duration::from_millis(self.between_items_ms)
    }

    /// All-zero delays, for deterministic tests.
    pub fn zero() -> Self {
        Self {
            page_load_ms: 0,
            render_ms: 0,
            scroll_ms: 0,
            after_close_ms: 0,
            between_items_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, overridable through `RUST_LOG`.
    pub level: String,
    /// Directory for daily-rolled log files; `None` logs to console only.
    pub file_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            top_posts_per_account: 3,
            max_scrolls: 3,
            field_retry: RetryConfig::default(),
            delays: DelayConfig::default(),
            selectors: SelectorTable::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.field_retry.max_attempts,
            Duration::from_millis(self.field_retry.delay_ms),
        )
    }
}
