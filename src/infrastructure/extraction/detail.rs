//! Detail-page field extraction and post-processing
//!
//! Caption, timestamp, likes, and comments are read from an open detail
//! context in that fixed order; each field is independent, so one miss never
//! blocks the others. The compact view count is the exception: the platform
//! only shows it on the listing thumbnail, so it is read from the listing
//! node before the detail context is opened.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::record::ItemRecord;
use crate::domain::stats::{is_stats_text, parse_count};
use crate::infrastructure::driver::{Driver, ElementHandle, QueryScope, RetryPolicy};
use crate::infrastructure::extraction::resolver::FieldResolver;
use crate::infrastructure::extraction::selectors::SelectorTable;

static LIKED_BY_OTHERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"and\s+(\d+(?:,\d+)*)\s+others?").expect("static likes pattern"));

static DIGIT_PLUS_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+.*likes?").expect("static likes fallback pattern"));

static VIEW_ALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"view all (\d+(?:,\d+)*)").expect("static comments pattern"));

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static digit pattern"));

/// Strip the "username:" prefix some layouts inject and the truncation
/// artifact left behind by content expansion. Rejects fragments that are
/// profile-stat chrome rather than a caption.
pub fn clean_caption(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() || is_stats_text(text) {
        return None;
    }
    let stripped = if text.contains(':') && !text.starts_with("http") {
        text.splitn(2, ':').nth(1).unwrap_or_default()
    } else {
        text
    };
    Some(stripped.replace("... more", "").trim().to_string())
}

pub struct DetailExtractor<'a, D: Driver + ?Sized> {
    driver: &'a D,
    table: &'a SelectorTable,
    policy: RetryPolicy,
}

impl<'a, D: Driver + ?Sized> DetailExtractor<'a, D> {
    pub fn new(driver: &'a D, table: &'a SelectorTable, policy: RetryPolicy) -> Self {
        Self {
            driver,
            table,
            policy,
        }
    }

    fn resolver(&self) -> FieldResolver<'a, D> {
        FieldResolver::new(self.driver, self.policy)
    }

    /// Click any "more"-style truncation controls, tolerating zero matches.
    pub async fn expand_truncated_content(&self) {
        for expression in &self.table.more_button.candidates {
            let Ok(handles) = self.driver.query(QueryScope::Document, expression).await else {
                continue;
            };
            for handle in &handles {
                let text = self.driver.text(handle).await.unwrap_or_default();
                if text.contains("more") || text.contains("...") {
                    if self.driver.click(handle).await.is_ok() {
                        debug!(%expression, "expanded truncated content");
                        self.driver.sleep(self.policy.delay).await;
                    }
                }
            }
        }
    }

    pub async fn extract_caption(&self) -> Option<String> {
        self.resolver()
            .resolve_with(QueryScope::Document, &self.table.caption, |raw| {
                clean_caption(raw)
            })
            .await
    }

    /// Machine-readable datetime attribute; the one field exempt from
    /// free-text parsing.
    pub async fn extract_timestamp(&self) -> Option<String> {
        self.resolver()
            .resolve(QueryScope::Document, &self.table.date)
            .await
    }

    /// Likes, through three patterns in priority order: a visible "N likes"
    /// text, the "liked by X and N others" phrasing (credited as N + 1, or 0
    /// when the count is hidden), and a last-resort digit-plus-"like" scan.
    pub async fn extract_likes(&self) -> u64 {
        let resolver = self.resolver().single_pass();

        if let Some(value) = resolver
            .resolve_with(QueryScope::Document, &self.table.likes, |raw| {
                let lower = raw.to_lowercase();
                if lower.contains("likes") {
                    let count = parse_count(raw);
                    if count > 0 {
                        return Some(count.to_string());
                    }
                }
                None
            })
            .await
        {
            return value.parse().unwrap_or(0);
        }

        if let Some(value) = resolver
            .resolve_with(QueryScope::Document, &self.table.liked_by, |raw| {
                let lower = raw.to_lowercase();
                if !lower.contains("liked by") {
                    return None;
                }
                match LIKED_BY_OTHERS.captures(&lower) {
                    Some(captures) => Some((parse_count(&captures[1]) + 1).to_string()),
                    // "liked by" with no trailing count: hidden, not a miss
                    None => Some(0.to_string()),
                }
            })
            .await
        {
            return value.parse().unwrap_or(0);
        }

        resolver
            .resolve_with(QueryScope::Document, &self.table.likes_fallback, |raw| {
                if DIGIT_PLUS_LIKE.is_match(raw) {
                    let count = parse_count(raw);
                    if count > 0 {
                        return Some(count.to_string());
                    }
                }
                None
            })
            .await
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    /// Comments, via the "view all N" phrasing or a bare digit run.
    pub async fn extract_comments(&self) -> u64 {
        self.resolver()
            .resolve_with(QueryScope::Document, &self.table.comments, |raw| {
                let lower = raw.to_lowercase();
                if lower.contains("view all") {
                    return VIEW_ALL
                        .captures(&lower)
                        .map(|captures| parse_count(&captures[1]).to_string());
                }
                DIGIT_RUN
                    .find(raw)
                    .map(|matched| parse_count(matched.as_str()).to_string())
            })
            .await
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    /// Fill the record's detail fields in the fixed order. Each field is
    /// independent; misses leave the zero/empty default in place.
    pub async fn fill(&self, record: &mut ItemRecord) {
        if let Some(caption) = self.extract_caption().await {
            record.caption = caption;
        }
        if let Some(timestamp) = self.extract_timestamp().await {
            record.timestamp = timestamp;
        }
        record.likes_count = self.extract_likes().await;
        record.comments_count = self.extract_comments().await;
    }
}

/// Compact view count from a listing thumbnail: the first descendant text
/// fragment containing a digit together with "view", "k", or "m". Single
/// pass; the listing node is already rendered when this runs.
pub async fn extract_grid_views<D: Driver + ?Sized>(
    driver: &D,
    item: &ElementHandle,
    table: &SelectorTable,
) -> u64 {
    for expression in &table.grid_views.candidates {
        let Ok(handles) = driver.query(QueryScope::Within(item), expression).await else {
            continue;
        };
        for handle in &handles {
            let Ok(text) = driver.text(handle).await else {
                continue;
            };
            let lower = text.trim().to_lowercase();
            if lower.is_empty() || !lower.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            if lower.contains("view") || lower.contains('k') || lower.contains('m') {
                let count = parse_count(&lower);
                if count > 0 {
                    return count;
                }
            }
        }
    }
    0
}
