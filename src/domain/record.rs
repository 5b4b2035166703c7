//! Result records and work items
//!
//! An [`ItemRecord`] is produced for every post the run attempts, success or
//! not. Failed attempts yield a fully-populated sentinel record so that the
//! output row count always matches what the work list implies.

use serde::{Deserialize, Serialize};

/// Platform label stamped on every output record.
pub const PLATFORM: &str = "Instagram";

/// Placeholder used for text fields in sentinel failure records.
pub const MISSING_TEXT: &str = "nan";

/// Whether the post was actually located and opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fetched {
    Yes,
    No,
}

/// One unit of input: an account handle with an optional target post link.
///
/// With a `post_link`, exactly one record is produced for this item; without,
/// the top posts of the account's listing are scraped in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_link: Option<String>,
}

impl WorkItem {
    pub fn account(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            post_link: None,
        }
    }

    pub fn targeted(username: impl Into<String>, post_link: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            post_link: Some(post_link.into()),
        }
    }
}

/// Engagement metrics for a single post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub username: String,
    pub platform: String,
    pub url: String,
    pub caption: String,
    pub likes_count: u64,
    pub comments_count: u64,
    pub view_count: u64,
    pub timestamp: String,
    pub fetched: Fetched,
}

impl ItemRecord {
    /// Empty record created at the start of per-item processing; fields are
    /// filled in as each extraction succeeds and `fetched` flips to `Yes`
    /// only once the item has been located and opened.
    pub fn pending(username: &str, url: &str) -> Self {
        Self {
            username: username.to_string(),
            platform: PLATFORM.to_string(),
            url: url.to_string(),
            caption: String::new(),
            likes_count: 0,
            comments_count: 0,
            view_count: 0,
            timestamp: String::new(),
            fetched: Fetched::No,
        }
    }

    /// Sentinel emitted when an item could not be located or opened at all.
    pub fn failure(username: &str, url: &str) -> Self {
        Self {
            username: username.to_string(),
            platform: PLATFORM.to_string(),
            url: url.to_string(),
            caption: MISSING_TEXT.to_string(),
            likes_count: 0,
            comments_count: 0,
            view_count: 0,
            timestamp: MISSING_TEXT.to_string(),
            fetched: Fetched::No,
        }
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched == Fetched::Yes
    }
}

/// Ordered collection of records for one run, preserving work-list order.
pub type RunResult = Vec<ItemRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_record_is_fully_populated() {
        let record = ItemRecord::failure("acme", "https://example.com/acme/reel/X/");
        assert_eq!(record.caption, MISSING_TEXT);
        assert_eq!(record.timestamp, MISSING_TEXT);
        assert_eq!(record.likes_count, 0);
        assert_eq!(record.view_count, 0);
        assert!(!record.is_fetched());
    }

    #[test]
    fn record_serializes_with_original_field_names() {
        let record = ItemRecord::pending("acme", "https://example.com/p/1/");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("likesCount").is_some());
        assert!(json.get("commentsCount").is_some());
        assert!(json.get("viewCount").is_some());
        assert_eq!(json.get("fetched").unwrap(), "No");
    }
}
