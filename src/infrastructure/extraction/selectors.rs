//! Candidate selector tables
//!
//! Centralized configuration of the query expressions tried for each field.
//! Candidate lists are ordered most-specific to most-generic; the first
//! non-empty match wins and later candidates are never consulted for that
//! attempt. The defaults target the platform's mobile layout and can be
//! overridden from the JSON config file.

use serde::{Deserialize, Serialize};

/// How a matched node is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    Text,
    Attribute,
}

fn default_mode() -> ExtractionMode {
    ExtractionMode::Text
}

/// One field's resolution plan: ordered candidate expressions plus how to
/// read the matched node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub candidates: Vec<String>,
    #[serde(default = "default_mode")]
    pub mode: ExtractionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl FieldSpec {
    pub fn text(name: &str, candidates: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            candidates: candidates.iter().map(ToString::to_string).collect(),
            mode: ExtractionMode::Text,
            attribute: None,
        }
    }

    pub fn attribute(name: &str, attribute: &str, candidates: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            candidates: candidates.iter().map(ToString::to_string).collect(),
            mode: ExtractionMode::Attribute,
            attribute: Some(attribute.to_string()),
        }
    }
}

/// Full selector table for one run. Immutable after load, shared read-only
/// across all items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorTable {
    /// Listing-grid post/reel link candidates (deduplicated on collection).
    pub post_links: Vec<String>,
    pub caption: FieldSpec,
    pub date: FieldSpec,
    /// Visible "N likes" text candidates.
    pub likes: FieldSpec,
    /// "Liked by X and N others" candidates.
    pub liked_by: FieldSpec,
    /// Last-resort region scanned for a digit-plus-"like" fragment.
    pub likes_fallback: FieldSpec,
    pub comments: FieldSpec,
    /// Descendant fragments scanned on the LISTING node for the compact view
    /// count (the detail page never shows it).
    pub grid_views: FieldSpec,
    /// Truncation-expansion controls ("more" buttons) on the detail page.
    pub more_button: FieldSpec,
    /// Login-required indicators (presence means not authenticated).
    pub login_form: Vec<String>,
    /// Logged-in indicators (any match means authenticated).
    pub logged_in_indicators: Vec<String>,
    /// Candidates for the "Save your login info?" dismissal button.
    pub dismiss_popup: Vec<String>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            post_links: vec![
                r#"a[href*="/reel/"]"#.to_string(),
                r#"div[role="tablist"] a[href*="/reel/"]"#.to_string(),
                r#"div[data-media-type="Reels"] a"#.to_string(),
                r#"div[role="tabpanel"] a[href*="/reel/"]"#.to_string(),
            ],
            caption: FieldSpec::text(
                "caption",
                &[
                    r#"h1._aagv span[dir="auto"]"#,
                    r#"h1[dir="auto"]"#,
                    r#"div._a9zs span[dir="auto"]"#,
                    r#"div._a9zs h1"#,
                    r#"div[role="menuitem"] span"#,
                    r#"article div._a9zs"#,
                    r#"div.C4VMK > span"#,
                ],
            ),
            date: FieldSpec::attribute(
                "date",
                "datetime",
                &[r#"time._aaqe[datetime]"#, r#"time[datetime]"#],
            ),
            likes: FieldSpec::text(
                "likes",
                &[
                    r#"section > div:nth-child(2) > div > div > span"#,
                    r#"section > div > div > span"#,
                    r#"section span"#,
                    r#"section div > span"#,
                ],
            ),
            liked_by: FieldSpec::text("liked_by", &[r#"section span"#, r#"section div"#]),
            likes_fallback: FieldSpec::text("likes_fallback", &[r#"section span"#]),
            comments: FieldSpec::text(
                "comments",
                &[
                    r#"span._aacl._aaco._aacw._aacz._aada"#,
                    r#"section span[aria-label*="comment"]"#,
                    r#"a[href*="/comments/"] span"#,
                ],
            ),
            grid_views: FieldSpec::text("grid_views", &["span"]),
            more_button: FieldSpec::text(
                "more_button",
                &[
                    r#"div._a9zs button"#,
                    r#"button._aacl._aaco._aacu"#,
                    r#"button[role="button"]"#,
                ],
            ),
            login_form: vec![r#"form[action*="login"]"#.to_string()],
            logged_in_indicators: vec![
                r#"a[href*="/p/"]"#.to_string(),
                r#"button[aria-label*="Like"]"#.to_string(),
                r#"svg[aria-label="Home"]"#.to_string(),
                r#"a[href="/"]"#.to_string(),
            ],
            dismiss_popup: vec!["button".to_string()],
        }
    }
}

impl SelectorTable {
    /// Presence probe for the listing grid: any post link with an href.
    pub fn listing_ready_spec(&self) -> FieldSpec {
        FieldSpec {
            name: "listing".to_string(),
            candidates: self.post_links.clone(),
            mode: ExtractionMode::Attribute,
            attribute: Some("href".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_generic_fallback_last() {
        let table = SelectorTable::default();
        // the final candidate of each detail field is intentionally broad
        assert_eq!(table.caption.candidates.last().unwrap(), "div.C4VMK > span");
        assert_eq!(table.date.candidates.last().unwrap(), r#"time[datetime]"#);
        assert_eq!(
            table.more_button.candidates.last().unwrap(),
            r#"button[role="button"]"#
        );
    }

    #[test]
    fn table_roundtrips_through_json() {
        let table = SelectorTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let back: SelectorTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.post_links, table.post_links);
        assert_eq!(back.date.mode, ExtractionMode::Attribute);
        assert_eq!(back.date.attribute.as_deref(), Some("datetime"));
    }

    #[test]
    fn listing_ready_spec_reads_hrefs() {
        let spec = SelectorTable::default().listing_ready_spec();
        assert_eq!(spec.mode, ExtractionMode::Attribute);
        assert_eq!(spec.attribute.as_deref(), Some("href"));
        assert!(!spec.candidates.is_empty());
    }
}
