//! Count normalization for human-readable engagement text
//!
//! `parse_count` sits on the hot path of unreliable text, so it is total: it
//! never panics and maps anything unparseable to 0.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:,\d+)*(?:\.\d+)?").expect("static number pattern"));

static BARE_STAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d,.]+(?:k|m|b)?$").expect("static stat pattern"));

/// Normalize a human-readable count ("1.2K views", "2,345 likes") to an
/// integer. The first digit run found anywhere in the text is used; a `k`,
/// `m`, or `b` immediately following it scales the value. Returns 0 when no
/// digits are present.
pub fn parse_count(text: &str) -> u64 {
    let text = text.trim().to_lowercase();
    let Some(matched) = NUMBER_RUN.find(&text) else {
        return 0;
    };
    let Ok(base) = matched.as_str().replace(',', "").parse::<f64>() else {
        return 0;
    };
    let multiplier = match text[matched.end()..].trim_start().chars().next() {
        Some('k') => 1_000.0,
        Some('m') => 1_000_000.0,
        Some('b') => 1_000_000_000.0,
        _ => 1.0,
    };
    (base * multiplier).floor() as u64
}

/// Whether a short text fragment is itself a count/stat label (profile
/// chrome such as "304 followers", or a bare number-with-suffix). Used to
/// avoid misclassifying navigation chrome as post data.
pub fn is_stats_text(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }
    const STAT_KEYWORDS: [&str; 4] = ["posts", "followers", "following", "followed by"];
    if STAT_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        return true;
    }
    let squashed: String = text.split_whitespace().collect();
    BARE_STAT.is_match(&squashed)
}
