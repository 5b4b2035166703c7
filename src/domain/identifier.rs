//! Post identifiers extracted from reel/post URLs
//!
//! The short opaque token in a `/reel/<ID>/` or `/p/<ID>/` path segment is
//! what ties a target link from the work list to a thumbnail in the listing
//! grid. Matching is substring containment against candidate hrefs, which is
//! intentionally permissive so query-parameter variation does not break it.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Path patterns tried in order; the first capture wins. Both content-type
/// paths the platform uses are recognized.
static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/reel/([^/?#]+)",
        r"reel/([^/?#]+)",
        r"/p/([^/?#]+)",
        r"p/([^/?#]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static identifier pattern"))
    .collect()
});

/// Opaque post/reel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemIdentifier(String);

impl ItemIdentifier {
    /// Extract the identifier from a post or reel link, if one is present.
    pub fn from_link(link: &str) -> Option<Self> {
        ID_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(link))
            .map(|captures| Self(captures[1].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring containment check against a candidate href.
    pub fn matches_href(&self, href: &str) -> bool {
        href.contains(&self.0)
    }

    /// Best-effort canonical URL for this identifier, used when the item was
    /// never located and no real href is available.
    pub fn canonical_url(&self, base_url: &str, username: &str) -> String {
        format!(
            "{}/{}/reel/{}/",
            base_url.trim_end_matches('/'),
            username,
            self.0
        )
    }
}

impl std::fmt::Display for ItemIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve a possibly-relative href against the platform base URL.
pub fn absolutize(href: &str, base_url: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.instagram.com/acme/reel/XYZ123/", "XYZ123")]
    #[case("https://www.instagram.com/reel/AbC-_9/?igsh=tok", "AbC-_9")]
    #[case("https://www.instagram.com/p/Cq8xyz/", "Cq8xyz")]
    #[case("/reel/SHORT/", "SHORT")]
    #[case("reel/NOSLASH", "NOSLASH")]
    fn extracts_identifier_from_link(#[case] link: &str, #[case] expected: &str) {
        let id = ItemIdentifier::from_link(link).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn no_identifier_in_profile_link() {
        assert!(ItemIdentifier::from_link("https://www.instagram.com/acme/").is_none());
    }

    #[test]
    fn matches_href_survives_query_parameters() {
        let id = ItemIdentifier::from_link("https://site/acme/reel/XYZ123/").unwrap();
        assert!(id.matches_href("/acme/reel/XYZ123/?igsh=abc"));
        assert!(!id.matches_href("/acme/reel/OTHER/"));
    }

    #[test]
    fn absolutize_joins_relative_hrefs() {
        assert_eq!(
            absolutize("/reel/X/", "https://www.instagram.com"),
            "https://www.instagram.com/reel/X/"
        );
        assert_eq!(
            absolutize("https://other.example/p/Y/", "https://www.instagram.com"),
            "https://other.example/p/Y/"
        );
    }

    #[test]
    fn canonical_url_shape() {
        let id = ItemIdentifier::from_link("/reel/XYZ123/").unwrap();
        assert_eq!(
            id.canonical_url("https://www.instagram.com", "acme"),
            "https://www.instagram.com/acme/reel/XYZ123/"
        );
    }
}
