//! Listing-grid scanning and target matching
//!
//! Collects the currently-visible post thumbnails (deduplicated across the
//! candidate link selectors) and locates a specific target by identifier,
//! scrolling to trigger additional loading when the target is not yet
//! visible. Not finding the target is a normal, reported outcome.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::identifier::ItemIdentifier;
use crate::infrastructure::driver::{Driver, ElementHandle, QueryScope};
use crate::infrastructure::extraction::selectors::SelectorTable;

const SCROLL_SCRIPT: &str = "window.scrollBy(0, 1000);";

pub struct ListingMatcher<'a, D: Driver + ?Sized> {
    driver: &'a D,
    table: &'a SelectorTable,
    max_scrolls: u32,
    scroll_delay: Duration,
}

impl<'a, D: Driver + ?Sized> ListingMatcher<'a, D> {
    pub fn new(
        driver: &'a D,
        table: &'a SelectorTable,
        max_scrolls: u32,
        scroll_delay: Duration,
    ) -> Self {
        Self {
            driver,
            table,
            max_scrolls,
            scroll_delay,
        }
    }

    /// All currently-visible post candidates, first-seen order, deduplicated
    /// across the listing link selectors.
    pub async fn collect_candidates(&self) -> Vec<ElementHandle> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for expression in &self.table.post_links {
            let handles = match self.driver.query(QueryScope::Document, expression).await {
                Ok(handles) => handles,
                Err(error) => {
                    debug!(%expression, %error, "listing selector failed");
                    continue;
                }
            };
            for handle in handles {
                if seen.insert(handle) {
                    candidates.push(handle);
                }
            }
        }
        candidates
    }

    /// Locate the item whose link contains `target`, scrolling after each
    /// failed pass to load more of the grid. Returns the handle and its raw
    /// href, or `None` once the scroll budget is exhausted.
    pub async fn find_item(
        &self,
        target: &ItemIdentifier,
    ) -> Option<(ElementHandle, String)> {
        for pass in 0..self.max_scrolls {
            for handle in self.collect_candidates().await {
                let Ok(Some(href)) = self.driver.attribute(&handle, "href").await else {
                    continue;
                };
                if target.matches_href(&href) {
                    debug!(%target, %href, pass, "target item located");
                    return Some((handle, href));
                }
            }
            debug!(%target, pass, "target not visible, scrolling for more items");
            if let Err(error) = self.driver.execute_script(SCROLL_SCRIPT).await {
                warn!(%error, "incremental scroll failed");
            }
            self.driver.sleep(self.scroll_delay).await;
        }
        warn!(%target, scrolls = self.max_scrolls, "target item not found in listing");
        None
    }

    /// Display-ordered post candidates with their hrefs, filtered to links
    /// recognizable as post/reel paths and deduplicated by href.
    pub async fn display_ordered_posts(&self) -> Vec<(ElementHandle, String)> {
        let mut seen = HashSet::new();
        let mut posts = Vec::new();
        for handle in self.collect_candidates().await {
            let Ok(Some(href)) = self.driver.attribute(&handle, "href").await else {
                continue;
            };
            if !(href.contains("/p/") || href.contains("/reel/")) {
                continue;
            }
            if seen.insert(href.clone()) {
                posts.push((handle, href));
            }
        }
        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockDriver, MockElement, MockPage};

    const REEL_LINK: &str = r#"a[href*="/reel/"]"#;
    const TAB_LINK: &str = r#"div[role="tabpanel"] a[href*="/reel/"]"#;

    fn matcher_driver(elements: Vec<MockElement>) -> MockDriver {
        let driver = MockDriver::new();
        driver.add_page("about:blank", MockPage { elements });
        driver
    }

    fn table() -> SelectorTable {
        SelectorTable::default()
    }

    #[tokio::test]
    async fn finds_target_on_first_pass() {
        let driver = matcher_driver(vec![
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/reel/AAA/"),
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/reel/XYZ123/?igsh=abc"),
        ]);
        let table = table();
        let matcher = ListingMatcher::new(&driver, &table, 3, Duration::ZERO);
        let target = ItemIdentifier::from_link("https://site/acme/reel/XYZ123/").unwrap();

        let (_, href) = matcher.find_item(&target).await.unwrap();
        assert_eq!(href, "/acme/reel/XYZ123/?igsh=abc");
        assert_eq!(driver.scroll_count(), 0);
    }

    #[tokio::test]
    async fn finds_target_revealed_by_scrolling() {
        let driver = matcher_driver(vec![
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/reel/AAA/"),
            MockElement::new(&[REEL_LINK])
                .with_attr("href", "/acme/reel/LATE/")
                .visible_after(2),
        ]);
        let table = table();
        let matcher = ListingMatcher::new(&driver, &table, 3, Duration::ZERO);
        let target = ItemIdentifier::from_link("/reel/LATE/").unwrap();

        assert!(matcher.find_item(&target).await.is_some());
        assert_eq!(driver.scroll_count(), 2);
    }

    #[tokio::test]
    async fn exhausts_scroll_budget_exactly() {
        let driver = matcher_driver(vec![
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/reel/AAA/"),
        ]);
        let table = table();
        let matcher = ListingMatcher::new(&driver, &table, 3, Duration::ZERO);
        let target = ItemIdentifier::from_link("/reel/NEVER/").unwrap();

        assert!(matcher.find_item(&target).await.is_none());
        assert_eq!(driver.scroll_count(), 3);
    }

    #[tokio::test]
    async fn candidates_are_deduplicated_across_selectors() {
        let driver = matcher_driver(vec![
            MockElement::new(&[REEL_LINK, TAB_LINK]).with_attr("href", "/acme/reel/AAA/"),
            MockElement::new(&[TAB_LINK]).with_attr("href", "/acme/reel/BBB/"),
        ]);
        let table = table();
        let matcher = ListingMatcher::new(&driver, &table, 3, Duration::ZERO);

        assert_eq!(matcher.collect_candidates().await.len(), 2);
    }

    #[tokio::test]
    async fn display_order_filters_non_post_links() {
        let driver = matcher_driver(vec![
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/reel/AAA/"),
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/tagged/"),
            MockElement::new(&[REEL_LINK]).with_attr("href", "/acme/p/CCC/"),
            MockElement::new(&[TAB_LINK]).with_attr("href", "/acme/reel/AAA/"),
        ]);
        let table = table();
        let matcher = ListingMatcher::new(&driver, &table, 3, Duration::ZERO);

        let posts = matcher.display_ordered_posts().await;
        let hrefs: Vec<_> = posts.iter().map(|(_, href)| href.as_str()).collect();
        assert_eq!(hrefs, vec!["/acme/reel/AAA/", "/acme/p/CCC/"]);
    }
}
