//! Listing-to-detail navigation state machine
//!
//! Each item is processed through a transient detail context: open, switch
//! focus, expand truncated content, extract, close, and return focus to the
//! original listing context. The close path always runs, including on
//! extraction error, so subsequent items start from a known state. A failed
//! close/switch marks the item failed but never propagates out of the run.

use tracing::{debug, warn};

use crate::domain::identifier::absolutize;
use crate::domain::record::{Fetched, ItemRecord};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::driver::{ContextHandle, Driver, ElementHandle};
use crate::infrastructure::extraction::detail::{extract_grid_views, DetailExtractor};
use crate::infrastructure::scrape_error::{ScrapeError, ScrapeResult};

pub struct Navigator<'a, D: Driver + ?Sized> {
    driver: &'a D,
    config: &'a AppConfig,
    /// The original listing context, captured before any detail is opened.
    home: ContextHandle,
}

impl<'a, D: Driver + ?Sized> Navigator<'a, D> {
    /// Capture the current listing context as the home to return to.
    pub async fn new(driver: &'a D, config: &'a AppConfig) -> ScrapeResult<Self> {
        let contexts = driver.contexts().await?;
        let home = contexts
            .into_iter()
            .next()
            .ok_or_else(|| ScrapeError::navigation("capture listing context", "no open context"))?;
        Ok(Self {
            driver,
            config,
            home,
        })
    }

    /// Process one listing item end to end: grid view count first, then the
    /// detail context for the remaining fields. On success the record is
    /// finalized fetched=Yes; any error surfaces only after the cleanup path
    /// has restored focus to the listing.
    pub async fn process_item(
        &self,
        username: &str,
        item: &ElementHandle,
    ) -> ScrapeResult<ItemRecord> {
        // view count only exists on the listing thumbnail
        let view_count =
            extract_grid_views(self.driver, item, &self.config.selectors).await;

        let href = self
            .driver
            .attribute(item, "href")
            .await?
            .ok_or_else(|| ScrapeError::not_found("post link", 1, vec!["href".to_string()]))?;
        let url = absolutize(&href, &self.config.base_url);

        let mut record = ItemRecord::pending(username, &url);
        record.view_count = view_count;

        let outcome = match self.open_detail(&url).await {
            Ok(()) => {
                self.extract_detail(&mut record).await;
                Ok(())
            }
            Err(error) => Err(error),
        };

        let restored = self.restore_listing().await;
        outcome?;
        if !restored {
            return Err(ScrapeError::navigation(
                "close detail context",
                "focus not restored to listing",
            ));
        }

        record.fetched = Fetched::Yes;
        Ok(record)
    }

    /// LISTING -> DETAIL_OPEN: new context, focus switch, render wait,
    /// content expansion.
    async fn open_detail(&self, url: &str) -> ScrapeResult<()> {
        let context = self
            .driver
            .open_context(url)
            .await
            .map_err(|error| ScrapeError::navigation("open detail context", error))?;
        self.driver
            .switch_to(&context)
            .await
            .map_err(|error| ScrapeError::navigation("switch to detail context", error))?;
        self.driver.sleep(self.config.delays.render()).await;

        let extractor = DetailExtractor::new(
            self.driver,
            &self.config.selectors,
            self.config.retry_policy(),
        );
        extractor.expand_truncated_content().await;
        self.driver.sleep(self.config.delays.render()).await;
        debug!(%url, "detail context open");
        Ok(())
    }

    /// DETAIL_OPEN -> DETAIL_OPEN: the fixed field pass. Field misses leave
    /// defaults in place; nothing here fails the item.
    async fn extract_detail(&self, record: &mut ItemRecord) {
        let extractor = DetailExtractor::new(
            self.driver,
            &self.config.selectors,
            self.config.retry_policy(),
        );
        extractor.fill(record).await;
    }

    /// Guaranteed-cleanup path: close every transient context and force
    /// focus back to the first known context. Returns false when cleanup
    /// itself failed; callers report the item failed but keep running.
    async fn restore_listing(&self) -> bool {
        let mut clean = true;
        match self.driver.contexts().await {
            Ok(contexts) => {
                for context in contexts.iter().skip(1) {
                    if self.driver.switch_to(context).await.is_err() {
                        clean = false;
                        continue;
                    }
                    if let Err(error) = self.driver.close_context().await {
                        warn!(%error, "failed to close detail context");
                        clean = false;
                    }
                }
            }
            Err(error) => {
                warn!(%error, "could not enumerate contexts during cleanup");
                clean = false;
            }
        }
        if let Err(error) = self.driver.switch_to(&self.home).await {
            warn!(%error, "could not refocus listing context");
            clean = false;
        }
        self.driver.sleep(self.config.delays.after_close()).await;
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, MockDriver, MockElement, MockPage};

    const LISTING_URL: &str = "https://www.instagram.com/acme/reels/";
    const DETAIL_URL: &str = "https://www.instagram.com/acme/reel/XYZ123/";

    async fn listing_driver() -> MockDriver {
        let driver = MockDriver::new();
        driver.add_page(
            LISTING_URL,
            MockPage {
                elements: vec![
                    MockElement::new(&[r#"a[href*="/reel/"]"#])
                        .with_attr("href", "/acme/reel/XYZ123/"),
                    MockElement::new(&["span"]).child_of(0).with_text("1.5K views"),
                ],
            },
        );
        driver.add_page(
            DETAIL_URL,
            MockPage {
                elements: vec![
                    MockElement::new(&[r#"h1[dir="auto"]"#]).with_text("acme: hello ... more"),
                    MockElement::new(&[r#"time[datetime]"#])
                        .with_attr("datetime", "2024-01-05T08:30:00Z"),
                    MockElement::new(&["section span"]).with_text("2,345 likes"),
                    MockElement::new(&[r#"a[href*="/comments/"] span"#])
                        .with_text("View all 12 comments"),
                ],
            },
        );
        driver.navigate(LISTING_URL).await.unwrap();
        driver
    }

    #[tokio::test]
    async fn successful_item_roundtrip() {
        let driver = listing_driver().await;
        let config = test_config();
        let navigator = Navigator::new(&driver, &config).await.unwrap();
        let item = driver.query_blocking(r#"a[href*="/reel/"]"#).unwrap()[0];

        let record = navigator.process_item("acme", &item).await.unwrap();

        assert!(record.is_fetched());
        assert_eq!(record.url, DETAIL_URL);
        assert_eq!(record.caption, "hello");
        assert_eq!(record.timestamp, "2024-01-05T08:30:00Z");
        assert_eq!(record.likes_count, 2_345);
        assert_eq!(record.comments_count, 12);
        assert_eq!(record.view_count, 1_500);
        // back on the listing with no leftover contexts
        assert_eq!(driver.context_count(), 1);
        assert_eq!(driver.active_url(), LISTING_URL);
    }

    #[tokio::test]
    async fn open_failure_still_restores_listing() {
        let driver = listing_driver().await;
        driver.fail_open_context(true);
        let config = test_config();
        let navigator = Navigator::new(&driver, &config).await.unwrap();
        let item = driver.query_blocking(r#"a[href*="/reel/"]"#).unwrap()[0];

        let result = navigator.process_item("acme", &item).await;

        assert!(matches!(result, Err(ScrapeError::NavigationFault { .. })));
        assert_eq!(driver.active_url(), LISTING_URL);
        assert_eq!(driver.context_count(), 1);
    }

    #[tokio::test]
    async fn close_failure_marks_item_failed_but_restores_focus() {
        let driver = listing_driver().await;
        driver.fail_close_context(true);
        let config = test_config();
        let navigator = Navigator::new(&driver, &config).await.unwrap();
        let item = driver.query_blocking(r#"a[href*="/reel/"]"#).unwrap()[0];

        let result = navigator.process_item("acme", &item).await;

        assert!(matches!(result, Err(ScrapeError::NavigationFault { .. })));
        // focus forced back to the first known context regardless
        assert_eq!(driver.active_url(), LISTING_URL);
    }

    #[tokio::test]
    async fn focus_invariant_holds_across_mixed_outcomes() {
        let driver = listing_driver().await;
        let config = test_config();
        let navigator = Navigator::new(&driver, &config).await.unwrap();
        let item = driver.query_blocking(r#"a[href*="/reel/"]"#).unwrap()[0];

        let before = driver.active_url();
        let _ = navigator.process_item("acme", &item).await;
        driver.fail_open_context(true);
        let _ = navigator.process_item("acme", &item).await;
        driver.fail_open_context(false);
        let _ = navigator.process_item("acme", &item).await;

        assert_eq!(driver.active_url(), before);
    }
}
