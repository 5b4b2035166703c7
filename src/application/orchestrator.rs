//! Run orchestration
//!
//! Drives the whole work list: per account, load the listing, then either
//! hunt down one specific target post or take the top posts in display
//! order. Every attempted post yields exactly one record; per-item failures
//! become sentinel records and never stop the run.

use tracing::{error, info, warn};

use crate::domain::identifier::{absolutize, ItemIdentifier};
use crate::domain::record::{ItemRecord, RunResult, WorkItem};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::driver::{Driver, QueryScope};
use crate::infrastructure::extraction::listing::ListingMatcher;
use crate::infrastructure::extraction::resolver::FieldResolver;
use crate::infrastructure::navigator::Navigator;
use crate::infrastructure::scrape_error::{ScrapeError, ScrapeResult};
use crate::infrastructure::session::dismiss_save_login_popup;

pub struct Orchestrator<'a, D: Driver + ?Sized> {
    driver: &'a D,
    config: &'a AppConfig,
}

impl<'a, D: Driver + ?Sized> Orchestrator<'a, D> {
    pub fn new(driver: &'a D, config: &'a AppConfig) -> Self {
        Self { driver, config }
    }

    /// Process the whole work list in order. The returned records preserve
    /// work-list order; an account scraped for its top posts contributes one
    /// record per post taken.
    pub async fn run(&self, items: &[WorkItem]) -> ScrapeResult<RunResult> {
        dismiss_save_login_popup(self.driver, &self.config.selectors, self.config.delays.render())
            .await;

        let mut results = RunResult::new();
        for (index, item) in items.iter().enumerate() {
            info!(
                username = %item.username,
                targeted = item.post_link.is_some(),
                progress = format!("{}/{}", index + 1, items.len()),
                "processing work item"
            );
            match self.process_work_item(item).await {
                Ok(mut records) => results.append(&mut records),
                Err(error) => {
                    error!(username = %item.username, %error, "work item failed");
                    results.push(self.failure_record(item));
                }
            }
            if index + 1 < items.len() {
                self.driver.sleep(self.config.delays.between_items()).await;
            }
        }
        info!(records = results.len(), "run complete");
        Ok(results)
    }

    async fn process_work_item(&self, item: &WorkItem) -> ScrapeResult<Vec<ItemRecord>> {
        let listing_url = self.listing_url(&item.username);
        self.driver
            .navigate(&listing_url)
            .await
            .map_err(|error| ScrapeError::prerequisite(&item.username, error))?;
        self.driver.sleep(self.config.delays.page_load()).await;
        self.await_listing(&item.username).await?;

        let navigator = Navigator::new(self.driver, self.config).await?;
        let matcher = ListingMatcher::new(
            self.driver,
            &self.config.selectors,
            self.config.max_scrolls,
            self.config.delays.scroll(),
        );

        match &item.post_link {
            Some(link) => Ok(vec![
                self.scrape_target(&navigator, &matcher, &item.username, link)
                    .await,
            ]),
            None => Ok(self.scrape_top_posts(&navigator, &matcher, &item.username).await),
        }
    }

    /// The listing grid must be present before any matching starts; a grid
    /// that never renders fails the whole work item.
    async fn await_listing(&self, username: &str) -> ScrapeResult<()> {
        let spec = self.config.selectors.listing_ready_spec();
        let resolver = FieldResolver::new(self.driver, self.config.retry_policy());
        resolver
            .resolve(QueryScope::Document, &spec)
            .await
            .map(|_| ())
            .ok_or_else(|| ScrapeError::prerequisite(username, "listing grid never rendered"))
    }

    /// Targeted mode: exactly one record, sentinel when the target cannot be
    /// identified, located, or opened.
    async fn scrape_target(
        &self,
        navigator: &Navigator<'_, D>,
        matcher: &ListingMatcher<'_, D>,
        username: &str,
        link: &str,
    ) -> ItemRecord {
        let Some(target) = ItemIdentifier::from_link(link) else {
            warn!(username, link, "no post identifier in target link");
            return ItemRecord::failure(username, link);
        };
        let sentinel_url = target.canonical_url(&self.config.base_url, username);

        match matcher.find_item(&target).await {
            Some((handle, _href)) => match navigator.process_item(username, &handle).await {
                Ok(record) => record,
                Err(error) => {
                    warn!(username, %target, %error, "target item failed during extraction");
                    ItemRecord::failure(username, &sentinel_url)
                }
            },
            None => ItemRecord::failure(username, &sentinel_url),
        }
    }

    /// Top-posts mode: up to `top_posts_per_account` records in display
    /// order, fewer when the listing has fewer posts.
    async fn scrape_top_posts(
        &self,
        navigator: &Navigator<'_, D>,
        matcher: &ListingMatcher<'_, D>,
        username: &str,
    ) -> Vec<ItemRecord> {
        let posts = matcher.display_ordered_posts().await;
        let take = posts.len().min(self.config.top_posts_per_account);
        info!(username, available = posts.len(), take, "scraping top posts");

        let mut records = Vec::with_capacity(take);
        for (handle, href) in posts.into_iter().take(take) {
            match navigator.process_item(username, &handle).await {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(username, href, %error, "post failed during extraction");
                    records.push(ItemRecord::failure(
                        username,
                        &absolutize(&href, &self.config.base_url),
                    ));
                }
            }
        }
        records
    }

    /// Sentinel for a work item whose prerequisite failed: one row, targeted
    /// link preserved when present.
    fn failure_record(&self, item: &WorkItem) -> ItemRecord {
        let url = match &item.post_link {
            Some(link) => ItemIdentifier::from_link(link)
                .map(|id| id.canonical_url(&self.config.base_url, &item.username))
                .unwrap_or_else(|| link.clone()),
            None => self.listing_url(&item.username),
        };
        ItemRecord::failure(&item.username, &url)
    }

    fn listing_url(&self, username: &str) -> String {
        format!(
            "{}/{}/reels/",
            self.config.base_url.trim_end_matches('/'),
            username
        )
    }
}
