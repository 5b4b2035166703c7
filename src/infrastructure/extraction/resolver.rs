//! Bounded-retry field resolution
//!
//! Candidates are tried strictly in order within each attempt; the first one
//! producing a non-empty (post-processed) value wins and no further
//! candidates or attempts are consulted. Between attempts the resolver waits
//! a fixed delay so asynchronous rendering can catch up. Exhaustion yields
//! `None`, never an error: callers map it to a zero/empty default.

use tracing::{debug, warn};

use crate::infrastructure::driver::{Driver, QueryScope, RetryPolicy};
use crate::infrastructure::extraction::selectors::{ExtractionMode, FieldSpec};

pub struct FieldResolver<'a, D: Driver + ?Sized> {
    driver: &'a D,
    policy: RetryPolicy,
}

impl<'a, D: Driver + ?Sized> FieldResolver<'a, D> {
    pub fn new(driver: &'a D, policy: RetryPolicy) -> Self {
        Self { driver, policy }
    }

    /// Same resolver with a single-pass policy, for fields whose absence is
    /// meaningful immediately (e.g. hidden like counts).
    pub fn single_pass(&self) -> Self {
        Self::new(self.driver, RetryPolicy::single_pass())
    }

    /// Resolve a field to its first non-empty trimmed value.
    pub async fn resolve(&self, scope: QueryScope<'_>, spec: &FieldSpec) -> Option<String> {
        self.resolve_with(scope, spec, |raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .await
    }

    /// Resolve a field through a post-processing transform. The transform
    /// decides whether a raw value counts as a match (`Some`) and what it
    /// normalizes to; first success wins.
    pub async fn resolve_with<F>(
        &self,
        scope: QueryScope<'_>,
        spec: &FieldSpec,
        transform: F,
    ) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        for attempt in 1..=self.policy.max_attempts {
            for expression in &spec.candidates {
                let handles = match self.driver.query(scope, expression).await {
                    Ok(handles) => handles,
                    Err(error) => {
                        debug!(field = %spec.name, %expression, %error, "candidate query failed");
                        continue;
                    }
                };
                for handle in &handles {
                    let raw = match spec.mode {
                        ExtractionMode::Text => self.driver.text(handle).await.ok(),
                        ExtractionMode::Attribute => {
                            let name = spec.attribute.as_deref().unwrap_or_default();
                            self.driver.attribute(handle, name).await.ok().flatten()
                        }
                    };
                    let Some(raw) = raw else { continue };
                    if let Some(value) = transform(&raw) {
                        if !value.is_empty() {
                            debug!(field = %spec.name, %expression, attempt, "field resolved");
                            return Some(value);
                        }
                    }
                }
            }
            debug!(field = %spec.name, attempt, "no candidate matched, waiting for render");
            self.driver.sleep(self.policy.delay).await;
        }
        warn!(
            field = %spec.name,
            attempts = self.policy.max_attempts,
            "field unresolved after all attempts"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::extraction::selectors::FieldSpec;
    use crate::test_utils::{MockDriver, MockElement, MockPage};

    fn driver_with(elements: Vec<MockElement>) -> MockDriver {
        let driver = MockDriver::new();
        driver.add_page("about:blank", MockPage { elements });
        driver
    }

    #[tokio::test]
    async fn first_candidate_wins_over_later_ones() {
        let driver = driver_with(vec![
            MockElement::new(&["h1.primary"]).with_text("from primary"),
            MockElement::new(&["span.fallback"]).with_text("from fallback"),
        ]);
        let spec = FieldSpec::text("caption", &["h1.primary", "span.fallback"]);
        let resolver = FieldResolver::new(&driver, RetryPolicy::single_pass());

        let value = resolver.resolve(QueryScope::Document, &spec).await;
        assert_eq!(value.as_deref(), Some("from primary"));
    }

    #[tokio::test]
    async fn falls_back_when_primary_is_empty() {
        let driver = driver_with(vec![
            MockElement::new(&["h1.primary"]).with_text("   "),
            MockElement::new(&["span.fallback"]).with_text("from fallback"),
        ]);
        let spec = FieldSpec::text("caption", &["h1.primary", "span.fallback"]);
        let resolver = FieldResolver::new(&driver, RetryPolicy::single_pass());

        let value = resolver.resolve(QueryScope::Document, &spec).await;
        assert_eq!(value.as_deref(), Some("from fallback"));
    }

    #[tokio::test]
    async fn attribute_mode_reads_the_named_attribute() {
        let driver = driver_with(vec![
            MockElement::new(&["time[datetime]"]).with_attr("datetime", "2024-05-01T10:00:00Z"),
        ]);
        let spec = FieldSpec::attribute("date", "datetime", &["time[datetime]"]);
        let resolver = FieldResolver::new(&driver, RetryPolicy::single_pass());

        let value = resolver.resolve(QueryScope::Document, &spec).await;
        assert_eq!(value.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn exhaustion_returns_none_after_exactly_max_attempts() {
        let driver = driver_with(vec![]);
        let spec = FieldSpec::text("likes", &["section span", "section div > span"]);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let resolver = FieldResolver::new(&driver, policy);

        let value = resolver.resolve(QueryScope::Document, &spec).await;
        assert_eq!(value, None);
        // two candidates per attempt, three attempts
        assert_eq!(driver.query_count(), 6);
        // one render wait after each failed attempt
        assert_eq!(driver.sleep_count(), 3);
    }

    #[tokio::test]
    async fn transform_rejections_keep_scanning() {
        let driver = driver_with(vec![
            MockElement::new(&["section span"]).with_text("Share"),
            MockElement::new(&["section span"]).with_text("1,234 likes"),
        ]);
        let spec = FieldSpec::text("likes", &["section span"]);
        let resolver = FieldResolver::new(&driver, RetryPolicy::single_pass());

        let value = resolver
            .resolve_with(QueryScope::Document, &spec, |raw| {
                raw.to_lowercase()
                    .contains("likes")
                    .then(|| crate::domain::stats::parse_count(raw).to_string())
            })
            .await;
        assert_eq!(value.as_deref(), Some("1234"));
    }
}
