//! Scripted in-memory driver for tests
//!
//! Pages are registered by URL with flat element lists; queries match by
//! exact expression membership. Contexts, scrolling, cookies, and the
//! operation counters model just enough browser behavior to exercise the
//! retry, scroll, and context-restore contracts deterministically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::infrastructure::config::{AppConfig, DelayConfig};
use crate::infrastructure::driver::{
    ContextHandle, Cookie, Driver, ElementHandle, QueryScope,
};
use crate::infrastructure::scrape_error::{ScrapeError, ScrapeResult};

/// Config with all waits zeroed, for deterministic tests.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.delays = DelayConfig::zero();
    config.field_retry.delay_ms = 0;
    config
}

#[derive(Debug, Clone, Default)]
pub struct MockElement {
    selectors: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    /// Element only matches queries once this many scrolls have happened in
    /// its context.
    visible_after: u32,
    /// Index of the parent element within the same page, for scoped queries.
    parent: Option<usize>,
}

impl MockElement {
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn visible_after(mut self, scrolls: u32) -> Self {
        self.visible_after = scrolls;
        self
    }

    pub fn child_of(mut self, parent_index: usize) -> Self {
        self.parent = Some(parent_index);
        self
    }

    fn matches(&self, expression: &str, scrolled: u32) -> bool {
        scrolled >= self.visible_after && self.selectors.iter().any(|s| s == expression)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub elements: Vec<MockElement>,
}

#[derive(Debug, Clone)]
struct MockContext {
    id: String,
    url: String,
    scrolled: u32,
}

#[derive(Debug, Default)]
struct MockState {
    pages: HashMap<String, MockPage>,
    contexts: Vec<MockContext>,
    active: usize,
    next_context: u64,
    cookies: Vec<Cookie>,
    query_count: usize,
    sleep_count: usize,
    scroll_count: u32,
    click_count: usize,
    fail_open: bool,
    fail_close: bool,
}

pub struct MockDriver {
    state: Mutex<MockState>,
}

// element handles pack (context index, element index)
fn encode(context: usize, element: usize) -> ElementHandle {
    ElementHandle(((context as u64) << 32) | element as u64)
}

fn decode(handle: &ElementHandle) -> (usize, usize) {
    ((handle.0 >> 32) as usize, (handle.0 & 0xffff_ffff) as usize)
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Starts with a single context at `about:blank`.
    pub fn new() -> Self {
        let state = MockState {
            contexts: vec![MockContext {
                id: "ctx-0".to_string(),
                url: "about:blank".to_string(),
                scrolled: 0,
            }],
            next_context: 1,
            ..MockState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn add_page(&self, url: &str, page: MockPage) {
        let mut state = self.lock();
        state.pages.insert(url.to_string(), page);
    }

    /// Synchronous document query against the active context, for test
    /// setup. `None` when nothing matches.
    pub fn query_blocking(&self, expression: &str) -> Option<Vec<ElementHandle>> {
        let state = self.lock();
        let handles = Self::document_query(&state, expression);
        (!handles.is_empty()).then_some(handles)
    }

    pub fn fail_open_context(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    pub fn fail_close_context(&self, fail: bool) {
        self.lock().fail_close = fail;
    }

    pub fn query_count(&self) -> usize {
        self.lock().query_count
    }

    pub fn sleep_count(&self) -> usize {
        self.lock().sleep_count
    }

    pub fn scroll_count(&self) -> u32 {
        self.lock().scroll_count
    }

    pub fn click_count(&self) -> usize {
        self.lock().click_count
    }

    pub fn context_count(&self) -> usize {
        self.lock().contexts.len()
    }

    pub fn active_url(&self) -> String {
        let state = self.lock();
        state.contexts[state.active].url.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock driver state poisoned")
    }

    fn document_query(state: &MockState, expression: &str) -> Vec<ElementHandle> {
        let context_index = state.active;
        let context = &state.contexts[context_index];
        let Some(page) = state.pages.get(&context.url) else {
            return Vec::new();
        };
        page.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.matches(expression, context.scrolled))
            .map(|(index, _)| encode(context_index, index))
            .collect()
    }

    fn resolve<'s>(
        state: &'s MockState,
        handle: &ElementHandle,
    ) -> ScrapeResult<&'s MockElement> {
        let (context_index, element_index) = decode(handle);
        let context = state
            .contexts
            .get(context_index)
            .ok_or_else(|| ScrapeError::driver("stale context in element handle"))?;
        state
            .pages
            .get(&context.url)
            .and_then(|page| page.elements.get(element_index))
            .ok_or_else(|| ScrapeError::driver("stale element handle"))
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> ScrapeResult<()> {
        let mut state = self.lock();
        let active = state.active;
        state.contexts[active].url = url.to_string();
        state.contexts[active].scrolled = 0;
        Ok(())
    }

    async fn query(
        &self,
        scope: QueryScope<'_>,
        expression: &str,
    ) -> ScrapeResult<Vec<ElementHandle>> {
        let mut state = self.lock();
        state.query_count += 1;
        match scope {
            QueryScope::Document => Ok(Self::document_query(&state, expression)),
            QueryScope::Within(parent) => {
                let (context_index, parent_index) = decode(parent);
                let Some(context) = state.contexts.get(context_index) else {
                    return Ok(Vec::new());
                };
                let Some(page) = state.pages.get(&context.url) else {
                    return Ok(Vec::new());
                };
                Ok(page
                    .elements
                    .iter()
                    .enumerate()
                    .filter(|(_, element)| {
                        element.parent == Some(parent_index)
                            && element.matches(expression, context.scrolled)
                    })
                    .map(|(index, _)| encode(context_index, index))
                    .collect())
            }
        }
    }

    async fn text(&self, element: &ElementHandle) -> ScrapeResult<String> {
        let state = self.lock();
        Ok(Self::resolve(&state, element)?.text.clone())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> ScrapeResult<Option<String>> {
        let state = self.lock();
        Ok(Self::resolve(&state, element)?.attrs.get(name).cloned())
    }

    async fn click(&self, element: &ElementHandle) -> ScrapeResult<()> {
        let mut state = self.lock();
        Self::resolve(&state, element)?;
        state.click_count += 1;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> ScrapeResult<()> {
        let mut state = self.lock();
        if script.contains("scrollBy") {
            let active = state.active;
            state.contexts[active].scrolled += 1;
            state.scroll_count += 1;
        }
        Ok(())
    }

    async fn open_context(&self, url: &str) -> ScrapeResult<ContextHandle> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(ScrapeError::driver("context open refused"));
        }
        let id = format!("ctx-{}", state.next_context);
        state.next_context += 1;
        state.contexts.push(MockContext {
            id: id.clone(),
            url: url.to_string(),
            scrolled: 0,
        });
        Ok(ContextHandle(id))
    }

    async fn contexts(&self) -> ScrapeResult<Vec<ContextHandle>> {
        let state = self.lock();
        Ok(state
            .contexts
            .iter()
            .map(|context| ContextHandle(context.id.clone()))
            .collect())
    }

    async fn switch_to(&self, context: &ContextHandle) -> ScrapeResult<()> {
        let mut state = self.lock();
        match state.contexts.iter().position(|c| c.id == context.0) {
            Some(index) => {
                state.active = index;
                Ok(())
            }
            None => Err(ScrapeError::driver("unknown context")),
        }
    }

    async fn close_context(&self) -> ScrapeResult<()> {
        let mut state = self.lock();
        if state.fail_close {
            return Err(ScrapeError::driver("context close refused"));
        }
        let active = state.active;
        state.contexts.remove(active);
        state.active = 0;
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> ScrapeResult<()> {
        self.lock().cookies.push(cookie.clone());
        Ok(())
    }

    async fn cookies(&self) -> ScrapeResult<Vec<Cookie>> {
        Ok(self.lock().cookies.clone())
    }

    async fn refresh(&self) -> ScrapeResult<()> {
        Ok(())
    }

    async fn sleep(&self, _duration: Duration) {
        self.lock().sleep_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contexts_open_without_switching_focus() {
        let driver = MockDriver::new();
        driver.open_context("https://example.com/detail").await.unwrap();

        assert_eq!(driver.context_count(), 2);
        assert_eq!(driver.active_url(), "about:blank");
    }

    #[tokio::test]
    async fn scrolling_reveals_deferred_elements() {
        let driver = MockDriver::new();
        driver.add_page(
            "about:blank",
            MockPage {
                elements: vec![MockElement::new(&["a"]).visible_after(1)],
            },
        );

        assert!(driver.query(QueryScope::Document, "a").await.unwrap().is_empty());
        driver.execute_script("window.scrollBy(0, 1000);").await.unwrap();
        assert_eq!(driver.query(QueryScope::Document, "a").await.unwrap().len(), 1);
    }
}
