//! Authenticated-session restore
//!
//! Sessions are restored by injecting cookies exported from a previous
//! interactive login, then refreshing. Per-cookie injection failures are
//! tolerated; login state is verified afterwards from page structure. The
//! "Save your login info?" interstitial is dismissed when it appears.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::driver::{Cookie, Driver, QueryScope};
use super::extraction::selectors::SelectorTable;
use super::scrape_error::{ScrapeError, ScrapeResult};

pub async fn load_cookies(path: impl AsRef<Path>) -> ScrapeResult<Vec<Cookie>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| ScrapeError::session(format!("{}: {error}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|error| ScrapeError::session(format!("{}: {error}", path.display())))
}

pub async fn save_cookies(path: impl AsRef<Path>, cookies: &[Cookie]) -> ScrapeResult<()> {
    let path = path.as_ref();
    let raw = serde_json::to_string_pretty(cookies)
        .map_err(|error| ScrapeError::session(error.to_string()))?;
    tokio::fs::write(path, raw)
        .await
        .map_err(|error| ScrapeError::session(format!("{}: {error}", path.display())))
}

/// Navigate to the platform origin, inject the cookies, and refresh so the
/// session takes effect. Cookies some backends reject on injection have
/// their `sameSite` attribute cleared first.
pub async fn restore_session<D: Driver + ?Sized>(
    driver: &D,
    base_url: &str,
    cookies: &[Cookie],
    settle: Duration,
) -> ScrapeResult<()> {
    driver.navigate(base_url).await?;
    driver.sleep(settle).await;

    let mut injected = 0usize;
    for cookie in cookies {
        let mut sanitized = cookie.clone();
        sanitized.same_site = None;
        match driver.add_cookie(&sanitized).await {
            Ok(()) => injected += 1,
            Err(error) => debug!(cookie = %cookie.name, %error, "cookie rejected"),
        }
    }
    info!(injected, total = cookies.len(), "session cookies injected");

    driver.refresh().await?;
    driver.sleep(settle).await;
    Ok(())
}

/// Whether the restored session is authenticated. A login form means no;
/// otherwise any logged-in indicator means yes.
pub async fn check_login_status<D: Driver + ?Sized>(
    driver: &D,
    table: &SelectorTable,
) -> bool {
    for expression in &table.login_form {
        if let Ok(handles) = driver.query(QueryScope::Document, expression).await {
            if !handles.is_empty() {
                return false;
            }
        }
    }
    for expression in &table.logged_in_indicators {
        if let Ok(handles) = driver.query(QueryScope::Document, expression).await {
            if !handles.is_empty() {
                return true;
            }
        }
    }
    false
}

/// Dismiss the "Save your login info?" interstitial if present. Absence is
/// the common case and not an error.
pub async fn dismiss_save_login_popup<D: Driver + ?Sized>(
    driver: &D,
    table: &SelectorTable,
    settle: Duration,
) {
    for expression in &table.dismiss_popup {
        let Ok(handles) = driver.query(QueryScope::Document, expression).await else {
            continue;
        };
        for handle in &handles {
            let text = driver.text(handle).await.unwrap_or_default();
            if text.to_lowercase().contains("not now") {
                match driver.click(handle).await {
                    Ok(()) => {
                        info!("dismissed login-save popup");
                        driver.sleep(settle).await;
                        return;
                    }
                    Err(error) => warn!(%error, "popup dismissal click failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockDriver, MockElement, MockPage};

    fn cookie(name: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: Some(".instagram.com".to_string()),
            path: Some("/".to_string()),
            secure: Some(true),
            expiry: None,
            same_site: Some("Lax".to_string()),
        }
    }

    #[tokio::test]
    async fn cookies_roundtrip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let cookies = vec![cookie("sessionid"), cookie("csrftoken")];

        save_cookies(&path, &cookies).await.unwrap();
        let back = load_cookies(&path).await.unwrap();
        assert_eq!(back, cookies);
    }

    #[tokio::test]
    async fn missing_cookie_file_is_a_session_error() {
        let error = load_cookies("/nonexistent/cookies.json").await.unwrap_err();
        assert!(matches!(error, ScrapeError::SessionStore { .. }));
        assert!(!error.is_recoverable());
    }

    #[tokio::test]
    async fn restore_clears_same_site_before_injection() {
        let driver = MockDriver::new();
        driver.add_page("https://www.instagram.com", MockPage { elements: vec![] });

        restore_session(
            &driver,
            "https://www.instagram.com",
            &[cookie("sessionid")],
            Duration::ZERO,
        )
        .await
        .unwrap();

        let stored = driver.cookies().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].same_site, None);
    }

    #[tokio::test]
    async fn login_form_means_unauthenticated() {
        let driver = MockDriver::new();
        driver.add_page(
            "about:blank",
            MockPage {
                elements: vec![
                    MockElement::new(&[r#"form[action*="login"]"#]),
                    MockElement::new(&[r#"svg[aria-label="Home"]"#]),
                ],
            },
        );
        assert!(!check_login_status(&driver, &SelectorTable::default()).await);
    }

    #[tokio::test]
    async fn indicator_means_authenticated() {
        let driver = MockDriver::new();
        driver.add_page(
            "about:blank",
            MockPage {
                elements: vec![MockElement::new(&[r#"svg[aria-label="Home"]"#])],
            },
        );
        assert!(check_login_status(&driver, &SelectorTable::default()).await);
    }

    #[tokio::test]
    async fn popup_dismissal_clicks_the_not_now_button() {
        let driver = MockDriver::new();
        driver.add_page(
            "about:blank",
            MockPage {
                elements: vec![
                    MockElement::new(&["button"]).with_text("Save info"),
                    MockElement::new(&["button"]).with_text("Not now"),
                ],
            },
        );
        dismiss_save_login_popup(&driver, &SelectorTable::default(), Duration::ZERO).await;
        assert_eq!(driver.click_count(), 1);
    }
}
