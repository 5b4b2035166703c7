//! Infrastructure layer
//!
//! Driver capability surface, selector-driven extraction, the navigation
//! state machine, and the supporting concerns: configuration, logging,
//! session restore, and work list I/O.

pub mod config;
pub mod driver;
pub mod extraction;
pub mod logging;
pub mod navigator;
pub mod scrape_error;
pub mod session;
pub mod worklist;

pub use config::AppConfig;
pub use driver::{ContextHandle, Cookie, Driver, ElementHandle, QueryScope, RetryPolicy};
pub use navigator::Navigator;
pub use scrape_error::{ScrapeError, ScrapeResult};
