//! Error types for the extraction pipeline
//!
//! The taxonomy distinguishes locally-recovered misses (a field or item not
//! found after retries) from navigation faults and prerequisite failures.
//! Per-item errors never terminate the run; they are converted to sentinel
//! records by the orchestrator.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    /// No candidate expression matched after the bounded retries. Transient
    /// render misses escalate to this once attempts are exhausted.
    #[error("no candidate matched for '{field}' after {attempts} attempts")]
    NotFound {
        field: String,
        attempts: u32,
        tried_selectors: Vec<String>,
    },

    /// Opening, switching, or closing a navigation context failed.
    #[error("navigation fault during {operation}: {reason}")]
    NavigationFault { operation: String, reason: String },

    /// The account's listing never loaded; the whole work item is failed.
    #[error("listing for account '{account}' unavailable: {reason}")]
    Prerequisite { account: String, reason: String },

    /// An error reported by the underlying automation driver.
    #[error("driver error: {message}")]
    Driver { message: String },

    /// A query expression the driver refused to evaluate.
    #[error("invalid query expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("session store error: {message}")]
    SessionStore { message: String },

    #[error("work list error: {message}")]
    WorkList { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ScrapeError {
    pub fn not_found(field: &str, attempts: u32, tried_selectors: Vec<String>) -> Self {
        Self::NotFound {
            field: field.to_string(),
            attempts,
            tried_selectors,
        }
    }

    pub fn navigation(operation: &str, reason: impl std::fmt::Display) -> Self {
        Self::NavigationFault {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn prerequisite(account: &str, reason: impl std::fmt::Display) -> Self {
        Self::Prerequisite {
            account: account.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn driver(message: impl std::fmt::Display) -> Self {
        Self::Driver {
            message: message.to_string(),
        }
    }

    pub fn session(message: impl std::fmt::Display) -> Self {
        Self::SessionStore {
            message: message.to_string(),
        }
    }

    pub fn work_list(message: impl std::fmt::Display) -> Self {
        Self::WorkList {
            message: message.to_string(),
        }
    }

    /// Whether the run can continue past this error with a sentinel record.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::NavigationFault { .. }
            | Self::Driver { .. }
            | Self::InvalidExpression { .. }
            | Self::Prerequisite { .. } => true,
            Self::SessionStore { .. } | Self::WorkList { .. } | Self::Configuration { .. } => {
                false
            }
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
