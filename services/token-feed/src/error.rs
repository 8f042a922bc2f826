//! Error types for the token feed

use std::time::Duration;

use thiserror::Error;
use types::token::Category;

/// Live-update channel failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// `connect` was called outside an async runtime, so the emission timer
    /// has nowhere to run.
    #[error("no async runtime available to drive the emission timer")]
    NoRuntime,
}

/// Bulk-load failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch for {category} timed out after {}ms", .after.as_millis())]
    Timeout { category: Category, after: Duration },

    #[error("upstream rejected fetch for {category}: {reason}")]
    Upstream { category: Category, reason: String },

    #[error("a fetch for {0} is already in flight")]
    InFlight(Category),
}

impl FetchError {
    /// Whether this failure should be surfaced in the store's error field.
    /// A duplicate request is refused without touching observable state.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, FetchError::InFlight(_))
    }
}
