//! Error types for the token data model
//!
//! Parsing of the textual forms used on the wire and in configuration.

use thiserror::Error;

/// Failure to parse one of the model's textual forms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Unknown sort direction: {0}")]
    UnknownSortDirection(String),

    #[error("Invalid token id: {reason}")]
    InvalidTokenId { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_display() {
        let err = ParseError::UnknownCategory("graduated".to_string());
        assert_eq!(err.to_string(), "Unknown category: graduated");
    }

    #[test]
    fn test_invalid_token_id_display() {
        let err = ParseError::InvalidTokenId {
            reason: "empty".to_string(),
        };
        assert!(err.to_string().contains("empty"));
    }
}
