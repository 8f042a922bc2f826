//! Identifier types for tracked tokens
//!
//! Token ids and on-chain addresses live in distinct namespaces. Both are
//! opaque strings; the newtypes keep them from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ParseError;

/// Unique identifier for a token
///
/// Stable for the token's lifetime. The feed uses `"{category}-{index}"`
/// but consumers must treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Create a new TokenId from a string
    ///
    /// # Panics
    /// Panics if the id is empty
    pub fn new(id: impl Into<String>) -> Self {
        let s = id.into();
        assert!(!s.is_empty(), "TokenId must not be empty");
        Self(s)
    }

    /// Try to create a TokenId, rejecting empty input
    pub fn try_new(id: impl Into<String>) -> Result<Self, ParseError> {
        let s = id.into();
        if s.is_empty() {
            Err(ParseError::InvalidTokenId {
                reason: "empty".to_string(),
            })
        } else {
            Ok(Self(s))
        }
    }

    /// Get the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// On-chain address of a token's contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAddress(String);

impl TokenAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
