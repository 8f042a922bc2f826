//! Types library for the token discovery feed
//!
//! This library provides the data model shared by the feed service and any
//! presentation layer: the token record, its lifecycle category, connection
//! status, and the sort/filter vocabulary used by derived views.
//!
//! # Version
//! v1.0.0
//!
//! # Modules
//! - `ids`: Identifiers (TokenId, TokenAddress)
//! - `token`: Token record, Category, PriceMovement
//! - `sort`: Sort fields, directions and table filters
//! - `status`: Live connection status
//! - `errors`: Parse errors for the textual forms above

// Public modules
pub mod ids;
pub mod token;
pub mod sort;
pub mod status;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::token::*;
    pub use crate::sort::*;
    pub use crate::status::*;
    pub use crate::errors::*;
}
