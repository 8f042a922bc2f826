//! Token Feed Service
//!
//! Keeps three categorized token collections live:
//! - Bulk loads from an upstream source into the category store
//! - A simulated live-update channel that mutates one token per tick
//! - An orchestrator routing emitted updates into store upserts
//! - Memoized sort/filter views over each collection
//! - Versioned, checksummed store snapshots
//!
//! # Architecture
//!
//! ```text
//!   TokenSource (bulk)
//!        │
//!  ┌─────▼──────┐
//!  │  Loader    │  ← timeout, one fetch per category
//!  └─────┬──────┘
//!        │ replace_category
//!  ┌─────▼──────┐   working set   ┌───────────┐
//!  │   Store    ├────────────────►│  Channel  │ ← jittered timer
//!  └─────┬──────┘                 └─────┬─────┘
//!        │   ▲        upsert_token      │
//!        │   └──────── Orchestrator ◄───┘
//!        │
//!  ┌─────▼──────┐   ┌───────────┐
//!  │DerivedView │   │ Snapshot  │
//!  └────────────┘   └───────────┘
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod view;

pub use channel::{Subscription, UpdateChannel};
pub use config::FeedConfig;
pub use orchestrator::UpdateOrchestrator;
pub use source::{CategoryLoader, SimulatedSource, TokenSource};
pub use store::{CategoryStore, SharedStore};
pub use view::DerivedView;

/// Service version
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
