//! Versioned store snapshots
//!
//! Captures the category store as a self-contained, checksummed document a
//! consumer can persist or hand to a late joiner. The checksum covers every
//! token's id, price and update time in collection order, so any missed
//! update changes it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::status::ConnectionStatus;
use types::token::{Category, Token};

use crate::store::CategoryStore;

/// One collection inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub category: Category,
    pub revision: u64,
    pub tokens: Vec<Token>,
}

/// A versioned, checksummed copy of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Monotonic snapshot version.
    pub version: u64,
    /// Collections in display order.
    pub collections: Vec<CollectionSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
    pub connection_status: ConnectionStatus,
    /// Unix milliseconds when the snapshot was taken.
    pub timestamp: i64,
    /// Hex SHA-256 over the collections.
    pub checksum: String,
}

impl StoreSnapshot {
    pub fn tokens(&self, category: Category) -> &[Token] {
        self.collections
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.tokens.as_slice())
            .unwrap_or(&[])
    }

    pub fn token_count(&self) -> usize {
        self.collections.iter().map(|c| c.tokens.len()).sum()
    }
}

/// Builds versioned snapshots from the store.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version_counter: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, store: &CategoryStore, timestamp: i64) -> StoreSnapshot {
        self.version_counter += 1;

        let collections: Vec<CollectionSnapshot> = Category::ALL
            .iter()
            .map(|&category| CollectionSnapshot {
                category,
                revision: store.revision(category),
                tokens: store.tokens(category).to_vec(),
            })
            .collect();

        let checksum = compute_checksum(&collections);

        StoreSnapshot {
            version: self.version_counter,
            collections,
            loading: store.loading(),
            error: store.error().map(str::to_string),
            connection_status: store.connection_status(),
            timestamp,
            checksum,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.version_counter
    }
}

fn compute_checksum(collections: &[CollectionSnapshot]) -> String {
    let mut hasher = Sha256::new();

    for collection in collections {
        hasher.update(collection.category.slug().as_bytes());
        hasher.update(b"#");
        for token in &collection.tokens {
            hasher.update(token.id.as_str().as_bytes());
            hasher.update(b":");
            hasher.update(token.price.to_bits().to_le_bytes());
            hasher.update(b":");
            hasher.update(token.last_updated.timestamp_millis().to_le_bytes());
            hasher.update(b"|");
        }
        hasher.update(b"---");
    }

    format!("{:x}", hasher.finalize())
}

/// Whether a snapshot's checksum matches its collections.
pub fn verify_snapshot_integrity(snapshot: &StoreSnapshot) -> bool {
    snapshot.checksum == compute_checksum(&snapshot.collections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::TokenGenerator;

    fn populated_store() -> CategoryStore {
        let mut gen = TokenGenerator::seeded(21);
        let mut store = CategoryStore::new();
        for category in Category::ALL {
            store.replace_category(category, gen.generate_batch(3, category));
        }
        store
    }

    #[test]
    fn test_build_snapshot() {
        let store = populated_store();
        let mut builder = SnapshotBuilder::new();

        let snapshot = builder.build(&store, 1_700_000_000_000);

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.collections.len(), 3);
        assert_eq!(snapshot.token_count(), 9);
        assert_eq!(snapshot.tokens(Category::Migrated), store.migrated());
        assert_eq!(snapshot.checksum.len(), 64);
        assert!(verify_snapshot_integrity(&snapshot));
    }

    #[test]
    fn test_versions_increment() {
        let store = populated_store();
        let mut builder = SnapshotBuilder::new();

        builder.build(&store, 1);
        let second = builder.build(&store, 2);

        assert_eq!(second.version, 2);
        assert_eq!(builder.current_version(), 2);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let store = populated_store();
        let a = SnapshotBuilder::new().build(&store, 1);
        let b = SnapshotBuilder::new().build(&store, 999);
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn test_checksum_tracks_updates() {
        let mut store = populated_store();
        let before = SnapshotBuilder::new().build(&store, 1);

        let mut gen = TokenGenerator::seeded(5);
        let updated = gen.mutate(&store.final_stretch()[1]);
        store.upsert_token(&updated);
        let after = SnapshotBuilder::new().build(&store, 1);

        assert_ne!(before.checksum, after.checksum);
    }

    #[test]
    fn test_tampered_snapshot_fails_verification() {
        let store = populated_store();
        let mut snapshot = SnapshotBuilder::new().build(&store, 1);

        snapshot.collections[0].tokens[0].price += 1.0;

        assert!(!verify_snapshot_integrity(&snapshot));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let store = populated_store();
        let snapshot = SnapshotBuilder::new().build(&store, 1);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["connectionStatus"], "disconnected");
        assert_eq!(value["collections"][1]["category"], "final-stretch");
        assert_eq!(value["checksum"], snapshot.checksum.as_str());
    }
}
