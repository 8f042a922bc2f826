//! Category store
//!
//! Single source of truth for the three token collections and the status
//! fields presentation layers observe. Every mutation goes through one of a
//! few narrow entry points, and the shared handle applies each of them under
//! an exclusive lock, so readers never see a partially applied update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::sort::{TableFilters, TableSort};
use types::status::ConnectionStatus;
use types::token::{Category, Token};

/// The three token collections plus loading/error/connection status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStore {
    new_pairs: Vec<Token>,
    final_stretch: Vec<Token>,
    migrated: Vec<Token>,
    loading: bool,
    error: Option<String>,
    connection_status: ConnectionStatus,
    sort: TableSort,
    filters: TableFilters,
    /// Stamp of the last change to each collection. Not serialized; a
    /// deserialized store draws fresh stamps.
    #[serde(skip, default = "fresh_revisions")]
    revisions: [u64; 3],
}

/// Process-wide source of revision stamps. Two collections carrying the same
/// non-zero stamp, in any store instance, hold the same contents; stamp 0 is
/// only ever paired with an untouched empty collection.
static REVISION_STAMPS: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    REVISION_STAMPS.fetch_add(1, Ordering::Relaxed)
}

fn fresh_revisions() -> [u64; 3] {
    [next_revision(), next_revision(), next_revision()]
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens of one category, in stored order.
    pub fn tokens(&self, category: Category) -> &[Token] {
        match category {
            Category::New => &self.new_pairs,
            Category::FinalStretch => &self.final_stretch,
            Category::Migrated => &self.migrated,
        }
    }

    fn tokens_mut(&mut self, category: Category) -> &mut Vec<Token> {
        match category {
            Category::New => &mut self.new_pairs,
            Category::FinalStretch => &mut self.final_stretch,
            Category::Migrated => &mut self.migrated,
        }
    }

    pub fn new_pairs(&self) -> &[Token] {
        &self.new_pairs
    }

    pub fn final_stretch(&self) -> &[Token] {
        &self.final_stretch
    }

    pub fn migrated(&self) -> &[Token] {
        &self.migrated
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn sort(&self) -> TableSort {
        self.sort
    }

    pub fn filters(&self) -> &TableFilters {
        &self.filters
    }

    /// Change stamp of one collection. Differs whenever the contents may
    /// differ, including across store instances.
    pub fn revision(&self, category: Category) -> u64 {
        self.revisions[category.index()]
    }

    /// Replace a whole collection. Order is kept verbatim; the caller
    /// guarantees id uniqueness.
    pub fn replace_category(&mut self, category: Category, tokens: Vec<Token>) {
        debug!(%category, count = tokens.len(), "Replacing category");
        *self.tokens_mut(category) = tokens;
        self.revisions[category.index()] = next_revision();
    }

    /// Replace, in place, every stored token whose id matches.
    ///
    /// All three collections are checked; collections without the id are
    /// left untouched. Returns the categories that changed.
    pub fn upsert_token(&mut self, token: &Token) -> Vec<Category> {
        let mut touched = Vec::new();

        for category in Category::ALL {
            let collection = self.tokens_mut(category);
            if let Some(slot) = collection.iter_mut().find(|t| t.id == token.id) {
                *slot = token.clone();
                touched.push(category);
            }
        }

        for category in &touched {
            self.revisions[category.index()] = next_revision();
        }

        touched
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status;
    }

    pub fn set_sort(&mut self, sort: TableSort) {
        self.sort = sort;
    }

    pub fn set_filters(&mut self, filters: TableFilters) {
        self.filters = filters;
    }
}

/// Cloneable, thread-safe handle to a [`CategoryStore`].
///
/// `update` runs the closure under the write lock, so a mutation is either
/// fully visible to readers or not at all.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<CategoryStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: CategoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Read under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&CategoryStore) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Mutate under the exclusive lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut CategoryStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> CategoryStore {
        self.read(CategoryStore::clone)
    }

    pub fn tokens(&self, category: Category) -> Vec<Token> {
        self.read(|store| store.tokens(category).to_vec())
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.read(CategoryStore::connection_status)
    }
}
