//! Bulk loading of token collections
//!
//! `TokenSource` is the boundary to whatever serves the initial token list.
//! `CategoryLoader` drives it: one in-flight request per category, a fetch
//! timeout, and the store's loading/error fields kept in step with the
//! outcome. A failed fetch leaves the last good collection in place.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use types::token::{Category, Token};

use crate::config::{LoaderConfig, SourceConfig};
use crate::error::FetchError;
use crate::generator::TokenGenerator;
use crate::metrics::FeedMetrics;
use crate::store::SharedStore;

/// Upstream that serves a category's token list.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_tokens(&self, category: Category, count: usize) -> Result<Vec<Token>, FetchError>;
}

/// Generator-backed source with simulated request latency.
pub struct SimulatedSource {
    generator: Mutex<TokenGenerator>,
    latency: Duration,
}

impl SimulatedSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            generator: Mutex::new(TokenGenerator::with_seed(config.seed)),
            latency: config.latency,
        }
    }
}

#[async_trait]
impl TokenSource for SimulatedSource {
    async fn fetch_tokens(&self, category: Category, count: usize) -> Result<Vec<Token>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let tokens = {
            let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
            generator.generate_batch(count, category)
        };
        debug!(%category, count, "Simulated fetch served");
        Ok(tokens)
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    in_flight: [bool; 3],
    loaded_at: [Option<Instant>; 3],
}

impl LoaderState {
    fn any_in_flight(&self) -> bool {
        self.in_flight.iter().any(|f| *f)
    }
}

/// Loads categories from a [`TokenSource`] into the shared store.
pub struct CategoryLoader {
    source: Arc<dyn TokenSource>,
    store: SharedStore,
    config: LoaderConfig,
    metrics: Arc<FeedMetrics>,
    state: Mutex<LoaderState>,
}

/// Holds a category's in-flight slot. A fetch that completes settles it;
/// one that is dropped mid-flight releases the slot on drop and resets the
/// store's `loading` flag.
struct InFlight<'a> {
    loader: &'a CategoryLoader,
    category: Category,
    settled: bool,
}

impl InFlight<'_> {
    /// Release the slot. Returns whether another fetch is still running.
    fn settle(mut self, loaded: bool) -> bool {
        self.settled = true;
        self.loader.release(self.category, loaded)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let still_loading = self.loader.release(self.category, false);
        self.loader
            .store
            .update(|store| store.set_loading(still_loading));
        debug!(category = %self.category, "Fetch abandoned before completion");
    }
}

impl CategoryLoader {
    pub fn new(
        source: Arc<dyn TokenSource>,
        store: SharedStore,
        config: LoaderConfig,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            source,
            store,
            config,
            metrics,
            state: Mutex::new(LoaderState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, category: Category) -> Result<InFlight<'_>, FetchError> {
        let mut state = self.lock();
        let slot = &mut state.in_flight[category.index()];
        if *slot {
            return Err(FetchError::InFlight(category));
        }
        *slot = true;
        Ok(InFlight {
            loader: self,
            category,
            settled: false,
        })
    }

    fn release(&self, category: Category, loaded: bool) -> bool {
        let mut state = self.lock();
        state.in_flight[category.index()] = false;
        if loaded {
            state.loaded_at[category.index()] = Some(Instant::now());
        }
        state.any_in_flight()
    }

    /// Fetch one category and apply the outcome to the store.
    ///
    /// On success the collection is replaced and the error cleared. On
    /// failure the error is recorded and the collection is left as it was.
    /// Either way `loading` reflects whether any other fetch is still running,
    /// including when the returned future is dropped before it completes.
    pub async fn load(&self, category: Category) -> Result<usize, FetchError> {
        let in_flight = self.begin(category)?;
        self.store.update(|store| store.set_loading(true));

        let timeout = self.config.fetch_timeout;
        let fetch = self.source.fetch_tokens(category, self.config.batch_size);
        let result = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                category,
                after: timeout,
            }),
        };

        let still_loading = in_flight.settle(result.is_ok());
        self.metrics.record_fetch(result.is_ok());

        match result {
            Ok(tokens) => {
                let count = tokens.len();
                self.store.update(|store| {
                    store.replace_category(category, tokens);
                    store.set_loading(still_loading);
                    store.set_error(None);
                });
                info!(%category, count, "Category loaded");
                Ok(count)
            }
            Err(err) => {
                let message = err.to_string();
                self.store.update(|store| {
                    store.set_loading(still_loading);
                    store.set_error(Some(message));
                });
                warn!(%category, error = %err, "Category load failed");
                Err(err)
            }
        }
    }

    /// Load every category in display order.
    pub async fn load_all(&self) -> Vec<(Category, Result<usize, FetchError>)> {
        let mut results = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            results.push((category, self.load(category).await));
        }
        results
    }

    /// Whether a category has never loaded or its last load is older than
    /// `stale_after`.
    pub fn is_stale(&self, category: Category) -> bool {
        match self.lock().loaded_at[category.index()] {
            None => true,
            Some(at) => at.elapsed() >= self.config.stale_after,
        }
    }

    /// Reload the stale categories. Returns the ones that reloaded.
    pub async fn refresh_stale(&self) -> Vec<Category> {
        let mut reloaded = Vec::new();
        for category in Category::ALL {
            if self.is_stale(category) && self.load(category).await.is_ok() {
                reloaded.push(category);
            }
        }
        reloaded
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}
