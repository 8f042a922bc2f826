//! Update orchestrator
//!
//! Keeps the channel's working set on the observed category and routes every
//! emission into a store upsert. The store's `connection_status` moves in
//! lockstep with the channel: `Connecting` before connect, `Connected` right
//! after, `Disconnected` right after disconnect, `Error` when connect fails.

use std::sync::Arc;

use tracing::{debug, error, info, trace};
use types::status::ConnectionStatus;
use types::token::{Category, Token};

use crate::channel::{Subscription, UpdateChannel};
use crate::error::ChannelError;
use crate::metrics::FeedMetrics;
use crate::store::SharedStore;

pub struct UpdateOrchestrator {
    channel: Arc<UpdateChannel>,
    store: SharedStore,
    metrics: Arc<FeedMetrics>,
    subscription: Option<Subscription>,
    observed: Option<Category>,
}

impl UpdateOrchestrator {
    pub fn new(channel: Arc<UpdateChannel>, store: SharedStore, metrics: Arc<FeedMetrics>) -> Self {
        Self {
            channel,
            store,
            metrics,
            subscription: None,
            observed: None,
        }
    }

    /// Category currently wired to the channel.
    pub fn observed(&self) -> Option<Category> {
        self.observed
    }

    /// Point the channel at `category`.
    ///
    /// Drops the previous subscription first. An empty collection disconnects
    /// the channel. Otherwise the channel is connected (or re-armed when it
    /// already is) with the collection as its working set and a fresh
    /// subscription is installed. A connect failure is recorded in the store
    /// and returned.
    pub fn observe(&mut self, category: Category) -> Result<(), ChannelError> {
        self.release_subscription();
        self.observed = Some(category);

        let tokens = self.store.tokens(category);
        if tokens.is_empty() {
            self.disconnect_channel();
            info!(%category, "Observed category is empty; channel disconnected");
            return Ok(());
        }

        let count = tokens.len();
        self.arm(tokens)?;
        self.install_subscription();
        info!(%category, tokens = count, "Observing category");
        Ok(())
    }

    /// Re-arm the working set after the observed category was reloaded.
    pub fn resync(&mut self) -> Result<(), ChannelError> {
        let Some(category) = self.observed else {
            return Ok(());
        };

        let tokens = self.store.tokens(category);
        if !tokens.is_empty() && self.channel.is_connected() && self.subscription.is_some() {
            debug!(%category, tokens = tokens.len(), "Resyncing working set");
            self.channel.update_working_set(tokens);
            return Ok(());
        }

        self.observe(category)
    }

    /// Unsubscribe, disconnect and report `Disconnected`.
    pub fn shutdown(&mut self) {
        self.release_subscription();
        self.disconnect_channel();
        if let Some(category) = self.observed.take() {
            info!(%category, "Orchestrator shut down");
        }
    }

    fn arm(&mut self, tokens: Vec<Token>) -> Result<(), ChannelError> {
        if self.channel.is_connected() {
            self.channel.update_working_set(tokens);
            self.store
                .update(|store| store.set_connection_status(ConnectionStatus::Connected));
            return Ok(());
        }

        self.store
            .update(|store| store.set_connection_status(ConnectionStatus::Connecting));

        match self.channel.connect(tokens) {
            Ok(()) => {
                self.store
                    .update(|store| store.set_connection_status(ConnectionStatus::Connected));
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Channel connect failed");
                let message = err.to_string();
                self.store.update(|store| {
                    store.set_connection_status(ConnectionStatus::Error);
                    store.set_error(Some(message));
                });
                Err(err)
            }
        }
    }

    fn disconnect_channel(&self) {
        self.channel.disconnect();
        self.store
            .update(|store| store.set_connection_status(ConnectionStatus::Disconnected));
    }

    fn install_subscription(&mut self) {
        let store = self.store.clone();
        let metrics = Arc::clone(&self.metrics);

        let subscription = self.channel.subscribe(move |token: &Token| {
            let touched = store.update(|s| s.upsert_token(token));
            if touched.is_empty() {
                trace!(token = %token.id, "Update for token not in store");
            } else {
                metrics.record_upsert();
            }
        });
        self.subscription = Some(subscription);
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
