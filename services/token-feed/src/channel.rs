//! Live-update channel
//!
//! Process-local publish/subscribe broadcaster. Once connected with a working
//! set of tokens it picks one token per jittered interval, mutates it, stores
//! the result back and hands the full record to every subscriber in
//! registration order.
//!
//! Flow: connect → (tick → mutate → deliver)* → disconnect.
//!
//! # Cancellation
//!
//! The emission timer is a tokio task owned through its `JoinHandle`. Every
//! `connect`/`disconnect` bumps an epoch under the channel lock; a tick only
//! proceeds while its epoch is current, and delivery re-checks it before each
//! callback. After `disconnect` returns no further callback is started.
//!
//! The lock guards the working set and the subscriber list and is released
//! before any callback runs, so callbacks may call back into the channel.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use types::ids::TokenId;
use types::token::Token;

use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::generator::TokenGenerator;
use crate::metrics::FeedMetrics;

/// Subscriber callback. Receives the full post-mutation token.
pub type Callback = Arc<dyn Fn(&Token) + Send + Sync>;

type SubscriberId = u64;

struct ChannelState {
    connected: bool,
    working_set: BTreeMap<TokenId, Token>,
    /// Keyed by a monotonic id, so iteration order is registration order.
    subscribers: BTreeMap<SubscriberId, Callback>,
    next_subscriber: SubscriberId,
    timer: Option<JoinHandle<()>>,
    generator: TokenGenerator,
}

struct Shared {
    state: Mutex<ChannelState>,
    epoch: AtomicU64,
    metrics: Arc<FeedMetrics>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`UpdateChannel::subscribe`].
///
/// `unsubscribe` removes exactly the callback it was created for; calling it
/// again, or after the channel was dropped, does nothing.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriberId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(shared) = self.shared.upgrade() {
            if shared.lock().subscribers.remove(&self.id).is_some() {
                debug!(subscriber = self.id, "Unsubscribed");
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Live-update broadcaster with an owned, cancellable emission timer.
pub struct UpdateChannel {
    shared: Arc<Shared>,
    config: ChannelConfig,
}

impl UpdateChannel {
    pub fn new(config: ChannelConfig, metrics: Arc<FeedMetrics>) -> Self {
        info!(
            min_interval_ms = config.min_interval.as_millis() as u64,
            max_interval_ms = config.max_interval.as_millis() as u64,
            seeded = config.seed.is_some(),
            "UpdateChannel initialized"
        );

        let state = ChannelState {
            connected: false,
            working_set: BTreeMap::new(),
            subscribers: BTreeMap::new(),
            next_subscriber: 1,
            timer: None,
            generator: TokenGenerator::with_seed(config.seed),
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                epoch: AtomicU64::new(0),
                metrics,
            }),
            config,
        }
    }

    /// Channel with default configuration and private metrics.
    pub fn with_defaults() -> Self {
        Self::new(ChannelConfig::default(), Arc::new(FeedMetrics::new()))
    }

    /// Load the working set and start emitting.
    ///
    /// No-op while already connected: the first working set stays in place
    /// and no second timer is started. Fails without changing state when no
    /// tokio runtime is available to host the timer.
    pub fn connect(&self, tokens: Vec<Token>) -> Result<(), ChannelError> {
        let mut state = self.shared.lock();
        if state.connected {
            debug!("connect ignored: already connected");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        state.working_set = keyed(tokens);
        state.connected = true;
        state.timer = Some(runtime.spawn(run_timer(
            Arc::downgrade(&self.shared),
            self.config.clone(),
            epoch,
        )));

        info!(epoch, tokens = state.working_set.len(), "Channel connected");
        Ok(())
    }

    /// Stop emitting, drop the working set and every subscriber. Idempotent.
    pub fn disconnect(&self) {
        let mut state = self.shared.lock();
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        let was_connected = state.connected;
        state.connected = false;
        state.working_set.clear();
        state.subscribers.clear();

        if was_connected {
            info!("Channel disconnected");
        }
    }

    /// Register a callback. Delivery order is registration order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Token) + Send + Sync + 'static,
    {
        let mut state = self.shared.lock();
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        state.subscribers.insert(id, Arc::new(callback));
        debug!(subscriber = id, total = state.subscribers.len(), "Subscribed");

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Replace the working set without touching connection state or
    /// subscribers.
    pub fn update_working_set(&self, tokens: Vec<Token>) {
        let mut state = self.shared.lock();
        state.working_set = keyed(tokens);
        debug!(tokens = state.working_set.len(), "Working set replaced");
    }

    /// Run one emission tick now. Returns the emitted token, or `None` when
    /// disconnected or the working set is empty.
    pub fn emit_now(&self) -> Option<Token> {
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        emit(&self.shared, epoch)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.lock().connected
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    pub fn working_set_len(&self) -> usize {
        self.shared.lock().working_set.len()
    }

    /// Latest known value of a token in the working set.
    pub fn working_token(&self, id: &TokenId) -> Option<Token> {
        self.shared.lock().working_set.get(id).cloned()
    }

    /// Whether an emission timer is currently scheduled.
    pub fn has_active_timer(&self) -> bool {
        self.shared
            .lock()
            .timer
            .as_ref()
            .map_or(false, |timer| !timer.is_finished())
    }
}

impl Drop for UpdateChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn keyed(tokens: Vec<Token>) -> BTreeMap<TokenId, Token> {
    tokens.into_iter().map(|t| (t.id.clone(), t)).collect()
}

/// Timer loop. Holds only a weak reference so a dropped channel ends it.
async fn run_timer(shared: Weak<Shared>, config: ChannelConfig, epoch: u64) {
    loop {
        let delay = {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.lock();
            state.generator.jitter(config.min_interval, config.max_interval)
        };
        trace!(epoch, delay_ms = delay.as_millis() as u64, "Next emission scheduled");

        tokio::time::sleep(delay).await;

        let Some(shared) = shared.upgrade() else {
            return;
        };
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        emit(&shared, epoch);
    }
}

/// One tick: select, mutate and store under the lock, then deliver outside it.
fn emit(shared: &Shared, epoch: u64) -> Option<Token> {
    let (token, subscribers) = {
        let mut guard = shared.lock();
        let state = &mut *guard;

        if !state.connected || shared.epoch.load(Ordering::SeqCst) != epoch {
            return None;
        }

        let Some(index) = state.generator.pick(state.working_set.len()) else {
            trace!("Tick skipped: empty working set");
            shared.metrics.record_skipped_tick();
            return None;
        };
        let current = state.working_set.values().nth(index)?;
        let next = state.generator.mutate(current);
        state.working_set.insert(next.id.clone(), next.clone());

        let subscribers: Vec<Callback> = state.subscribers.values().cloned().collect();
        (next, subscribers)
    };

    shared.metrics.record_emission();
    debug!(
        token = %token.id,
        price = token.price,
        subscribers = subscribers.len(),
        "Emitting update"
    );

    for callback in subscribers {
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            debug!("Delivery stopped: channel disconnected mid-tick");
            break;
        }
        if panic::catch_unwind(AssertUnwindSafe(|| callback(&token))).is_err() {
            shared.metrics.record_callback_failure();
            warn!(token = %token.id, "Subscriber callback panicked; continuing delivery");
        }
    }

    Some(token)
}
