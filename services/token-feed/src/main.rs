use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use token_feed::metrics::FeedMetrics;
use token_feed::snapshot::{verify_snapshot_integrity, SnapshotBuilder};
use token_feed::{
    CategoryLoader, DerivedView, FeedConfig, SharedStore, SimulatedSource, TokenSource,
    UpdateChannel, UpdateOrchestrator, SERVICE_VERSION,
};
use types::ids::TokenId;
use types::token::{Category, PriceMovement};

const REPORT_INTERVAL: Duration = Duration::from_secs(5);
const REPORT_ROWS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FeedConfig::from_env().context("invalid TOKEN_FEED_* configuration")?;
    info!(
        version = SERVICE_VERSION,
        observed = %config.observed,
        run_for_secs = config.run_for.as_secs(),
        "Starting token feed"
    );

    let metrics = Arc::new(FeedMetrics::new());
    let store = SharedStore::new();
    let source: Arc<dyn TokenSource> = Arc::new(SimulatedSource::new(config.source.clone()));
    let loader = CategoryLoader::new(source, store.clone(), config.loader.clone(), Arc::clone(&metrics));
    let channel = Arc::new(UpdateChannel::new(config.channel.clone(), Arc::clone(&metrics)));
    let mut orchestrator =
        UpdateOrchestrator::new(Arc::clone(&channel), store.clone(), Arc::clone(&metrics));

    info!(
        batch_size = loader.config().batch_size,
        stale_after_secs = loader.config().stale_after.as_secs(),
        "Loading categories"
    );
    for (category, result) in loader.load_all().await {
        if let Err(err) = result {
            warn!(%category, error = %err, "Initial load failed");
        }
    }

    orchestrator
        .observe(config.observed)
        .context("failed to start live updates")?;

    let mut view = DerivedView::new();
    let mut last_prices: HashMap<TokenId, f64> = HashMap::new();

    let mut report = interval(REPORT_INTERVAL);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut refresh = interval(loader.config().refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // initial load already happened
    refresh.tick().await;

    let switch_at = Instant::now() + config.run_for / 2;
    let mut switched = false;

    let deadline = tokio::time::sleep(config.run_for);
    tokio::pin!(deadline);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut interrupt => {
                info!("Interrupted");
                break;
            }
            _ = report.tick() => {
                if !switched && Instant::now() >= switch_at {
                    switched = true;
                    if let Some(current) = orchestrator.observed() {
                        let next = Category::ALL[(current.index() + 1) % Category::ALL.len()];
                        info!(from = %current, to = %next, "Switching observed category");
                        orchestrator.observe(next)?;
                    }
                }
                let status = store.connection_status();
                if !status.is_live() {
                    warn!(?status, "Live updates are not flowing");
                }
                if let Some(category) = orchestrator.observed() {
                    report_top(&store, &mut view, category, &mut last_prices);
                }
            }
            _ = refresh.tick() => {
                let reloaded = loader.refresh_stale().await;
                if orchestrator.observed().map_or(false, |c| reloaded.contains(&c)) {
                    orchestrator.resync()?;
                }
            }
        }
    }

    orchestrator.shutdown();

    let snapshot = SnapshotBuilder::new().build(&store.snapshot(), Utc::now().timestamp_millis());
    info!(
        version = snapshot.version,
        tokens = snapshot.token_count(),
        checksum = %snapshot.checksum,
        verified = verify_snapshot_integrity(&snapshot),
        "Final store snapshot"
    );

    println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
    Ok(())
}

/// Log the top rows of the observed category under the store's sort.
fn report_top(
    store: &SharedStore,
    view: &mut DerivedView,
    category: Category,
    last_prices: &mut HashMap<TokenId, f64>,
) {
    let rows = store.read(|s| {
        view.rows(s, category)
            .iter()
            .take(REPORT_ROWS)
            .cloned()
            .collect::<Vec<_>>()
    });

    for (rank, token) in rows.iter().enumerate() {
        let movement = last_prices
            .insert(token.id.clone(), token.price)
            .map_or(PriceMovement::Flat, |previous| PriceMovement::between(previous, token.price));
        info!(
            %category,
            rank = rank + 1,
            symbol = %token.symbol,
            price = token.price,
            market_cap = token.market_cap,
            movement = ?movement,
            "Top token"
        );
    }
}
