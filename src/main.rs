use cryptoflip::config::{Config, SnapshotBackend};
use cryptoflip::services::{
    InMemorySnapshotStore, LogNotifier, RedisSnapshotStore, SignalEngine, SnapshotStore,
    SqliteSnapshotStore,
};
use cryptoflip::sources::BinanceClient;
use cryptoflip::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptoflip=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Starting cryptoflip server on {}:{}", config.host, config.port);
    info!(
        "EMA {}/{}, RSI {} (confirm > {} / < {}), timeframes: {}",
        config.signal.fast_period,
        config.signal.slow_period,
        config.signal.momentum_period,
        config.signal.upper_threshold,
        config.signal.lower_threshold,
        config
            .timeframes
            .iter()
            .map(|tf| tf.key.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );

    // Snapshot persistence
    let snapshots: Arc<dyn SnapshotStore> = match &config.snapshot_backend {
        SnapshotBackend::Sqlite { path } => Arc::new(SqliteSnapshotStore::new(path)?),
        SnapshotBackend::Redis { url } => Arc::new(RedisSnapshotStore::new(url).await),
        SnapshotBackend::Memory => Arc::new(InMemorySnapshotStore::new()),
    };
    info!("Snapshot store: {}", snapshots.backend());

    let state = AppState::new(config.clone());

    let provider = Arc::new(BinanceClient::new(
        &config.binance_api_url,
        config.fetch_timeout_secs,
    ));

    let engine = Arc::new(
        SignalEngine::new(&config, provider, snapshots, state.signal_store.clone())
            .with_notifier(Arc::new(LogNotifier))
            .with_notifier(state.broadcaster.clone()),
    );

    // Start the refresh loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine_task = {
        let engine = engine.clone();
        let interval = Duration::from_secs(config.refresh_interval_secs);
        tokio::spawn(async move { engine.run(interval, shutdown_rx).await })
    };

    let app = cryptoflip::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    engine_task.await?;

    Ok(())
}
