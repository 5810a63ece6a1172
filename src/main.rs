//! geoipd - GeoIP lookup service with hot-swapped MaxMind databases
//!
//! This is the composition root that wires together all the components.

use geoipd::adapters::inbound::{ApiServer, ApiState};
use geoipd::adapters::outbound::{FileFetcher, MaxMindDecoder, MaxMindFetcher};
use geoipd::application::{bootstrap, DatasetProvider, RefreshScheduler, RefreshStats};
use geoipd::config::load_config;
use geoipd::domain::ports::{DatasetDecoder, DatasetFetcher};
use geoipd::domain::{Credentials, Edition};
use geoipd::infrastructure::{shutdown_signal, ShutdownController};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from flags and environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting geoipd edition={} listen={} prefix={}",
        cfg.edition,
        cfg.listen_addr,
        cfg.route_prefix
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters
    let edition = Edition::new(cfg.edition.clone());
    if !edition.has_city_data() {
        tracing::info!(
            "edition {} has no city data, city/region/postal fields will be empty",
            edition
        );
    }

    let (fetcher, decoder): (Arc<dyn DatasetFetcher>, Arc<dyn DatasetDecoder>) =
        match &cfg.database_path {
            Some(path) => {
                let file_fetcher = FileFetcher::new(path);
                tracing::info!(
                    "using local database file {}",
                    file_fetcher.path().display()
                );
                (Arc::new(file_fetcher), Arc::new(MaxMindDecoder::new()))
            }
            None => (
                Arc::new(MaxMindFetcher::new(cfg.update_url.clone(), cfg.fetch_timeout)?),
                Arc::new(MaxMindDecoder::expecting(edition.clone())),
            ),
        };

    let credentials = Credentials::new(
        cfg.account_id.clone(),
        cfg.license_key.clone().unwrap_or_default(),
    );

    // 2. Create application services
    let provider = Arc::new(DatasetProvider::new(
        fetcher,
        decoder,
        edition,
        credentials,
        cfg.fetch_timeout,
    ));

    // Nothing is served until the first dataset is installed
    let store = bootstrap(&provider).await?;

    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let refresh_stats = Arc::new(RefreshStats::new());
    let scheduler = RefreshScheduler::new(Arc::clone(&provider), Arc::clone(&store), cfg.update_interval)
        .with_jitter(cfg.refresh_jitter)
        .with_stats(Arc::clone(&refresh_stats));
    let scheduler_handle = scheduler.spawn(shutdown.subscribe());

    // 3. Create inbound adapter and run
    let server = ApiServer::new(
        cfg.listen_addr.clone(),
        cfg.route_prefix.clone(),
        cfg.allowed_origins.clone(),
        ApiState::new(store, refresh_stats),
    );

    let result = server.run(shutdown.clone()).await;

    // Stop the scheduler even when the listener failed
    shutdown.shutdown();
    if let Err(e) = scheduler_handle.await {
        tracing::error!("refresh scheduler task failed: {}", e);
    }

    result
}
