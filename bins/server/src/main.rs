//! Khata API Server
//!
//! Main entry point for the Khata backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use khata_api::{AppState, create_router};
use khata_core::cache::QueryCache;
use khata_core::sync::{DisabledTransport, InMemoryTransport, RealtimeTransport, SyncContext};
use khata_db::{PgNotifyTransport, SheetBillClient, connect};
use khata_shared::{AppConfig, BillBackend, JwtConfig, JwtService, RealtimeMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(config.logging.json);

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.auth.jwt_secret.clone(),
        audience: config.auth.audience.clone(),
    });

    // Realtime transport
    let mut local_hub = None;
    let transport: Arc<dyn RealtimeTransport> = match config.realtime.mode {
        RealtimeMode::Postgres => Arc::new(PgNotifyTransport::new(
            config.database.url.clone(),
            &config.realtime,
        )),
        RealtimeMode::Local => {
            let hub = Arc::new(InMemoryTransport::with_buffer(config.realtime.buffer));
            local_hub = Some(Arc::clone(&hub));
            hub
        }
        RealtimeMode::Off => Arc::new(DisabledTransport),
    };
    info!(mode = ?config.realtime.mode, "Realtime configured");

    let cache = QueryCache::with_config(config.cache.max_capacity, config.cache.ttl_secs);

    // Spreadsheet bill endpoint
    let sheets = match &config.billing.sheet_url {
        Some(url) => Some(Arc::new(SheetBillClient::new(
            url.clone(),
            Duration::from_secs(config.billing.timeout_secs),
        )?)),
        None => None,
    };
    if config.billing.backend == BillBackend::Sheet && sheets.is_none() {
        warn!("Bill backend is 'sheet' but billing.sheet_url is not set");
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        sync: SyncContext::new(cache, transport),
        local_hub,
        bill_backend: config.billing.backend,
        sheets,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "khata=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
