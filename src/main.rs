use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{
    cache::{CacheService, CachedCatalog},
    clock::{Clock, SystemClock},
    config::{Config, LogFormat},
    database::Database,
    router,
    services::HoldSweeper,
    store::{PgStore, ShowCatalog},
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    let filter = tracing_subscriber::EnvFilter::new(&config.app.rust_log);
    match config.app.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    info!("Starting Cinema Booking API ({})", config.app.environment);

    // Connect to the database
    let db = Database::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(db));
    let catalog = build_catalog(&config, store.clone()).await;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let app_state = AppState::new(
        catalog,
        store.clone(),
        store.clone(),
        clock.clone(),
        &config.booking,
    );

    // --- Background tasks ---

    if config.features.enable_hold_sweeper {
        let sweeper = HoldSweeper::new(
            store.clone(),
            clock,
            Duration::from_secs(config.booking.sweep_interval_seconds),
        );
        task::spawn(sweeper.run());
    }

    // --- Web server ---

    let app = router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// Falls back to the database alone when caching is off or Redis is unreachable
async fn build_catalog(config: &Config, store: Arc<PgStore>) -> Arc<dyn ShowCatalog> {
    let redis_config = match (&config.redis, config.features.enable_catalog_cache) {
        (Some(redis_config), true) => redis_config,
        _ => return store,
    };

    match CacheService::connect(&redis_config.url, redis_config.catalog_ttl_seconds).await {
        Ok(cache) => {
            info!("Redis connected, catalog cache enabled");
            let cached: Arc<dyn ShowCatalog> = Arc::new(CachedCatalog::new(store, cache));
            cached
        }
        Err(e) => {
            warn!("Redis unavailable, catalog cache disabled: {:?}", e);
            store
        }
    }
}
