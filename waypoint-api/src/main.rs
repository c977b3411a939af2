use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypoint_amadeus::{AmadeusClient, AmadeusSettings};
use waypoint_api::{app, cors_layer, AppState};
use waypoint_core::repository::{LocationStore, ResultCache};
use waypoint_search::CacheTtls;
use waypoint_store::app_config::Config;
use waypoint_store::{DbClient, MemoryLocationStore, MemoryResultCache, PostgresLocationStore, RedisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypoint_api=debug,waypoint_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(environment = %config.server.environment, "Starting Waypoint API on port {}", config.server.port);

    // Postgres location store, in-memory when no database is configured
    let db = match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url, database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Some(db)
        }
        None => None,
    };
    let store: Arc<dyn LocationStore> = match &db {
        Some(db) => Arc::new(PostgresLocationStore::new(db.pool.clone())),
        None => {
            tracing::warn!("No database configured, locations will not survive a restart");
            Arc::new(MemoryLocationStore::new())
        }
    };

    // Redis result cache; degrade to an in-process cache if it is absent or unreachable
    let memory_cache = || -> Arc<dyn ResultCache> { Arc::new(MemoryResultCache::new(config.cache.memory_max_entries)) };
    let cache: Arc<dyn ResultCache> = match &config.redis {
        Some(redis) => match RedisClient::new(&redis.url).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unreachable, using in-memory result cache");
                memory_cache()
            }
        },
        None => memory_cache(),
    };

    let provider = AmadeusClient::new(AmadeusSettings {
        client_id: config.amadeus.client_id.clone(),
        client_secret: config.amadeus.client_secret.clone(),
        hostname: config.amadeus.hostname.clone(),
        timeout: Duration::from_secs(config.amadeus.timeout_seconds),
    })
    .context("Failed to build Amadeus client")?;
    tracing::info!(base_url = provider.base_url(), "Amadeus client ready");

    let ttls = CacheTtls {
        location_search: config.cache.location_search_ttl_seconds,
        flight_search: config.cache.flight_search_ttl_seconds,
        hotel_search: config.cache.hotel_search_ttl_seconds,
    };
    let max_location_age = config
        .locations
        .max_age_hours
        .map(|hours| chrono::Duration::hours(hours as i64));

    let state = AppState::new(
        store,
        cache,
        Arc::new(provider),
        ttls,
        max_location_age,
        config.server.environment.clone(),
    );
    let app = app(state, cors_layer(&config.server.cors_origin)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
