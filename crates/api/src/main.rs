use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use boothline_core::store::QueueStore;
use boothline_engine::{MemoryStore, QueueEngine};
use boothline_events::EventBus;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boothline_api::config::ServerConfig;
use boothline_api::fanout::ObserverFanout;
use boothline_api::router::build_app_router;
use boothline_api::state::AppState;
use boothline_api::{background, ws};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boothline_api=debug,boothline_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store = open_store(&config).await;

    // --- Engine ---
    let event_bus = Arc::new(EventBus::default());
    let engine = Arc::new(QueueEngine::new(store, Arc::clone(&event_bus)));

    if config.seed_default_points {
        let seeded = engine
            .seed_default_points()
            .await
            .expect("Failed to seed default points");
        if seeded == 0 {
            tracing::debug!("Point registry already populated, skipping seed");
        }
    }

    // --- Observers ---
    let ws_manager = Arc::new(ws::WsManager::new(config.observer_buffer));
    let cancel = CancellationToken::new();

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone());

    let fanout = ObserverFanout::new(Arc::clone(&engine), Arc::clone(&ws_manager));
    let fanout_handle = tokio::spawn(fanout.run(engine.subscribe(), cancel.clone()));

    let snapshot_handle = (config.snapshot_interval_secs > 0).then(|| {
        tokio::spawn(background::snapshot::run(
            Arc::clone(&engine),
            Duration::from_secs(config.snapshot_interval_secs),
            cancel.clone(),
        ))
    });

    tracing::info!("Observer services started (fan-out, heartbeat, snapshot)");

    // --- App state ---
    let state = AppState {
        engine: Arc::clone(&engine),
        ws_manager: Arc::clone(&ws_manager),
        shutdown: cancel.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Observer streams never finish on their own, so they are closed as
    // soon as the signal arrives rather than after the drain.
    let shutdown = {
        let cancel = cancel.clone();
        let ws_manager = Arc::clone(&ws_manager);
        async move {
            shutdown_signal().await;
            cancel.cancel();
            let ws_count = ws_manager.connection_count().await;
            tracing::info!(ws_count, "Closing WebSocket connections");
            ws_manager.shutdown_all().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(drain, fanout_handle).await;
    if let Some(handle) = snapshot_handle {
        let _ = tokio::time::timeout(drain, handle).await;
    }
    let _ = tokio::time::timeout(drain, heartbeat_handle).await;
    tracing::info!("Observer services stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Pick the storage backend: PostgreSQL when `DATABASE_URL` is set,
/// otherwise the in-memory store.
async fn open_store(config: &ServerConfig) -> Arc<dyn QueueStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory store (state is lost on restart)");
        return Arc::new(MemoryStore::new());
    };

    let pool = boothline_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    boothline_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    boothline_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(boothline_db::PgQueueStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
