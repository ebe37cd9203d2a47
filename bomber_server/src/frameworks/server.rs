// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{
    create_session_handler, delete_session_handler, spawn_session_serializer, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RegistrySettings, SessionRegistry};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{session_id}", delete(delete_session_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state().await?;
    let app = router(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let settings = RegistrySettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
        broadcast_interval: config::broadcast_interval(),
        tuning: config::session_tuning(),
    };
    tracing::debug!(
        tile_size = settings.tuning.tile_size,
        fuse_ms = settings.tuning.bomb.fuse.as_millis(),
        radius = settings.tuning.bomb.radius,
        broadcast_interval_ms = settings.broadcast_interval.as_millis(),
        "session settings"
    );

    // Setup Session Registry
    // This owns the set of active session tasks.
    let session_registry = Arc::new(SessionRegistry::new(settings));

    // Create the default session; its map arrives from the first client that registers one.
    // Keep it pinned so it never gets deleted.
    let default_session = session_registry
        .create_session(
            config::DEFAULT_SESSION_ID.to_string(),
            config::DEFAULT_SPAWN_POINTS.to_vec(),
            None,
            true,
        )
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default session: {e}")))?;
    spawn_session_serializer(&default_session);

    Ok(Arc::new(AppState {
        session_registry,
        default_session_id: Arc::from(config::DEFAULT_SESSION_ID),
    }))
}
