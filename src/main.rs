//! Moyo - love and relationship chat relay
//!
//! A Rust backend that relays chat messages in a narrow love/relationships
//! domain to a remote completion model, keeping per-session conversation
//! state.

mod api;
mod audit;
mod chat;
mod filter;
mod llm;
mod session;

use api::{create_router, AppState};
use audit::FileAuditLog;
use llm::{GatewayConfig, LoggingGateway, OpenAiGateway};
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moyo=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let chat_log = std::env::var("MOYO_CHAT_LOG").unwrap_or_else(|_| "chat_log.txt".to_string());

    let session_ttl = std::env::var("MOYO_SESSION_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or(DEFAULT_SESSION_TTL, Duration::from_secs);

    // Completion gateway
    let gateway_config = GatewayConfig::from_env();
    let Some(api_key) = gateway_config.api_key else {
        return Err("OPENAI_API_KEY is not set".into());
    };
    let gateway = Arc::new(LoggingGateway::new(Arc::new(OpenAiGateway::new(
        api_key,
        gateway_config.base_url.as_deref(),
    ))));

    // Session store and audit log
    let store = Arc::new(SessionStore::new());
    let audit = Arc::new(FileAuditLog::new(&chat_log));
    tracing::info!(path = %chat_log, "Audit log opened");

    // The store owns session lifecycle: idle sessions are dropped by a
    // background sweep.
    let sweep_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sweep_store.evict_idle(session_ttl).await;
            if evicted > 0 {
                tracing::info!(evicted, "Evicted idle sessions");
            }
        }
    });

    // Create application state
    let state = AppState::new(store, gateway, audit);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Moyo server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
