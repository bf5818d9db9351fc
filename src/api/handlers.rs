//! HTTP request handlers

use super::types::{ChatRequest, ChatResponse, ClearResponse, ErrorResponse};
use super::AppState;
use crate::chat::ChatError;
use crate::session::HistoryEntry;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Cookie carrying the opaque session key
pub const SESSION_COOKIE: &str = "moyo_session";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/clear", post(clear))
        .route("/api/history", get(history))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ChatRequest>,
) -> Result<(CookieJar, Json<ChatResponse>), AppError> {
    let (jar, session_key) = ensure_session_cookie(jar);

    let reply = state.chat.chat(&session_key, &req.message).await?;

    Ok((jar, Json(ChatResponse { reply })))
}

/// Reuse the caller's session key, or mint one and set the cookie.
fn ensure_session_cookie(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let key = cookie.value().to_string();
        return (jar, key);
    }

    let key = uuid::Uuid::new_v4().to_string();
    let cookie = Cookie::build((SESSION_COOKIE, key.clone()))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), key)
}

// ============================================================
// Clear / History
// ============================================================

async fn clear(State(state): State<AppState>, jar: CookieJar) -> Json<ClearResponse> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.chat.clear(cookie.value()).await;
    }
    Json(ClearResponse::cleared())
}

async fn history(State(state): State<AppState>, jar: CookieJar) -> Json<Vec<HistoryEntry>> {
    let entries = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.chat.history(cookie.value()).await,
        None => Vec::new(),
    };
    Json(entries)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("moyo ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    /// Unexpected faults map to an opaque 500; internals never leak.
    #[allow(dead_code)]
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => AppError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Unexpected internal fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
