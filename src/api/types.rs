//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to send a chat message. A missing field is treated as an empty
/// message and rejected downstream.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Response carrying the assistant reply
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Response for the clear action
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self { status: "cleared" }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
