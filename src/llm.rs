//! Completion gateway boundary
//!
//! The remote model is an external collaborator: the core hands it the full
//! ordered transcript and gets back a reply or a classified failure.

mod error;
mod openai;
mod types;

pub use error::{GatewayError, GatewayErrorKind};
pub use openai::{GatewayConfig, OpenAiGateway};
pub use types::{Role, Turn};

use async_trait::async_trait;
use std::sync::Arc;

/// Interface to the remote completion service.
///
/// Stateless with respect to sessions: every call carries the whole
/// transcript it should complete against.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Ask the model for the next assistant reply given `transcript`.
    async fn complete(&self, transcript: &[Turn]) -> Result<String, GatewayError>;
}

/// Logging wrapper for completion gateways
pub struct LoggingGateway {
    inner: Arc<dyn CompletionGateway>,
}

impl LoggingGateway {
    pub fn new(inner: Arc<dyn CompletionGateway>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CompletionGateway for LoggingGateway {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(transcript).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    turns = transcript.len(),
                    reply_chars = reply.chars().count(),
                    "Completion request finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    turns = transcript.len(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Completion request failed"
                );
            }
        }

        result
    }
}
