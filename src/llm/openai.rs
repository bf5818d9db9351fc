//! `OpenAI` chat-completions client
//!
//! Model and sampling parameters are fixed constants of the service, not
//! user-controlled knobs.

use super::types::Turn;
use super::{CompletionGateway, GatewayError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 250;
const TEMPERATURE: f32 = 0.8;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the completion gateway
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    /// Optional gateway URL overriding the public `OpenAI` endpoint
    pub base_url: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: std::env::var("MOYO_GATEWAY_URL").ok(),
        }
    }
}

/// `OpenAI` chat-completions service implementation
pub struct OpenAiGateway {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiGateway {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, GatewayError> {
        let request = translate_request(transcript);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {e}"))
                } else {
                    GatewayError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::malformed(format!("Failed to parse response: {e}")))?;

        normalize_response(completion)
    }
}

fn translate_request(transcript: &[Turn]) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: MODEL,
        messages: transcript
            .iter()
            .map(|turn| WireMessage {
                role: turn.role.as_str(),
                content: turn.content.clone(),
            })
            .collect(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Extract the reply text; an HTTP success without usable content is still a
/// gateway failure.
fn normalize_response(resp: ChatCompletionResponse) -> Result<String, GatewayError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::malformed("No choices in response"))?;

    match choice.message.content {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(GatewayError::malformed("Empty completion content")),
    }
}

fn error_for_status(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<OpenAiErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |resp| resp.error.message);

    match status.as_u16() {
        401 | 403 => GatewayError::auth(format!("Authentication failed: {message}")),
        429 => GatewayError::rate_limit(format!("Rate limit exceeded: {message}")),
        400 => GatewayError::invalid_request(format!("Invalid request: {message}")),
        500..=599 => GatewayError::server_error(format!("Server error: {message}")),
        _ => GatewayError::unknown(format!("HTTP {status}: {message}")),
    }
}

// OpenAI API wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: &'static str,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Debug, Deserialize)]
struct WireReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
