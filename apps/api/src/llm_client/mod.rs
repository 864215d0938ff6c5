//! LLM Client: the single point of entry for all model calls in the service.
//!
//! ARCHITECTURAL RULE: No other module may talk to the Ollama HTTP API directly.
//! All model interactions MUST go through a `ModelGateway`.
//!
//! Model: mistral (hardcoded, one model per deployment)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Path of the non-chat generation endpoint, relative to the Ollama base URL.
const GENERATE_PATH: &str = "/api/generate";
/// The model used for all calls.
pub const MODEL: &str = "mistral";

#[derive(Debug, Error)]
pub enum ModelError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The model host answered with a non-success status.
    #[error("model host returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The reply body was not a generation envelope.
    #[error("unparseable response envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

impl ModelError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::Transport(_))
    }
}

/// Sends one prompt to the model and returns its raw text reply.
///
/// Implementations never apply fallback policy; callers decide what a failure means.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// The `/api/generate` reply. Only `response` is required.
#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Ollama-backed gateway. Buffers the full reply (`stream: false`) and retries
/// transport failures with exponential backoff up to `max_attempts`.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    max_attempts: u32,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration, max_attempts: u32) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH),
            max_attempts: max_attempts.max(1),
        })
    }

    async fn invoke_once(&self, prompt: &str) -> Result<String, ModelError> {
        let request_body = GenerateRequest {
            model: MODEL,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ModelError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: GenerateEnvelope = serde_json::from_str(&body)?;

        debug!(
            "Model call succeeded: prompt_tokens={:?}, output_tokens={:?}",
            envelope.prompt_eval_count, envelope.eval_count
        );

        Ok(envelope.response)
    }
}

#[async_trait]
impl ModelGateway for OllamaClient {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 1;
        loop {
            match self.invoke_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    // Exponential backoff: 1s, 2s, 4s
                    let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                    warn!(
                        "Model call attempt {} failed ({}), retrying after {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
