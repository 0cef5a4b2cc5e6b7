//! OpenAI-compatible client implementation

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::GenerateRequest,
};

use super::mapper::{to_openai_request, ChunkMapper};
use super::sse::{parse_sse_stream, SseFrame};
use super::types::{ApiErrorBody, ChatCompletionRequest};

const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// API root, e.g. `https://api.deepseek.com` or `http://localhost:8080/v1`
    pub base_url: String,
    pub model: String,
    /// Retries for connection failures, 429 and 5xx
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            max_retries: 2,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Client for chat-completion models behind an OpenAI-compatible API
pub struct OpenAiClient {
    http_client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the base URL is not an http(s) URL, or an
    /// HTTP error if the underlying client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let base = config.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(LlmError::InvalidRequest(format!(
                "base URL must start with http:// or https://, got '{}'",
                config.base_url
            )));
        }

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Endpoint for chat completions
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim().trim_end_matches('/')
        )
    }

    /// Send the request, retrying failures that happen before streaming starts
    async fn send_with_retry(&self, body: &ChatCompletionRequest) -> Result<Response, LlmError> {
        let url = self.chat_completions_url();
        let mut attempt = 0;

        loop {
            let result = self
                .http_client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .header("Accept", "text/event-stream")
                .json(body)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    let text = response.text().await.unwrap_or_default();
                    classify_error(status, &headers, &text)
                }
                Err(e) => LlmError::from(e),
            };

            if attempt >= self.config.max_retries || !error.is_retryable() {
                return Err(error);
            }

            let delay = match &error {
                LlmError::RateLimitExceeded {
                    retry_after: Some(retry_after),
                } => *retry_after,
                _ => BASE_BACKOFF * 2u32.pow(attempt),
            };
            attempt += 1;
            warn!(
                attempt,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying chat completion: {}",
                error
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let body = to_openai_request(request, &self.config.model);
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "Sending chat completion request"
        );

        let response = self.send_with_retry(&body).await?;
        let mut frames = parse_sse_stream(Box::pin(response.bytes_stream()));

        let event_stream = stream! {
            let mut mapper = ChunkMapper::new();

            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(SseFrame::Chunk(chunk)) => {
                        for event in mapper.map_chunk(chunk) {
                            yield Ok(event);
                        }
                    }
                    Ok(SseFrame::Done) => break,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            for event in mapper.finish() {
                yield Ok(event);
            }
        };

        Ok(Box::pin(event_stream))
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}

/// Turn a non-success response into an error
pub fn classify_error(status: StatusCode, headers: &HeaderMap, body: &str) -> LlmError {
    let api_error = serde_json::from_str::<ApiErrorBody>(body).ok();
    let message = api_error
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationError(
            format!("invalid API credentials (status {}): {}", status.as_u16(), message),
        ),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded {
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        _ if status.is_server_error() => LlmError::HttpError {
            status: status.as_u16(),
            body: message,
        },
        _ => match api_error {
            Some(api_error) => LlmError::ProviderError {
                code: api_error.error.code(),
                message,
            },
            None => LlmError::HttpError {
                status: status.as_u16(),
                body: message,
            },
        },
    }
}
