//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use super::{error::LlmError, types::{GenerateRequest, StreamEvent}};
use crate::llm::openai::{OpenAiClient, OpenAiConfig};

/// Boxed stream of generation events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream generate content from the LLM
    ///
    /// Errors returned here happen before any event was produced (connection,
    /// credentials, rate limits). Failures after that arrive inside the stream.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;
}

/// Create the shared provider for an OpenAI-compatible endpoint
///
/// # Example
///
/// ```rust,no_run
/// use weatrip::llm::{create_provider, OpenAiConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = create_provider(OpenAiConfig::new(
///     "sk-...",
///     "https://api.deepseek.com",
///     "deepseek-chat",
/// ))?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider(config: OpenAiConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = OpenAiClient::new(config)?;
    Ok(Arc::new(client))
}
