use crate::llm::core::error::LlmError;

/// Errors that can occur during agent execution
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool arguments produced by the model are not valid JSON
    #[error("Failed to parse tool input: {0}")]
    ToolInputParse(#[from] serde_json::Error),

    /// The provider reported an error inside the stream
    #[error("Provider reported an error: {0}")]
    Provider(String),

    #[error("Maximum iterations reached ({0})")]
    MaxIterationsReached(usize),

    /// The model finished without producing any text
    #[error("Model returned an empty response")]
    EmptyResponse,
}
