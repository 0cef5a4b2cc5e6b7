//! Tool executor trait

use async_trait::async_trait;

/// Trait for executing tool calls from the LLM
///
/// Results and errors are both plain strings because they are fed back to
/// the model verbatim.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool call
    ///
    /// * `Ok(String)` - result, usually JSON
    /// * `Err(String)` - message describing what went wrong
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String>;
}
