//! LLM Abstraction Layer
//!
//! A provider-neutral streaming interface, an OpenAI-compatible provider,
//! a tool registry and the agent loop that ties them together.

pub mod agent;
pub mod core;
pub mod openai;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentError, AgentEvent};
pub use self::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider},
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageRole, StreamEvent, ToolDeclaration, UsageMetadata,
    },
};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use tools::{create_tool_declaration, FunctionRegistry, RegistryError, ToolExecutor};
