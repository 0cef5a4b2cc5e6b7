//! Provider-neutral conversation and streaming types
//!
//! The agent keeps its history as [`Message`]s and consumes [`StreamEvent`]s;
//! the OpenAI-compatible mapper translates both to and from the wire format.

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;

/// One generation call: history, tools and sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// Tools the model may call; `None` or empty sends no `tools` field
    pub tools: Option<Vec<ToolDeclaration>>,
    pub config: GenerationConfig,
    /// Sent as a leading `system` message
    pub system: Option<String>,
}

/// A turn in the conversation
///
/// Assistant turns may mix text with tool calls. Tool turns carry one
/// result per call answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Assistant turn built from streamed text and the tool calls it requested
    ///
    /// Empty text is dropped so a pure tool-call turn holds only `ToolUse`
    /// blocks.
    pub fn assistant_turn(text: String, tool_uses: Vec<ContentBlock>) -> Self {
        let mut content = Vec::with_capacity(tool_uses.len() + 1);
        if !text.is_empty() {
            content.push(ContentBlock::Text { text });
        }
        content.extend(tool_uses);

        Self {
            role: MessageRole::Assistant,
            content,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error: false,
            }],
        }
    }

    /// Tool turn reporting a failed call back to the model
    pub fn tool_error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: error.into(),
                is_error: true,
            }],
        }
    }

    /// Concatenated text blocks of this message
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the model asked for at least one tool call in this turn
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person chatting
    User,
    /// The model, answering or requesting tools
    Assistant,
    /// Results of weather lookups and other tool calls
    Tool,
}

/// Content block within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// A call the model requested; `input` is the parsed arguments object
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Answer to the `ToolUse` with the same id
    ToolResult {
        tool_use_id: String,
        /// JSON-serialized tool output, or the error text
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A tool advertised to the model
///
/// Becomes a `{"type": "function", ...}` entry of the request's `tools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub input_schema: serde_json::Value,
}

/// Provider-neutral events of one streamed generation
///
/// A well-formed stream is `MessageStart`, any number of content blocks
/// (`ContentBlockStart`, `ContentDelta`*, `ContentBlockEnd`) and exactly one
/// `MessageEnd`. `Error` may replace everything after `MessageStart`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: MessageMetadata,
    },
    ContentBlockStart {
        index: usize,
        #[serde(rename = "content_block")]
        block: ContentBlockStart,
    },
    ContentDelta {
        index: usize,
        delta: ContentDelta,
    },
    ContentBlockEnd {
        index: usize,
    },
    /// Usage reported before the message is finished
    MessageDelta {
        usage: Option<UsageMetadata>,
    },
    MessageEnd {
        finish_reason: FinishReason,
        usage: UsageMetadata,
    },
    /// Error payload sent inside an otherwise successful stream
    Error {
        error: String,
    },
}

/// Identity of a streamed response, taken from the first chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Chunk `id`, or a generated one when the provider omits it
    pub id: String,
    pub role: MessageRole,
    pub usage: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockStart {
    Text { text: String },
    /// Opened by the first delta carrying a tool call index
    ToolUse { id: String, name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    ToolUseDelta { partial: PartialToolUse },
}

/// Fragment of a tool call's arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialToolUse {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Raw JSON text, concatenated across deltas
    pub partial_json: String,
}

/// Why the model stopped, normalised from the wire `finish_reason`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// `stop`: the answer is complete
    Stop,
    /// `length`: cut off at `max_tokens`
    MaxTokens,
    /// `tool_calls`: the agent has to run tools and call again
    ToolUse,
    /// `content_filter`
    Safety,
    /// Anything else, kept verbatim
    Other(String),
}

impl FinishReason {
    /// Map an OpenAI-style `finish_reason` string
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::MaxTokens,
            "tool_calls" | "function_call" => FinishReason::ToolUse,
            "content_filter" => FinishReason::Safety,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Token usage of one generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// `prompt_tokens` on the wire
    pub input_tokens: u32,
    /// `completion_tokens` on the wire
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl UsageMetadata {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
