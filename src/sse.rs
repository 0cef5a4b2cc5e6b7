use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;
use warp::sse::Event;

use crate::llm::{AgentError, AgentEvent, ContentBlockStart, ContentDelta, StreamEvent};
use crate::models::{AgentTextChunk, StreamErrorEvent, ToolCallEvent, ToolResponseEvent};

/// One server-sent event: name plus JSON payload
#[derive(Debug, Clone, PartialEq)]
pub struct SseMessage {
    pub event: &'static str,
    pub data: Value,
}

impl SseMessage {
    fn new(event: &'static str, payload: impl Serialize) -> Self {
        Self {
            event,
            data: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }

    pub fn agent_text(id: String, chunk: String) -> Self {
        Self::new("agent_text", AgentTextChunk { id, chunk })
    }

    pub fn tool_call(id: String, tool_name: String, arguments: Value) -> Self {
        Self::new(
            "tool_call",
            ToolCallEvent {
                id,
                tool_name,
                arguments,
            },
        )
    }

    pub fn tool_response(id: String, tool_call_id: String, result: Value) -> Self {
        Self::new(
            "tool_response",
            ToolResponseEvent {
                id,
                tool_call_id,
                result,
            },
        )
    }

    pub fn error(message: String) -> Self {
        Self::new("error", StreamErrorEvent { message })
    }

    /// Signals stream completion
    pub fn done() -> Self {
        Self::new("done", serde_json::json!({}))
    }

    pub fn into_event(self) -> Event {
        Event::default().event(self.event).data(self.data.to_string())
    }
}

/// Turns agent events into client-facing SSE messages
///
/// All text chunks of one LLM iteration share an id, so the client can
/// render them as a single message.
#[derive(Debug, Default)]
pub struct SseEncoder {
    text_id: Option<String>,
}

impl SseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, item: Result<AgentEvent, AgentError>) -> Vec<SseMessage> {
        let event = match item {
            Ok(event) => event,
            Err(e) => return vec![SseMessage::error(e.to_string()), SseMessage::done()],
        };

        match event {
            AgentEvent::IterationStarted { .. } => {
                self.text_id = Some(new_id());
                Vec::new()
            }
            AgentEvent::LlmEvent(StreamEvent::ContentBlockStart {
                block: ContentBlockStart::Text { text },
                ..
            })
            | AgentEvent::LlmEvent(StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            }) => {
                if text.is_empty() {
                    return Vec::new();
                }
                let id = self.text_id.get_or_insert_with(new_id).clone();
                vec![SseMessage::agent_text(id, text)]
            }
            AgentEvent::LlmEvent(_) => Vec::new(),
            AgentEvent::ToolExecutionStarted {
                tool_use_id,
                name,
                input,
            } => vec![SseMessage::tool_call(tool_use_id, name, input)],
            AgentEvent::ToolExecutionCompleted {
                tool_use_id,
                result,
                ..
            } => {
                // Tool results are JSON text; fall back to a plain string
                let result = serde_json::from_str(&result).unwrap_or(Value::String(result));
                vec![SseMessage::tool_response(new_id(), tool_use_id, result)]
            }
            AgentEvent::ToolExecutionFailed {
                tool_use_id, error, ..
            } => vec![SseMessage::tool_response(
                new_id(),
                tool_use_id,
                serde_json::json!({ "error": error }),
            )],
            AgentEvent::Completed => vec![SseMessage::done()],
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
