// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

// Request Types
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// Response Types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn ok(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(reply: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub agent_ready: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Ready,
    NotReady,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: ServiceStatus,
    pub message: String,
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
}

// SSE Event Types
#[derive(Debug, Clone, Serialize)]
pub struct AgentTextChunk {
    pub id: String,
    pub chunk: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallEvent {
    pub id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponseEvent {
    pub id: String,
    pub tool_call_id: String,
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamErrorEvent {
    pub message: String,
}
