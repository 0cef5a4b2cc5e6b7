//! OpenAI-compatible provider implementation
//!
//! Streams chat completions from any endpoint that speaks the OpenAI
//! `/chat/completions` protocol (DeepSeek, OpenAI, vLLM, Ollama, ...).

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{OpenAiClient, OpenAiConfig};
