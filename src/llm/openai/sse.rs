//! Server-Sent Events (SSE) parser for chat-completion streams

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::{ApiErrorBody, ChatCompletionChunk};

/// A decoded `data:` payload
#[derive(Debug, Clone)]
pub enum SseFrame {
    Chunk(ChatCompletionChunk),
    /// The `data: [DONE]` terminator
    Done,
}

/// Parse a stream of bytes as chat-completion SSE frames
///
/// The stream is line oriented (`data: <json>`). Bytes are buffered until a
/// full line is available, so multi-byte characters split across network
/// chunks decode correctly. Comment lines (`: keep-alive`) and other fields
/// are ignored.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<SseFrame, LlmError>> + Send>> {
    let mut buffer: Vec<u8> = Vec::new();

    let frame_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut frames = Vec::new();
        while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
            let line = match std::str::from_utf8(&line) {
                Ok(line) => line.trim(),
                Err(e) => {
                    frames.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(frame) = parse_line(line) {
                frames.push(frame);
            }
        }

        futures::stream::iter(frames)
    });

    Box::pin(frame_stream)
}

/// Parse a single trimmed SSE line
fn parse_line(line: &str) -> Option<Result<SseFrame, LlmError>> {
    let data = line.strip_prefix("data:")?.trim();

    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Ok(SseFrame::Done));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) if !chunk.choices.is_empty() || chunk.usage.is_some() => {
            Some(Ok(SseFrame::Chunk(chunk)))
        }
        parsed => {
            if let Ok(body) = serde_json::from_str::<ApiErrorBody>(data) {
                return Some(Err(LlmError::ProviderError {
                    code: body.error.code(),
                    message: body.error.message,
                }));
            }
            match parsed {
                Ok(chunk) => Some(Ok(SseFrame::Chunk(chunk))),
                Err(e) => Some(Err(LlmError::SerializationError(format!(
                    "Failed to parse SSE data: {}. Data: {}",
                    e, data
                )))),
            }
        }
    }
}
