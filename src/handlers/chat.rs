// POST /api/chat and POST /api/chat/stream handlers

use std::convert::Infallible;

use futures_util::stream::{self, StreamExt};
use tracing::{error, info};
use warp::http::StatusCode;
use warp::Reply;

use super::NOT_INITIALIZED;
use crate::models::{ChatRequest, ChatResponse};
use crate::sse::SseEncoder;
use crate::state::AppState;

const NOT_READY_REPLY: &str = "The server is not ready yet, please try again later.";
const FAILED_REPLY: &str = "Sorry, something went wrong while processing your request. Please try again later.";
const BLANK_REPLY: &str = "Please enter a message.";

fn failure(status: StatusCode, reply: &str, error: impl Into<String>) -> warp::reply::Response {
    warp::reply::with_status(
        warp::reply::json(&ChatResponse::failed(reply, error)),
        status,
    )
    .into_response()
}

pub async fn chat_handler(
    request: ChatRequest,
    state: AppState,
) -> Result<warp::reply::Response, Infallible> {
    let Some(chat) = state.chat else {
        return Ok(failure(StatusCode::OK, NOT_READY_REPLY, NOT_INITIALIZED));
    };

    let message = request.message.trim();
    if message.is_empty() {
        return Ok(failure(
            StatusCode::BAD_REQUEST,
            BLANK_REPLY,
            "message must not be empty",
        ));
    }

    info!(message_len = message.len(), "POST /api/chat");

    match chat.reply(message).await {
        Ok(reply) => Ok(warp::reply::json(&ChatResponse::ok(reply)).into_response()),
        Err(e) => {
            let error_msg = format!("Error while processing request: {}", e);
            error!("{}", error_msg);
            Ok(failure(StatusCode::OK, FAILED_REPLY, error_msg))
        }
    }
}

pub async fn chat_stream_handler(
    request: ChatRequest,
    state: AppState,
) -> Result<warp::reply::Response, Infallible> {
    let Some(chat) = state.chat else {
        return Ok(failure(
            StatusCode::SERVICE_UNAVAILABLE,
            NOT_READY_REPLY,
            NOT_INITIALIZED,
        ));
    };

    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Ok(failure(
            StatusCode::BAD_REQUEST,
            BLANK_REPLY,
            "message must not be empty",
        ));
    }

    info!(message_len = message.len(), "POST /api/chat/stream");

    let mut encoder = SseEncoder::new();
    let events = chat.stream(message).flat_map(move |item| {
        stream::iter(
            encoder
                .encode(item)
                .into_iter()
                .map(|m| Ok::<_, Infallible>(m.into_event())),
        )
    });

    Ok(warp::sse::reply(warp::sse::keep_alive().stream(events)).into_response())
}
