// Route definitions and rejection handling

use std::convert::Infallible;

use tracing::error;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::handlers;
use crate::models::{ChatRequest, ErrorBody};
use crate::state::AppState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn chat_body() -> impl Filter<Extract = (ChatRequest,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Build the route table
///
/// `cors_origins` empty means any origin is allowed.
pub fn configure_routes(
    state: AppState,
    cors_origins: &[String],
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let api = warp::path("api");

    // GET /
    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::index_handler);

    // POST /api/chat
    let chat = api
        .and(warp::path("chat"))
        .and(warp::path::end())
        .and(warp::post())
        .and(chat_body())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_handler);

    // POST /api/chat/stream
    let chat_stream = api
        .and(warp::path!("chat" / "stream"))
        .and(warp::post())
        .and(chat_body())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_stream_handler);

    // GET /api/health
    let health = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::health_handler);

    // GET /api/status
    let status = api
        .and(warp::path("status"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::status_handler);

    index
        .or(chat)
        .or(chat_stream)
        .or(health)
        .or(status)
        .recover(handle_rejection)
        // CORS wraps the JSON error replies too; its own refusals are recovered last
        .with(cors(cors_origins))
        .recover(handle_rejection)
}

fn cors(origins: &[String]) -> warp::cors::Cors {
    let builder = warp::cors()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization", "accept"]);

    if origins.is_empty() {
        builder.allow_any_origin().build()
    } else {
        builder
            .allow_origins(origins.iter().map(String::as_str))
            .build()
    }
}

/// Turn rejections into JSON `{"detail": ...}` bodies
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {} bytes", MAX_BODY_BYTES),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "Content-Length header is required".to_string(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "Request body must be JSON".to_string(),
        )
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { detail }),
        status,
    ))
}
