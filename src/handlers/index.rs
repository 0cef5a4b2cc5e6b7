// GET / handler

use std::convert::Infallible;

use tracing::warn;
use warp::http::StatusCode;
use warp::Reply;

use crate::models::ErrorBody;
use crate::state::AppState;

pub async fn index_handler(state: AppState) -> Result<warp::reply::Response, Infallible> {
    let path = state.web_dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(warp::reply::html(html).into_response()),
        Err(e) => {
            warn!(path = %path.display(), "Cannot read front-end page: {}", e);
            let body = ErrorBody {
                detail: "index.html not found".to_string(),
            };
            Ok(warp::reply::with_status(warp::reply::json(&body), StatusCode::NOT_FOUND)
                .into_response())
        }
    }
}
