// GET /api/health and GET /api/status handlers

use std::convert::Infallible;

use super::NOT_INITIALIZED;
use crate::models::{HealthResponse, ServiceStatus, StatusResponse};
use crate::state::AppState;

pub async fn health_handler(state: AppState) -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&HealthResponse {
        status: "healthy".to_string(),
        agent_ready: state.agent_ready(),
        message: "WeaTrip chat server is running".to_string(),
    }))
}

pub async fn status_handler(state: AppState) -> Result<impl warp::Reply, Infallible> {
    let response = match &state.chat {
        Some(chat) => StatusResponse {
            status: ServiceStatus::Ready,
            message: format!(
                "chat service is ready (tools: {})",
                chat.tool_names().join(", ")
            ),
        },
        None => StatusResponse {
            status: ServiceStatus::NotReady,
            message: NOT_INITIALIZED.to_string(),
        },
    };

    Ok(warp::reply::json(&response))
}
