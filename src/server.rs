//! Server startup and shutdown

use std::io;
use std::net::{SocketAddr, TcpListener};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::routes::configure_routes;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Port {0} is already in use")]
    PortInUse(u16),

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Check that `addr` can be bound before handing it to warp
pub fn check_port(addr: SocketAddr) -> Result<(), ServerError> {
    match TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(ServerError::PortInUse(addr.port())),
        Err(source) => Err(ServerError::Bind { addr, source }),
    }
}

/// Build the chat service, or `None` if any part of it cannot be set up
pub fn init_chat(config: &AppConfig) -> Option<ChatService> {
    info!("Initializing chat service");
    match ChatService::from_config(config) {
        Ok(chat) => Some(chat),
        Err(e) => {
            error!("Chat service initialization failed: {}", e);
            warn!("Starting without a chat service, /api/chat will report an error");
            None
        }
    }
}

/// Serve until Ctrl-C
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let state = AppState::new(init_chat(&config), &config.server.web_dir);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    check_port(addr)?;

    let routes = configure_routes(state, &config.server.cors_allowed_origins);

    info!("Starting server on http://{}", addr);
    info!("Front-end: http://localhost:{}", config.server.port);

    tokio::select! {
        _ = warp::serve(routes).run(addr) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down");
        }
    }

    Ok(())
}
