use anyhow::Context;
use dotenvy::dotenv;

use weatrip::config::{AppConfig, ConfigError};
use weatrip::server::{self, ServerError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing with RUST_LOG env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // 2. Load environment variables
    dotenv().ok();

    // 3. Load configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVars(missing)) => {
            eprintln!("Missing required environment variables:");
            for key in missing {
                eprintln!("   - {}", key);
            }
            eprintln!("\nCreate a .env file (see .env.example) and set these variables");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // 4. Run server
    match server::run(config).await {
        Err(ServerError::PortInUse(port)) => {
            eprintln!("Port {} is already in use.", port);
            eprintln!("Stop the other process or set PORT in .env to a free port.");
            std::process::exit(1);
        }
        result => result.context("server failed"),
    }
}
