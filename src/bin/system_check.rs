//! Checks configuration, weather lookups and the chat service end to end
//!
//! Exits 0 only when every check that ran passed.

use std::path::Path;

use dotenvy::dotenv;

use weatrip::chat::ChatService;
use weatrip::config::{AppConfig, ConfigError};
use weatrip::weather::WeatherClient;

const PLACEHOLDER_API_KEY: &str = "your_deepseek_api_key_here";

const SAMPLE_QUERIES: [&str; 3] = [
    "北京今天天气怎么样？",
    "上海未来3天天气预报",
    "给我一个简单的天气报告",
];

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(100).collect();
    if short.len() < text.len() {
        short.push_str("...");
    }
    short
}

fn check_config() -> Option<AppConfig> {
    println!("\n[1/3] Configuration");
    match AppConfig::from_env() {
        Ok(config) => {
            println!("  ok   model {} at {}", config.llm.model, config.llm.base_url);
            let index = Path::new(&config.server.web_dir).join("index.html");
            if !index.exists() {
                println!("  warn {} not found, GET / will return 404", index.display());
            }
            Some(config)
        }
        Err(ConfigError::MissingVars(missing)) => {
            println!("  FAIL missing environment variables:");
            for key in missing {
                println!("         - {}", key);
            }
            println!("       create a .env file (see .env.example)");
            None
        }
        Err(e) => {
            println!("  FAIL {}", e);
            None
        }
    }
}

async fn check_weather(config: &AppConfig) -> bool {
    println!("\n[2/3] Weather service");
    let client = match WeatherClient::new(config.weather.clone()) {
        Ok(client) => client,
        Err(e) => {
            println!("  FAIL {}", e);
            return false;
        }
    };

    if !client.is_configured() {
        println!("  skip OPENWEATHER_API_KEY is not set");
        return true;
    }

    let mut passed = true;

    match client.current("Beijing", Some("CN")).await {
        Ok(weather) => {
            let json = serde_json::to_string(&weather).unwrap_or_default();
            println!("  ok   current Beijing,CN: {}", preview(&json));
        }
        Err(e) => {
            println!("  FAIL current Beijing,CN: {}", e);
            passed = false;
        }
    }

    match client.forecast("Shanghai", Some("CN"), None).await {
        Ok(forecast) => {
            let json = serde_json::to_string(&forecast).unwrap_or_default();
            println!("  ok   forecast Shanghai,CN: {}", preview(&json));
        }
        Err(e) => {
            println!("  FAIL forecast Shanghai,CN: {}", e);
            passed = false;
        }
    }

    passed
}

async fn check_chat(config: &AppConfig) -> bool {
    println!("\n[3/3] Chat service");
    if config.llm.api_key == PLACEHOLDER_API_KEY {
        println!("  skip API_KEY is still the placeholder value");
        return true;
    }

    let chat = match ChatService::from_config(config) {
        Ok(chat) => chat,
        Err(e) => {
            println!("  FAIL {}", e);
            return false;
        }
    };

    for query in SAMPLE_QUERIES {
        println!("  query: {}", query);
        match chat.reply(query).await {
            Ok(reply) => println!("  ok   {}", preview(&reply)),
            Err(e) => {
                println!("  FAIL {}", e);
                return false;
            }
        }
    }

    true
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    dotenv().ok();

    println!("WeaTrip system check");
    println!("{}", "=".repeat(50));

    let passed = match check_config() {
        Some(config) => {
            let weather = check_weather(&config).await;
            let chat = check_chat(&config).await;
            weather && chat
        }
        None => false,
    };

    println!();
    if passed {
        println!("All checks passed. Start the server with `cargo run`.");
        std::process::exit(0);
    } else {
        println!("Some checks failed.");
        std::process::exit(1);
    }
}
