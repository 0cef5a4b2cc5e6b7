//! Application configuration
//!
//! Read once at startup from the process environment (after `.env` has been
//! loaded by the binary).

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::{GenerationConfig, OpenAiConfig};
use crate::weather::client::{WeatherConfig, DEFAULT_BASE_URL as DEFAULT_WEATHER_URL};

/// Keys that must be present and non-empty, in reporting order
pub const REQUIRED_KEYS: [&str; 3] = ["API_KEY", "BASE_URL", "MODEL"];

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are WeaTrip, a friendly assistant for weather \
questions and travel planning. Use the get_weather tool for current conditions and the \
get_forecast tool for forecasts of up to 5 days instead of guessing. When a city name is \
ambiguous, pass the ISO country code. Answer in the language the user writes in, keep \
answers concise and give practical travel advice (clothing, umbrella, outdoor plans) when \
it helps.";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    pub web_dir: String,
    /// Empty means any origin
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub generation: GenerationConfig,
    pub system_prompt: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: OpenAiConfig,
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub weather: WeatherConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let llm = OpenAiConfig::new(
            get("API_KEY").unwrap_or_default(),
            get("BASE_URL").unwrap_or_default(),
            get("MODEL").unwrap_or_default(),
        )
        .with_max_retries(parse_or(&get, "LLM_MAX_RETRIES", 2)?)
        .with_request_timeout(Duration::from_secs(parse_or(
            &get,
            "REQUEST_TIMEOUT_SECS",
            120,
        )?));

        let server = ServerSettings {
            host: parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&get, "PORT", 8000)?,
            web_dir: get("WEB_DIR").unwrap_or_else(|| "web".to_string()),
            cors_allowed_origins: parse_origins(get("CORS_ALLOWED_ORIGINS").as_deref()),
        };

        let mut generation = GenerationConfig::new(parse_or(&get, "MAX_TOKENS", 2048)?);
        if let Some(temperature) = parse_opt::<f32, _>(&get, "TEMPERATURE")? {
            generation = generation.with_temperature(temperature);
        }

        let max_iterations: usize = parse_or(&get, "AGENT_MAX_ITERATIONS", 10)?;
        if max_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "AGENT_MAX_ITERATIONS",
                value: "0".to_string(),
            });
        }

        let agent = AgentSettings {
            max_iterations,
            generation,
            system_prompt: get("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        let weather = WeatherConfig::new(get("OPENWEATHER_API_KEY"))
            .with_base_url(get("OPENWEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()))
            .with_lang(get("WEATHER_LANG").unwrap_or_else(|| "en".to_string()));

        Ok(Self {
            llm,
            server,
            agent,
            weather,
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(None),
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or("*")
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}
