use thiserror::Error;

/// Errors returned by the weather client
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather service is not configured (set OPENWEATHER_API_KEY)")]
    NotConfigured,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Weather service rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Weather service error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode weather response: {0}")]
    Decode(String),
}
