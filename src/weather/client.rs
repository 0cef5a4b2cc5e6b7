//! OpenWeatherMap-compatible HTTP client

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::WeatherError;
use super::report::{summarize_forecast, CurrentWeather, Forecast};
use super::types::{CurrentResponse, ErrorResponse, ForecastResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_FORECAST_DAYS: u8 = 3;
pub const MAX_FORECAST_DAYS: u8 = 5;

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Without a key every lookup fails with `NotConfigured`
    pub api_key: Option<String>,
    pub base_url: String,
    /// Language of condition descriptions, e.g. `en` or `zh_cn`
    pub lang: String,
}

impl WeatherConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: "en".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

pub struct WeatherClient {
    http_client: Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Current conditions for `city`, optionally narrowed by ISO country code
    pub async fn current(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<CurrentWeather, WeatherError> {
        let query = location_query(city, country)?;
        let response: CurrentResponse = self.get("weather", &query).await?;
        Ok(CurrentWeather::from(response))
    }

    /// Daily forecast for `city`
    ///
    /// `days` is clamped to 1..=5 and defaults to 3.
    pub async fn forecast(
        &self,
        city: &str,
        country: Option<&str>,
        days: Option<u8>,
    ) -> Result<Forecast, WeatherError> {
        let query = location_query(city, country)?;
        let days = days
            .unwrap_or(DEFAULT_FORECAST_DAYS)
            .clamp(1, MAX_FORECAST_DAYS);

        let response: ForecastResponse = self.get("forecast", &query).await?;
        let daily = summarize_forecast(&response.list, response.city.timezone, days as usize);

        Ok(Forecast {
            city: response.city.name,
            country: response.city.country,
            days: daily,
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &str) -> Result<T, WeatherError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(WeatherError::NotConfigured)?;
        let url = format!(
            "{}/{}",
            self.config.base_url.trim().trim_end_matches('/'),
            endpoint
        );

        debug!(endpoint, query, "Weather request");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", query),
                ("units", "metric"),
                ("lang", self.config.lang.as_str()),
                ("appid", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body, query));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }
}

fn location_query(city: &str, country: Option<&str>) -> Result<String, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::InvalidArgument(
            "city must not be empty".to_string(),
        ));
    }

    Ok(match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(country) => format!("{},{}", city, country),
        None => city.to_string(),
    })
}

fn classify_error(status: StatusCode, body: &str, query: &str) -> WeatherError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::NOT_FOUND => WeatherError::CityNotFound(query.to_string()),
        StatusCode::UNAUTHORIZED => WeatherError::Unauthorized(message),
        _ => WeatherError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_query() {
        assert_eq!(location_query("Beijing", Some("CN")).unwrap(), "Beijing,CN");
        assert_eq!(location_query(" Paris ", None).unwrap(), "Paris");
        assert_eq!(location_query("Paris", Some("  ")).unwrap(), "Paris");
        assert!(matches!(
            location_query("  ", None),
            Err(WeatherError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_classify_error() {
        let err = classify_error(
            StatusCode::NOT_FOUND,
            r#"{"cod":"404","message":"city not found"}"#,
            "Atlantis",
        );
        assert!(matches!(err, WeatherError::CityNotFound(q) if q == "Atlantis"));

        let err = classify_error(
            StatusCode::UNAUTHORIZED,
            r#"{"cod":401,"message":"Invalid API key"}"#,
            "Beijing",
        );
        assert!(matches!(err, WeatherError::Unauthorized(m) if m == "Invalid API key"));

        let err = classify_error(StatusCode::BAD_GATEWAY, "upstream down", "Beijing");
        assert!(matches!(err, WeatherError::Http { status: 502, message } if message == "upstream down"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = WeatherClient::new(WeatherConfig::new(Some("   ".to_string()))).unwrap();
        assert!(!client.is_configured());

        let err = client.current("Beijing", None).await.unwrap_err();
        assert!(matches!(err, WeatherError::NotConfigured));
    }
}
