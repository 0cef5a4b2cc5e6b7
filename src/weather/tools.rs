//! Weather tools exposed to the model

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::client::WeatherClient;
use crate::llm::{create_tool_declaration, FunctionRegistry, RegistryError};

pub const GET_WEATHER: &str = "get_weather";
pub const GET_FORECAST: &str = "get_forecast";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetWeatherArgs {
    /// City name, e.g. "Beijing" or "Paris"
    pub city: String,
    /// Optional ISO 3166 country code, e.g. "CN"
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetForecastArgs {
    /// City name, e.g. "Shanghai"
    pub city: String,
    /// Optional ISO 3166 country code, e.g. "CN"
    #[serde(default)]
    pub country: Option<String>,
    /// Number of days to forecast, 1 to 5 (default 3)
    #[serde(default)]
    pub days: Option<u8>,
}

/// Register `get_weather` and `get_forecast` backed by `client`
pub fn register_weather_tools(
    registry: &mut FunctionRegistry,
    client: Arc<WeatherClient>,
) -> Result<(), RegistryError> {
    let current_client = client.clone();
    registry.register_async_tool(
        move |args: GetWeatherArgs| {
            let client = current_client.clone();
            async move {
                client
                    .current(&args.city, args.country.as_deref())
                    .await
                    .map_err(|e| e.to_string())
            }
        },
        create_tool_declaration::<GetWeatherArgs>(
            GET_WEATHER,
            "Get the current weather for a city: conditions, temperature (°C), humidity, pressure and wind",
        ),
    )?;

    registry.register_async_tool(
        move |args: GetForecastArgs| {
            let client = client.clone();
            async move {
                client
                    .forecast(&args.city, args.country.as_deref(), args.days)
                    .await
                    .map_err(|e| e.to_string())
            }
        },
        create_tool_declaration::<GetForecastArgs>(
            GET_FORECAST,
            "Get a daily weather forecast for a city for up to 5 days: min/max temperature (°C), conditions, precipitation chance and humidity",
        ),
    )?;

    Ok(())
}
