//! OpenWeatherMap response types
//!
//! Only the fields used for reports are modelled.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    pub dt: i64,
    #[serde(default)]
    pub sys: Sys,
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastSlot>,
    pub city: ForecastCity,
}

/// One 3-hour forecast slot
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastSlot {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    /// Probability of precipitation, 0.0-1.0
    #[serde(default)]
    pub pop: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: i32,
}

/// Error body, e.g. `{"cod":"404","message":"city not found"}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}
