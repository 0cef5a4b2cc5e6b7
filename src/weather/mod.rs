//! Weather lookups and the tools built on them

pub mod client;
pub mod error;
pub mod report;
pub mod tools;
pub mod types;

pub use client::{WeatherClient, WeatherConfig};
pub use error::WeatherError;
pub use report::{CurrentWeather, DailyForecast, Forecast};
pub use tools::{register_weather_tools, GET_FORECAST, GET_WEATHER};
