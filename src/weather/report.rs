//! Weather reports returned to the model

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use super::types::{Condition, CurrentResponse, ForecastSlot};

/// Current conditions for a city
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentWeather {
    pub city: String,
    pub country: Option<String>,
    pub description: String,
    /// °C
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// %
    pub humidity: u8,
    /// hPa
    pub pressure: f64,
    /// m/s
    pub wind_speed: f64,
    /// City-local time of the observation, `YYYY-MM-DD HH:MM`
    pub observed_at: String,
}

impl From<CurrentResponse> for CurrentWeather {
    fn from(response: CurrentResponse) -> Self {
        let offset = utc_offset(response.timezone);
        let observed_at = to_local(response.dt, offset)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        Self {
            city: response.name,
            country: response.sys.country,
            description: describe(&response.weather),
            temperature: round1(response.main.temp),
            feels_like: round1(response.main.feels_like),
            temp_min: round1(response.main.temp_min),
            temp_max: round1(response.main.temp_max),
            humidity: percent(response.main.humidity),
            pressure: response.main.pressure,
            wind_speed: round1(response.wind.speed),
            observed_at,
        }
    }
}

/// Daily forecast for a city
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Forecast {
    pub city: String,
    pub country: Option<String>,
    pub days: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyForecast {
    /// City-local calendar date
    pub date: NaiveDate,
    /// Most frequent condition of the day
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Highest precipitation probability of the day, %
    pub precipitation_chance: u8,
    /// Average humidity, %
    pub humidity: u8,
}

struct DayAccumulator {
    date: NaiveDate,
    temp_min: f64,
    temp_max: f64,
    max_pop: f64,
    humidity_sum: f64,
    slots: usize,
    descriptions: Vec<(String, usize)>,
}

impl DayAccumulator {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            max_pop: 0.0,
            humidity_sum: 0.0,
            slots: 0,
            descriptions: Vec::new(),
        }
    }

    fn add(&mut self, slot: &ForecastSlot) {
        self.temp_min = self.temp_min.min(slot.main.temp_min.min(slot.main.temp));
        self.temp_max = self.temp_max.max(slot.main.temp_max.max(slot.main.temp));
        self.max_pop = self.max_pop.max(slot.pop);
        self.humidity_sum += slot.main.humidity;
        self.slots += 1;

        let description = describe(&slot.weather);
        match self.descriptions.iter_mut().find(|(d, _)| *d == description) {
            Some((_, count)) => *count += 1,
            None => self.descriptions.push((description, 1)),
        }
    }

    fn finish(self) -> DailyForecast {
        // Strict comparison keeps the earliest description on ties
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.descriptions {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }

        DailyForecast {
            date: self.date,
            description: best.map(|(d, _)| d.clone()).unwrap_or_default(),
            temp_min: round1(self.temp_min),
            temp_max: round1(self.temp_max),
            precipitation_chance: percent(self.max_pop * 100.0),
            humidity: percent(self.humidity_sum / self.slots.max(1) as f64),
        }
    }
}

/// Group 3-hour slots into at most `days` city-local calendar days
///
/// Days keep the order in which they first appear in `slots`.
pub fn summarize_forecast(
    slots: &[ForecastSlot],
    utc_offset_secs: i32,
    days: usize,
) -> Vec<DailyForecast> {
    let offset = utc_offset(utc_offset_secs);
    let mut accumulators: Vec<DayAccumulator> = Vec::new();

    for slot in slots {
        let Some(local) = to_local(slot.dt, offset) else {
            continue;
        };
        let date = local.date_naive();

        match accumulators.iter_mut().find(|a| a.date == date) {
            Some(acc) => acc.add(slot),
            None => {
                if accumulators.len() == days {
                    continue;
                }
                let mut acc = DayAccumulator::new(date);
                acc.add(slot);
                accumulators.push(acc);
            }
        }
    }

    accumulators.into_iter().map(DayAccumulator::finish).collect()
}

fn utc_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

fn to_local(timestamp: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(timestamp, 0).map(|t| t.with_timezone(&offset))
}

fn describe(conditions: &[Condition]) -> String {
    conditions
        .first()
        .map(|c| {
            if c.description.is_empty() {
                c.main.clone()
            } else {
                c.description.clone()
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::types::MainReadings;

    fn slot(dt: i64, temp: f64, pop: f64, humidity: f64, description: &str) -> ForecastSlot {
        ForecastSlot {
            dt,
            main: MainReadings {
                temp,
                feels_like: temp,
                temp_min: temp,
                temp_max: temp,
                pressure: 1012.0,
                humidity,
            },
            weather: vec![Condition {
                main: String::new(),
                description: description.to_string(),
            }],
            pop,
        }
    }

    // 2024-05-01 00:00:00 UTC
    const MAY_1: i64 = 1_714_521_600;
    const HOUR: i64 = 3600;

    #[test]
    fn test_groups_by_local_day() {
        // UTC+8: 18:00 UTC on May 1 is already May 2 locally
        let slots = vec![
            slot(MAY_1, 18.0, 0.0, 40.0, "clear sky"),
            slot(MAY_1 + 3 * HOUR, 24.0, 0.2, 60.0, "clear sky"),
            slot(MAY_1 + 18 * HOUR, 15.0, 0.7, 80.0, "light rain"),
        ];

        let days = summarize_forecast(&slots, 8 * 3600, 5);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].temp_min, 18.0);
        assert_eq!(days[0].temp_max, 24.0);
        assert_eq!(days[0].precipitation_chance, 20);
        assert_eq!(days[0].humidity, 50);
        assert_eq!(days[0].description, "clear sky");
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(days[1].precipitation_chance, 70);
    }

    #[test]
    fn test_limits_number_of_days() {
        let slots: Vec<_> = (0..40)
            .map(|i| slot(MAY_1 + i * 3 * HOUR, 20.0, 0.0, 50.0, "clouds"))
            .collect();

        let days = summarize_forecast(&slots, 0, 3);

        assert_eq!(days.len(), 3);
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn test_description_tie_keeps_earliest() {
        let slots = vec![
            slot(MAY_1, 20.0, 0.0, 50.0, "few clouds"),
            slot(MAY_1 + 3 * HOUR, 20.0, 0.0, 50.0, "light rain"),
            slot(MAY_1 + 6 * HOUR, 20.0, 0.0, 50.0, "light rain"),
            slot(MAY_1 + 9 * HOUR, 20.0, 0.0, 50.0, "few clouds"),
        ];

        let days = summarize_forecast(&slots, 0, 1);

        assert_eq!(days[0].description, "few clouds");
    }

    #[test]
    fn test_current_weather_conversion() {
        let response: CurrentResponse = serde_json::from_value(serde_json::json!({
            "name": "Beijing",
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "main": {"temp": 21.34, "feels_like": 20.81, "temp_min": 20.0, "temp_max": 22.0,
                     "pressure": 1012, "humidity": 40},
            "wind": {"speed": 3.14},
            "dt": MAY_1,
            "sys": {"country": "CN"},
            "timezone": 28800
        }))
        .unwrap();

        let current = CurrentWeather::from(response);

        assert_eq!(current.city, "Beijing");
        assert_eq!(current.country.as_deref(), Some("CN"));
        assert_eq!(current.description, "clear sky");
        assert_eq!(current.temperature, 21.3);
        assert_eq!(current.wind_speed, 3.1);
        assert_eq!(current.humidity, 40);
        assert_eq!(current.observed_at, "2024-05-01 08:00");
    }

    #[test]
    fn test_describe_falls_back_to_main() {
        let conditions = vec![Condition {
            main: "Rain".to_string(),
            description: String::new(),
        }];
        assert_eq!(describe(&conditions), "Rain");
        assert_eq!(describe(&[]), "unknown");
    }
}
