use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Timeline document returned by the forecast provider.
///
/// Only the fields the service reads are modelled; everything else in the
/// provider payload is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDocument {
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_address: String,
    pub address: String,
    #[serde(default)]
    pub timezone: Option<String>,
    pub days: Vec<DayRecord>,
}

impl ForecastDocument {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub datetime: Option<NaiveDate>,
    pub tempmax: f64,
    pub tempmin: f64,
    pub humidity: f64,
}

/// Client-facing projection of a forecast plus its resolved country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSummary {
    #[serde(rename = "resolvedAddress")]
    pub resolved_address: String,
    pub address: String,
    pub days_day: Vec<f64>,
    pub days_night: Vec<f64>,
    pub humidity: Vec<f64>,
    pub country: Option<String>,
}

/// One persisted daily summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub temp: f64,
}

/// Payload sent by the client when it asks to keep a summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub daily_weather: Vec<DailyWeather>,
}

/// The part of a previously returned summary needed for persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyWeather {
    #[serde(default)]
    pub days_day: Vec<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("No data provided")]
    NoData,

    #[error("Invalid weather data: {0}")]
    Invalid(String),

    #[error("No daily weather data available")]
    NoDailyWeather,
}

impl StoreRequest {
    /// Parse a request body. An empty body, `null` or `{}` carries no data.
    pub fn from_json(body: &[u8]) -> Result<Self, RecordError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(RecordError::NoData);
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|e| RecordError::Invalid(e.to_string()))?;
        match &value {
            Value::Null => return Err(RecordError::NoData),
            Value::Object(fields) if fields.is_empty() => return Err(RecordError::NoData),
            _ => {}
        }

        serde_json::from_value(value).map_err(|e| RecordError::Invalid(e.to_string()))
    }

    /// Today's maximum temperature is the first day of the first summary.
    pub fn into_record(self) -> Result<WeatherRecord, RecordError> {
        let temp = self
            .daily_weather
            .first()
            .and_then(|daily| daily.days_day.first())
            .copied()
            .ok_or(RecordError::NoDailyWeather)?;

        Ok(WeatherRecord {
            city: self.city.unwrap_or_default(),
            country: self.country,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            temp,
        })
    }
}
