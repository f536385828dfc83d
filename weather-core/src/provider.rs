use crate::{
    Config, ForecastDocument,
    provider::visualcrossing::{ProviderSettings, VisualCrossingProvider},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

pub mod visualcrossing;

/// Why a forecast could not be obtained.
///
/// Callers facing clients collapse every variant into "not found"; the
/// variants exist so logs can tell them apart.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("city name is empty")]
    EmptyCity,

    #[error("forecast provider answered with status {0}")]
    Status(StatusCode),

    #[error("forecast provider request failed")]
    Transport(#[source] reqwest::Error),

    #[error("forecast provider returned an unexpected document")]
    Malformed(#[source] serde_json::Error),
}

#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Fetch the daily forecast for a free-text city name.
    async fn fetch(&self, city: &str) -> Result<ForecastDocument, FetchError>;
}

/// Construct the forecast provider described by the config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let settings = ProviderSettings {
        base_url: config.provider.base_url.clone(),
        api_key: config.api_key()?.to_owned(),
        timeout: config.provider.timeout(),
    };

    Ok(Box::new(VisualCrossingProvider::new(settings)?))
}
