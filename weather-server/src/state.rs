use std::sync::Arc;

use anyhow::Context;
use weather_core::{
    Config, CountryIndex, JsonLinesStore, WeatherService, WeatherStore, provider_from_config,
};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: WeatherService,
    pub store: Arc<dyn WeatherStore>,
}

impl AppState {
    /// Fails if the country boundaries cannot be loaded or no API key is set.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let index = CountryIndex::load(&config.countries_path, &config.country_field)
            .context("Cannot start without country boundaries")?;
        let source = provider_from_config(config)?;

        Ok(Self {
            service: WeatherService::new(Arc::from(source), Arc::new(index)),
            store: Arc::new(JsonLinesStore::new(config.store_path.clone())),
        })
    }
}
