//! Core library for the weather service.
//!
//! This crate defines:
//! - Configuration & provider credentials
//! - The forecast provider abstraction
//! - Country resolution from a boundary shapefile
//! - The client-facing summary and its persistence
//!
//! It is used by `weather-server`, but can also be reused by other binaries.

pub mod config;
pub mod countries;
pub mod filter;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod store;

pub use config::{Config, ProviderConfig};
pub use countries::{CountryIndex, CountryPolygon, GeoIndexError};
pub use filter::filter;
pub use model::{
    Coordinate, DayRecord, FilteredSummary, ForecastDocument, RecordError, StoreRequest,
    WeatherRecord,
};
pub use provider::{
    FetchError, WeatherSource, provider_from_config,
    visualcrossing::{ProviderSettings, VisualCrossingProvider},
};
pub use resolver::{Resolved, resolve};
pub use service::{LookupError, WeatherService};
pub use store::{JsonLinesStore, MemoryStore, StoreError, WeatherStore};
