use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    countries::CountryIndex,
    filter::filter,
    model::FilteredSummary,
    provider::{FetchError, WeatherSource},
    resolver::resolve,
};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("city name is empty")]
    EmptyCity,

    #[error("forecast unavailable")]
    Upstream(#[source] FetchError),

    #[error("forecast document malformed")]
    Malformed(#[source] FetchError),
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::EmptyCity => LookupError::EmptyCity,
            FetchError::Malformed(_) => LookupError::Malformed(err),
            FetchError::Status(_) | FetchError::Transport(_) => LookupError::Upstream(err),
        }
    }
}

/// Fetch, resolve the country, filter. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    index: Arc<CountryIndex>,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, index: Arc<CountryIndex>) -> Self {
        Self { source, index }
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, city: &str) -> Result<FilteredSummary, LookupError> {
        let document = self.source.fetch(city).await.map_err(|err| {
            let err = LookupError::from(err);
            warn!(error = %err, "lookup failed");
            err
        })?;

        let resolved = resolve(&self.index, document);
        let summary = filter(&resolved);

        info!(
            resolved = %summary.resolved_address,
            country = summary.country.as_deref(),
            days = summary.days_day.len(),
            "lookup complete"
        );
        Ok(summary)
    }
}
