use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::model::ForecastDocument;

use super::{FetchError, WeatherSource};

/// Explicit inputs of the Visual Crossing timeline client.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Client for the Visual Crossing timeline API, metric units, daily rows only.
#[derive(Clone)]
pub struct VisualCrossingProvider {
    base_url: Url,
    api_key: String,
    http: Client,
}

// Keeps the key out of logs.
impl std::fmt::Debug for VisualCrossingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualCrossingProvider")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl VisualCrossingProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid provider base URL: {}", settings.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Provider base URL cannot take a path: {base_url}"));
        }

        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client for the forecast provider")?;

        Ok(Self {
            base_url,
            api_key: settings.api_key,
            http,
        })
    }

    /// `{base}/{city}`, with the city encoded as a single path segment.
    fn timeline_url(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(city);
        }
        url
    }
}

#[async_trait]
impl WeatherSource for VisualCrossingProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, city: &str) -> Result<ForecastDocument, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        let res = self
            .http
            .get(self.timeline_url(city))
            .query(&[
                ("unitGroup", "metric"),
                ("include", "days"),
                ("key", self.api_key.as_str()),
                ("contentType", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "forecast request failed");
                FetchError::Transport(e)
            })?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            warn!(%status, body = %truncate_body(&body), "forecast provider rejected request");
            return Err(FetchError::Status(status));
        }

        let doc: ForecastDocument = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "forecast document did not parse");
            FetchError::Malformed(e)
        })?;

        debug!(
            resolved = %doc.resolved_address,
            days = doc.days.len(),
            "forecast received"
        );
        Ok(doc)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
