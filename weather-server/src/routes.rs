use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};
use weather_core::{FilteredSummary, StoreRequest, WeatherRecord};

use crate::{error::ApiError, state::AppState};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/api/", post(lookup))
        .route("/store-weather/", post(store_weather))
        .route("/store-weather/{city}", get(list_weather))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn status() -> Json<Value> {
    Json(json!({ "status": 200 }))
}

#[derive(Debug, Deserialize)]
struct CityForm {
    #[serde(default)]
    city: String,
}

/// `city` from either a multipart or an urlencoded form body.
///
/// Browsers posting `FormData` send multipart. Any body that cannot be read
/// is a failed lookup.
struct CityInput(String);

impl<S> FromRequest<S> for CityInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<CityForm>::from_request(req, state)
                .await
                .map_err(|e| {
                    debug!(error = %e, "unreadable lookup form");
                    ApiError::NotFound
                })?;
            return Ok(CityInput(form.city));
        }

        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "unreadable multipart lookup form");
            ApiError::NotFound
        })?;

        while let Some(field) = multipart.next_field().await.map_err(|_| ApiError::NotFound)? {
            if field.name() == Some("city") {
                let city = field.text().await.map_err(|_| ApiError::NotFound)?;
                return Ok(CityInput(city));
            }
        }

        Ok(CityInput(String::new()))
    }
}

/// The client expects a one-element array.
async fn lookup(
    State(state): State<AppState>,
    CityInput(city): CityInput,
) -> Result<Json<Vec<FilteredSummary>>, ApiError> {
    let summary = state.service.lookup(&city).await?;
    Ok(Json(vec![summary]))
}

async fn store_weather(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let record = StoreRequest::from_json(&body)?.into_record()?;
    info!(city = %record.city, temp = record.temp, "storing weather record");
    state.store.put(record).await?;

    Ok(Json(json!({ "message": "Weather data stored successfully!" })))
}

async fn list_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Vec<WeatherRecord>>, ApiError> {
    Ok(Json(state.store.list(&city).await?))
}
