//! Read-only HTTP query API over the sensor registry
//!
//! | method | path              | body                                   |
//! |--------|-------------------|----------------------------------------|
//! | GET    | `/sensors/`       | JSON array of sensor names             |
//! | GET    | `/sensors/next/`  | JSON string, predicted next sensor     |
//! | GET    | `/sensors/{name}/`| JSON object with index and latest data |
//!
//! Each path is also served without the trailing slash.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::registry::{Reading, SensorRegistry};

/// Build the query router over a registry handle.
pub fn router(registry: SensorRegistry) -> Router {
    Router::new()
        .route("/sensors", get(list_sensors))
        .route("/sensors/", get(list_sensors))
        .route("/sensors/next", get(next_sensor))
        .route("/sensors/next/", get(next_sensor))
        .route("/sensors/{name}", get(sensor_detail))
        .route("/sensors/{name}/", get(sensor_detail))
        .fallback(not_found)
        .with_state(registry)
}

/// Error body returned with every 4xx response
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
}

impl ApiError {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Detail view of one sensor
#[derive(Debug, Serialize)]
pub struct SensorDetail {
    pub name: String,
    pub index: usize,
    pub latest: Option<Reading>,
}

async fn list_sensors(State(registry): State<SensorRegistry>) -> Json<Vec<String>> {
    Json(registry.list_sensors())
}

async fn next_sensor(State(registry): State<SensorRegistry>) -> Json<String> {
    let next = registry.peek_next_expected();
    tracing::debug!(next = %next, "next sensor requested");
    Json(next)
}

async fn sensor_detail(
    State(registry): State<SensorRegistry>,
    Path(name): Path<String>,
) -> Result<Json<SensorDetail>, ApiError> {
    let sensor = registry
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("unknown sensor '{name}'")))?;

    Ok(Json(SensorDetail {
        latest: registry.latest(&sensor.name),
        name: sensor.name,
        index: sensor.index,
    }))
}

async fn not_found(uri: Uri) -> ApiError {
    tracing::debug!(path = %uri.path(), "no route");
    ApiError::not_found(format!("no route for {}", uri.path()))
}
