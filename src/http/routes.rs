use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use super::{ApiResult, AppState};
use crate::dashboard::{ImageOutcome, ImageRequest};
use crate::data::leaf::LEAF_SUMMARY_FILE;
use crate::data::temperature::{self, StoredReading};
use crate::data::weather::{self, WEATHER_SUMMARY_FILE};
use crate::data::{blocking, messages};
use crate::error::DashError;
use crate::snapshot::{DashboardSnapshot, WeatherReport};

const TOKEN_HEADER: &str = "if-none-match";
const ACTION_HEADER: &str = "action-id";
const MINS_TO_SLEEP_HEADER: &str = "mins-to-sleep";
const ACTIONS_HEADER: &str = "actions";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/dashboard-image", get(dashboard_image))
        .route("/dashboard-data", get(dashboard_data))
        .route("/leaf", get(leaf_summary))
        .route("/weather", get(weather_summary))
        .route("/messages/:date", get(get_message).put(put_message))
        .route(
            "/temperatures/:id",
            get(get_temperature).put(put_temperature),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello, world 👋"
}

/// Trimmed header value with surrounding quotes removed; empty counts as absent.
fn header_value(headers: &HeaderMap, name: &'static str) -> ApiResult<Option<String>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| DashError::InvalidHeader(name))?
        .trim()
        .trim_matches('"');

    Ok((!value.is_empty()).then(|| value.to_string()))
}

async fn dashboard_image(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let request = ImageRequest {
        token: header_value(&headers, TOKEN_HEADER)?,
        action: header_value(&headers, ACTION_HEADER)?.map(Into::into),
    };

    let response = match state.dashboard.image(request).await? {
        ImageOutcome::NotModified { poll_minutes } => (
            StatusCode::NOT_MODIFIED,
            [(
                HeaderName::from_static(MINS_TO_SLEEP_HEADER),
                poll_minutes.to_string(),
            )],
        )
            .into_response(),
        ImageOutcome::Fresh(image) => {
            let headers = [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (header::ETAG, image.token),
                (
                    HeaderName::from_static(MINS_TO_SLEEP_HEADER),
                    image.poll_minutes.to_string(),
                ),
                (
                    HeaderName::from_static(ACTIONS_HEADER),
                    serde_json::to_string(&image.actions)?,
                ),
            ];

            (headers, image.bytes).into_response()
        }
    };

    Ok(response)
}

async fn dashboard_data(State(state): State<AppState>) -> ApiResult<Json<DashboardSnapshot>> {
    Ok(Json(state.dashboard.snapshot().await?))
}

async fn leaf_summary(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let files = state.files.clone();
    let summary: serde_json::Value =
        blocking(move || files.store().read(LEAF_SUMMARY_FILE)).await?;
    Ok(Json(summary))
}

async fn weather_summary(State(state): State<AppState>) -> ApiResult<Json<WeatherReport>> {
    let files = state.files.clone();
    let report = blocking(move || weather::load(files.store()))
        .await?
        .ok_or_else(|| DashError::NotFound(WEATHER_SUMMARY_FILE.to_string()))?;
    Ok(Json(report))
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageBody {
    message: String,
}

async fn get_message(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Json<MessageBody>> {
    let date = messages::parse_date(&date)?;
    let files = state.files.clone();
    let message =
        blocking(move || messages::message_for(files.store(), files.messages_file(), date))
            .await?;
    Ok(Json(MessageBody { message }))
}

async fn put_message(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(body): Json<MessageBody>,
) -> ApiResult<StatusCode> {
    let date = messages::parse_date(&date)?;
    let files = state.files.clone();
    blocking(move || {
        messages::set_message(files.store(), files.messages_file(), date, &body.message)
    })
    .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
struct TemperatureUpdate {
    temperature: f64,
    humidity: f64,
}

async fn get_temperature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StoredReading>> {
    let files = state.files.clone();
    let sensor = id.clone();
    let reading = blocking(move || temperature::reading(files.store(), &sensor))
        .await?
        .ok_or_else(|| DashError::NotFound(format!("temperature sensor {id}")))?;
    Ok(Json(reading))
}

async fn put_temperature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TemperatureUpdate>,
) -> ApiResult<Json<StoredReading>> {
    let files = state.files.clone();
    let stored = blocking(move || {
        temperature::record(files.store(), &id, update.temperature, update.humidity)
    })
    .await?;
    Ok(Json(stored))
}
