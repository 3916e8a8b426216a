mod routes;

pub use routes::create_router;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::cache::FreshnessCache;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::data::{FileSnapshotProvider, JsonStore};
use crate::error::DashError;
use crate::policy::FreshnessPolicy;
use crate::render::PanelRenderer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub files: Arc<FileSnapshotProvider>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>, files: Arc<FileSnapshotProvider>) -> Self {
        Self { dashboard, files }
    }

    pub fn from_config(config: &Config) -> Self {
        let files = Arc::new(FileSnapshotProvider::new(
            JsonStore::new(&config.dashboard_input_dir),
            config.messages_path(),
            config.temperature_sensor.as_str(),
        ));
        let renderer = Arc::new(PanelRenderer::new(
            &config.leaf_image_dir,
            config.jpeg_quality,
        ));

        let dashboard = Dashboard::new(
            files.clone(),
            renderer,
            FreshnessCache::new(config.cache_ttl()),
            FreshnessPolicy::new(config.max_snapshot_age()),
            config.poll_schedule(),
        );

        Self::new(Arc::new(dashboard), files)
    }
}

/// Error type for HTTP handlers
pub struct ApiError(DashError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DashError::InvalidDate(_) | DashError::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            DashError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("rejected request: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<DashError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
