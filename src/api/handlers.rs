use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::{CreateUrlRequest, UrlStats};
use crate::service::LinkService;

pub struct AppState {
    pub service: Arc<LinkService>,
    /// Overrides the Host-derived prefix of returned short URLs.
    pub public_base_url: Option<String>,
}

impl AppState {
    fn short_url(&self, headers: &HeaderMap, short_id: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, short_id),
            None => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("localhost");
                format!("http://{}/{}", host, short_id)
            }
        }
    }
}

/// Liveness probe
pub async fn ping() -> &'static str {
    "pong"
}

/// Shorten a URL, answering with the full short URL as plain text
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected create request body");
        ApiError::InvalidBody
    })?;

    let mapping = state.service.shorten(&request.long_url).await?;
    info!(short_id = %mapping.short_id, long_url = %mapping.long_url, "created short url");

    Ok(state.short_url(&headers, &mapping.short_id))
}

/// Mapping and visit counts for a short id
pub async fn get_url_info(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> Result<Json<UrlStats>, ApiError> {
    match state.service.stats(&short_id).await? {
        Some(stats) => Ok(Json(stats)),
        None => Err(ApiError::NotFound),
    }
}
