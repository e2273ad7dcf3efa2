use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::{create_url, get_url_info, ping, AppState};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/create", post(create_url))
        .route("/v1/get/{short_id}", get(get_url_info))
        .with_state(state)
}
