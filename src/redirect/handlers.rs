use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::service::LinkService;

pub struct RedirectState {
    pub service: Arc<LinkService>,
}

/// Redirect to the original URL with 307 Temporary Redirect
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(short_id): Path<String>,
) -> Result<Redirect, ApiError> {
    match state.service.resolve(&short_id).await? {
        Some(long_url) => Ok(Redirect::temporary(&long_url)),
        None => Err(ApiError::NotFound),
    }
}
