use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers::{redirect_url, RedirectState};

/// One path-parameter route; ids are looked up per request, so the route
/// table never grows with the number of mappings.
pub fn create_redirect_router(state: Arc<RedirectState>) -> Router {
    Router::new()
        .route("/{short_id}", get(redirect_url))
        .with_state(state)
}
