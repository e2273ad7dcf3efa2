use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{create_api_router, AppState};
use crate::config::{Config, DatabaseBackend, DatabaseConfig};
use crate::idgen::RandomIdGenerator;
use crate::redirect::{create_redirect_router, RedirectState};
use crate::service::LinkService;
use crate::storage::{MemoryStorage, PostgresStorage, SqliteStorage, Storage};

/// Open the configured backend and make sure its schema exists.
pub async fn open_storage(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.url);
            Arc::new(SqliteStorage::new(&config.url, config.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage");
            Arc::new(PostgresStorage::new(&config.url, config.max_connections).await?)
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory storage: all mappings and visit history are lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    storage.init().await?;
    Ok(storage)
}

pub fn link_service(config: &Config, storage: Arc<dyn Storage>) -> Arc<LinkService> {
    Arc::new(LinkService::new(
        storage,
        Arc::new(RandomIdGenerator::new(config.short_id.length)),
        config.short_id.max_attempts,
    ))
}

/// API and redirect routes served from one listener.
pub fn create_app(service: Arc<LinkService>, public_base_url: Option<String>) -> Router {
    let api_state = Arc::new(AppState {
        service: Arc::clone(&service),
        public_base_url,
    });
    let redirect_state = Arc::new(RedirectState { service });

    create_api_router(api_state)
        .merge(create_redirect_router(redirect_state))
        .layer(TraceLayer::new_for_http())
}
