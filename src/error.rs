use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::idgen::ReserveError;
use crate::service::ShortenError;
use crate::storage::StorageError;

/// Errors surfaced at the HTTP boundary.
///
/// Client errors carry a plain-text message. Server errors are logged and
/// answered with a generic message so database details never leak.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid Request Body")]
    InvalidBody,
    #[error("Invalid Long Url")]
    InvalidUrl,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Reserve(ReserveError),
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::Storage(err) => ApiError::Storage(err),
            other => ApiError::Reserve(other),
        }
    }
}

impl From<ShortenError> for ApiError {
    fn from(err: ShortenError) -> Self {
        match err {
            ShortenError::InvalidUrl => ApiError::InvalidUrl,
            ShortenError::Reserve(err) => err.into(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::InvalidUrl => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Reserve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotFound => status.into_response(),
            ApiError::InvalidBody | ApiError::InvalidUrl => {
                (status, self.to_string()).into_response()
            }
            ApiError::Storage(_) | ApiError::Reserve(_) => {
                tracing::error!(error = %self, "request failed");
                (status, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StorageError::Conflict).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ReserveError::Exhausted { attempts: 3 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reserve_storage_error_unwraps_to_storage() {
        let err = ApiError::from(ShortenError::Reserve(ReserveError::Storage(
            StorageError::Conflict,
        )));
        assert!(matches!(err, ApiError::Storage(StorageError::Conflict)));
    }

    #[tokio::test]
    async fn test_server_error_body_is_generic() {
        let err = ApiError::from(StorageError::Other(anyhow::anyhow!(
            "no such table: urlmap"
        )));
        let response = err.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Internal server error");
    }
}
