use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted association between a short id and the URL it redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UrlMapping {
    pub short_id: String,
    pub long_url: String,
}

/// One redirect traversal of a short id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    pub short_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlRequest {
    pub long_url: String,
}

/// Info payload returned by `GET /v1/get/{short_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlStats {
    pub short_id: String,
    pub long_url: String,
    #[serde(rename = "visits24Hours")]
    pub visits_24_hours: i64,
    #[serde(rename = "visits7Days")]
    pub visits_7_days: i64,
    pub visits_all_time: i64,
}
