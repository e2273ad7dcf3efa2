//! Link operations shared by the HTTP handlers and the admin CLI.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::idgen::{reserve_counted, IdGenerator, ReserveError};
use crate::models::{UrlMapping, UrlStats};
use crate::storage::{Storage, StorageError, ALL_TIME, DAY_SECS, WEEK_SECS};

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("invalid long url")]
    InvalidUrl,
    #[error(transparent)]
    Reserve(#[from] ReserveError),
}

impl From<StorageError> for ShortenError {
    fn from(err: StorageError) -> Self {
        ShortenError::Reserve(ReserveError::Storage(err))
    }
}

/// Accept only absolute URIs, the way a browser address bar would need them.
///
/// The input is stored and later sent back verbatim in `Location`, so
/// anything `Url::parse` would silently strip (surrounding whitespace,
/// control characters such as tab or newline) is rejected rather than kept.
pub fn validate_long_url(long_url: &str) -> Result<Url, ShortenError> {
    if long_url.trim().is_empty()
        || long_url.trim() != long_url
        || long_url.chars().any(char::is_control)
    {
        return Err(ShortenError::InvalidUrl);
    }
    Url::parse(long_url).map_err(|_| ShortenError::InvalidUrl)
}

pub struct LinkService {
    storage: Arc<dyn Storage>,
    generator: Arc<dyn IdGenerator>,
    max_attempts: u32,
}

impl LinkService {
    pub fn new(
        storage: Arc<dyn Storage>,
        generator: Arc<dyn IdGenerator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            storage,
            generator,
            max_attempts,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Validate `long_url`, reserve an unused id and persist the mapping.
    ///
    /// An insert rejected by the storage uniqueness constraint counts as
    /// one more collision against the same attempt budget.
    pub async fn shorten(&self, long_url: &str) -> Result<UrlMapping, ShortenError> {
        validate_long_url(long_url)?;

        let mut remaining = self.max_attempts;
        loop {
            let (short_id, used) =
                reserve_counted(self.storage.as_ref(), self.generator.as_ref(), remaining)
                    .await
                    .map_err(|err| match err {
                        ReserveError::Exhausted { .. } => ReserveError::Exhausted {
                            attempts: self.max_attempts,
                        },
                        other => other,
                    })?;
            remaining -= used;

            match self.storage.insert_mapping(&short_id, long_url).await {
                Ok(()) => {
                    return Ok(UrlMapping {
                        short_id,
                        long_url: long_url.to_string(),
                    })
                }
                Err(StorageError::Conflict) if remaining > 0 => {
                    debug!(short_id = %short_id, "short id taken between check and insert, retrying");
                }
                Err(StorageError::Conflict) => {
                    return Err(ReserveError::Exhausted {
                        attempts: self.max_attempts,
                    }
                    .into())
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Resolve `short_id` for a redirect and record the visit.
    ///
    /// An empty stored URL is reported as not found. A failure to record the
    /// visit is logged and never returned.
    pub async fn resolve(&self, short_id: &str) -> Result<Option<String>, StorageError> {
        let long_url = match self.storage.lookup(short_id).await? {
            Some(url) if !url.is_empty() => url,
            _ => return Ok(None),
        };

        if let Err(err) = self.storage.record_visit(short_id).await {
            warn!(short_id = %short_id, error = %err, "failed to record visit");
        }

        Ok(Some(long_url))
    }

    /// Mapping plus visit counts over the last day, week and all time.
    pub async fn stats(&self, short_id: &str) -> Result<Option<UrlStats>, StorageError> {
        let long_url = match self.storage.lookup(short_id).await? {
            Some(url) => url,
            None => return Ok(None),
        };

        let visits_24_hours = self.storage.count_visits_since(short_id, DAY_SECS).await?;
        let visits_7_days = self.storage.count_visits_since(short_id, WEEK_SECS).await?;
        let visits_all_time = self.storage.count_visits_since(short_id, ALL_TIME).await?;

        Ok(Some(UrlStats {
            short_id: short_id.to_string(),
            long_url,
            visits_24_hours,
            visits_7_days,
            visits_all_time,
        }))
    }
}
