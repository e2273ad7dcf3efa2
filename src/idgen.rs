//! Short id generation and collision avoidance
//!
//! Generation is a pure randomness draw; uniqueness is enforced separately
//! by checking candidates against storage. Ids are not cryptographically
//! secure and are not meant to be unguessable.

use rand::RngExt;
use thiserror::Error;
use tracing::debug;

use crate::storage::{Storage, StorageError};

/// Characters a short id is drawn from.
pub const ALPHABET: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const DEFAULT_ID_LENGTH: usize = 7;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 32;

/// Source of candidate short ids. Implementations do not touch storage.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Fixed-length ids drawn uniformly, with replacement, from [`ALPHABET`].
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("no unused short id found after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Draw candidates until one is not present in storage.
///
/// Gives up with [`ReserveError::Exhausted`] after `max_attempts` draws.
/// A failing existence check is returned immediately, never retried.
pub async fn reserve_unique_id(
    storage: &dyn Storage,
    generator: &dyn IdGenerator,
    max_attempts: u32,
) -> Result<String, ReserveError> {
    reserve_counted(storage, generator, max_attempts)
        .await
        .map(|(short_id, _)| short_id)
}

/// Like [`reserve_unique_id`], also returning how many draws were used.
pub(crate) async fn reserve_counted(
    storage: &dyn Storage,
    generator: &dyn IdGenerator,
    max_attempts: u32,
) -> Result<(String, u32), ReserveError> {
    for attempt in 1..=max_attempts {
        let candidate = generator.generate();
        if !storage.exists(&candidate).await? {
            return Ok((candidate, attempt));
        }
        debug!(short_id = %candidate, attempt, "short id collision, retrying");
    }

    Err(ReserveError::Exhausted {
        attempts: max_attempts,
    })
}
