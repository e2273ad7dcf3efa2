pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{
    unix_now, window_start, Storage, StorageError, StorageResult, ALL_TIME, DAY_SECS, WEEK_SECS,
};
