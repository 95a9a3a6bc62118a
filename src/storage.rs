//! Key/value persistence for timeline state.
//!
//! The engine only needs two calls, so any backend fits behind
//! [`KeyValueStore`]. The CLI keeps its values in a single `SQLite` file:
//!
//! ```text
//! ~/.journey/
//!   viewport.sqlite   # kv(key TEXT PRIMARY KEY, value TEXT)
//! ```

mod memory;
mod sqlite;

use std::io;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// A string-to-string store.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
