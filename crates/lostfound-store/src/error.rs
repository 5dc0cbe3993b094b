use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document body could not be serialized or parsed.
    #[error("Document encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No item (or notice document) with the requested identity exists.
    #[error("Record not found")]
    NotFound,

    /// Floor number outside the fixed allowed set.
    #[error("Invalid floor: {0}")]
    InvalidFloor(i64),

    /// A required field was missing or empty after trimming.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    /// Notice index outside `[0, len)`.
    #[error("Index {index} out of range (len {len})")]
    InvalidIndex { index: i64, len: usize },

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
