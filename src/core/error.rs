/// Error Module
///
/// This module defines the error type shared by the database facade, the
/// benchmark paths and the configuration loader. Every failure the engine
/// reports is surfaced here and propagated to the caller; nothing is
/// swallowed below the binaries.
use thiserror::Error;

/// Error type for duckbench.
///
/// The first three variants map onto the engine-level failures:
/// - opening a database
/// - connecting to an open database
/// - executing a statement (DDL, INSERT or SELECT alike)
///
/// The rest cover chunk access, configuration and argument validation.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The engine refused to open the database at `path`
    #[error("Failed to open database '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// The engine refused to create a connection on an open database
    #[error("Failed to connect to database: {0}")]
    ConnectFailed(String),

    /// A statement failed; `message` is the engine's diagnostic
    #[error("Query failed: {message} (sql: {sql})")]
    QueryFailed { sql: String, message: String },

    /// A chunk index beyond the materialized chunk count was requested
    #[error("Chunk index {index} out of range (result has {count} chunks)")]
    ChunkOutOfRange { index: usize, count: usize },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path or SQL string that cannot cross the C boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors from the configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BenchError {
    /// Builds a `QueryFailed` error, truncating very long statements.
    pub fn query_failed(sql: &str, message: impl Into<String>) -> Self {
        const MAX_SQL: usize = 120;
        let sql = if sql.chars().count() > MAX_SQL {
            let head: String = sql.chars().take(MAX_SQL).collect();
            format!("{head}...")
        } else {
            sql.to_string()
        };
        BenchError::QueryFailed {
            sql,
            message: message.into(),
        }
    }
}

impl From<std::ffi::NulError> for BenchError {
    fn from(err: std::ffi::NulError) -> Self {
        BenchError::InvalidArgument(format!(
            "string contains an interior NUL byte at position {}",
            err.nul_position()
        ))
    }
}

/// Type alias for Result to use BenchError as the error type.
pub type Result<T> = std::result::Result<T, BenchError>;
