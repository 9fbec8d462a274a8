/// Core Module for duckbench
///
/// This module contains the database facade and the error type shared by
/// the benchmark and probe paths.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{BenchError, Result};
