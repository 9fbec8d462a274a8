/// Query Execution Module
///
/// Statement execution and the columnar result reader. A `QueryResult`
/// wraps a materialized `duckdb_result` and hands out its data chunks.

use super::chunk::DataChunk;
use super::database::Connection;
use super::types::LogicalType;
use crate::core::{BenchError, Result};
use duckdb::ffi;
use std::cell::UnsafeCell;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::debug;

impl<'db> Connection<'db> {
    /// Executes `sql` and returns its result.
    ///
    /// The statement is passed through as is: no parameter binding, so the
    /// caller is responsible for what ends up in it.
    ///
    /// # Returns
    ///
    /// The materialized result, or `BenchError::QueryFailed` carrying the
    /// engine's error message. The engine-side result is released in both
    /// cases.
    pub fn query(&self, sql: &str) -> Result<QueryResult<'_>> {
        let c_sql = CString::new(sql)?;
        let result = QueryResult {
            // SAFETY: duckdb_result is plain data (integers and pointers).
            raw: UnsafeCell::new(unsafe { std::mem::zeroed() }),
            _conn: PhantomData,
            _nosend: PhantomData,
        };
        let state = unsafe { ffi::duckdb_query(self.raw, c_sql.as_ptr(), result.raw.get()) };
        if state != ffi::DuckDBSuccess {
            let message = result
                .error_message()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(BenchError::query_failed(sql, message));
        }
        debug!("acquired query result");
        Ok(result)
    }

    /// Executes a statement whose rows are not needed.
    ///
    /// # Returns
    ///
    /// The number of rows changed (0 for statements that change nothing).
    pub fn execute(&self, sql: &str) -> Result<u64> {
        let result = self.query(sql)?;
        Ok(result.rows_changed())
    }
}

/// Metadata of a result, read through the supported accessor functions.
///
/// These are the values the legacy `duckdb_result` struct also carries in
/// its deprecated fields; the fields themselves are never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMetadata {
    pub column_count: usize,
    pub row_count: u64,
    pub rows_changed: u64,
    pub error_message: Option<String>,
}

/// A materialized query result.
///
/// Chunks borrow the result, so it cannot be released while one is alive:
///
/// ```compile_fail
/// use duckbench::core::db::Database;
///
/// let db = Database::open_in_memory().unwrap();
/// let conn = db.connect().unwrap();
/// let chunk = {
///     let result = conn.query("SELECT 1").unwrap();
///     result.chunk(0).unwrap()
/// };
/// ```
pub struct QueryResult<'conn> {
    raw: UnsafeCell<ffi::duckdb_result>,
    _conn: PhantomData<&'conn ()>,
    _nosend: PhantomData<Rc<()>>,
}

impl<'conn> QueryResult<'conn> {
    fn by_value(&self) -> ffi::duckdb_result {
        unsafe { *self.raw.get() }
    }

    /// Number of rows in the result
    pub fn row_count(&self) -> u64 {
        unsafe { ffi::duckdb_row_count(self.raw.get()) }
    }

    /// Number of columns in the result
    pub fn column_count(&self) -> usize {
        unsafe { ffi::duckdb_column_count(self.raw.get()) as usize }
    }

    /// Rows changed by an INSERT/UPDATE/DELETE, 0 otherwise
    pub fn rows_changed(&self) -> u64 {
        unsafe { ffi::duckdb_rows_changed(self.raw.get()) }
    }

    /// The engine's error message, if the statement failed
    pub fn error_message(&self) -> Option<String> {
        let ptr = unsafe { ffi::duckdb_result_error(self.raw.get()) };
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
        }
    }

    /// Whether chunks are produced lazily instead of being materialized.
    ///
    /// Results from `Connection::query` are always materialized.
    pub fn is_streaming(&self) -> bool {
        unsafe { ffi::duckdb_result_is_streaming(self.by_value()) }
    }

    /// Number of materialized chunks.
    ///
    /// Only meaningful when `is_streaming()` is false.
    pub fn chunk_count(&self) -> usize {
        unsafe { ffi::duckdb_result_chunk_count(self.by_value()) as usize }
    }

    /// Fetches the chunk at `index` (0-based).
    pub fn chunk(&self, index: usize) -> Result<DataChunk<'_>> {
        let count = self.chunk_count();
        if index >= count {
            return Err(BenchError::ChunkOutOfRange { index, count });
        }
        let raw = unsafe { ffi::duckdb_result_get_chunk(self.by_value(), index as ffi::idx_t) };
        // The engine hands out no chunk for results it cannot index.
        unsafe { DataChunk::from_raw(raw) }.ok_or(BenchError::ChunkOutOfRange { index, count })
    }

    /// Iterates over every materialized chunk in order
    pub fn chunks(&self) -> impl Iterator<Item = Result<DataChunk<'_>>> + '_ {
        (0..self.chunk_count()).map(move |index| self.chunk(index))
    }

    /// Name of column `column`, if it exists
    pub fn column_name(&self, column: usize) -> Option<String> {
        if column >= self.column_count() {
            return None;
        }
        let ptr = unsafe { ffi::duckdb_column_name(self.raw.get(), column as ffi::idx_t) };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    /// Names of all columns, in order
    pub fn column_names(&self) -> Vec<String> {
        (0..self.column_count())
            .map(|c| self.column_name(c).unwrap_or_default())
            .collect()
    }

    /// Logical type of column `column`, if it exists
    pub fn column_type(&self, column: usize) -> Option<LogicalType> {
        if column >= self.column_count() {
            return None;
        }
        let id = unsafe { ffi::duckdb_column_type(self.raw.get(), column as ffi::idx_t) };
        Some(LogicalType::from_raw(id))
    }

    /// Logical types of all columns, in order
    pub fn column_types(&self) -> Vec<LogicalType> {
        (0..self.column_count())
            .filter_map(|c| self.column_type(c))
            .collect()
    }

    /// Snapshot of the result's metadata
    pub fn metadata(&self) -> ResultMetadata {
        ResultMetadata {
            column_count: self.column_count(),
            row_count: self.row_count(),
            rows_changed: self.rows_changed(),
            error_message: self.error_message(),
        }
    }
}

impl Drop for QueryResult<'_> {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_result(self.raw.get()) };
        debug!("released query result");
    }
}
