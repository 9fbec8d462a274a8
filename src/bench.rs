//! Write and read benchmarks over the fixed three-column table.
//!
//! The writer issues one INSERT statement per row; the reader selects the
//! whole table and walks its chunks column by column.
use crate::config::{BenchConfig, Config};
use crate::core::db::{vector_size, Connection, Database, LogicalType, Value};
use crate::core::{BenchError, Result};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Number of columns in the benchmark table
pub const TABLE_COLUMNS: usize = 3;

/// Values every inserted row carries
pub const ROW_VALUES: &str = "(4321, 1234.0, 'ducks')";

pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {} (int_col INTEGER, float_col FLOAT, text_col TEXT)",
        table
    )
}

pub fn insert_row_sql(table: &str) -> String {
    format!("INSERT INTO {} VALUES {}", table, ROW_VALUES)
}

pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

/// One failed insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 0-based index of the attempted insert
    pub row: usize,
    pub message: String,
}

/// Outcome of a write run
#[derive(Debug, Clone)]
pub struct InsertReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<RowFailure>,
    pub elapsed: Duration,
}

impl InsertReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return self.succeeded as f64;
        }
        self.succeeded as f64 / secs
    }

    /// Turns a report with failed rows into an error
    pub fn into_result(self, table: &str) -> Result<InsertReport> {
        if self.is_clean() {
            return Ok(self);
        }
        let first = &self.failures[0];
        Err(BenchError::query_failed(
            &insert_row_sql(table),
            format!(
                "{} of {} inserts failed (first at row {}: {})",
                self.failures.len(),
                self.attempted,
                first.row,
                first.message
            ),
        ))
    }
}

impl fmt::Display for InsertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROWS ATTEMPTED: {}", self.attempted)?;
        writeln!(f, "ROWS INSERTED: {}", self.succeeded)?;
        writeln!(f, "ROWS FAILED: {}", self.failures.len())?;
        writeln!(f, "ELAPSED MS: {}", self.elapsed.as_millis())?;
        write!(f, "ROWS PER SECOND: {:.0}", self.rows_per_second())
    }
}

/// Creates the benchmark table and fills it one INSERT at a time.
///
/// A failing CREATE TABLE ends the run with an error.
pub fn write_table(conn: &Connection<'_>, bench: &BenchConfig) -> Result<InsertReport> {
    info!("Writing table {}", bench.table);
    conn.execute(&create_table_sql(&bench.table))?;
    insert_rows(conn, &bench.table, bench.rows)
}

/// Issues `rows` single-row inserts into `table`.
///
/// Failing inserts are collected in the report and the remaining rows are
/// still attempted.
pub fn insert_rows(conn: &Connection<'_>, table: &str, rows: usize) -> Result<InsertReport> {
    let insert = insert_row_sql(table);
    let mut failures = Vec::new();
    let start = Instant::now();
    for row in 0..rows {
        if let Err(e) = conn.execute(&insert) {
            warn!("Insert {} failed: {}", row, e);
            failures.push(RowFailure {
                row,
                message: e.to_string(),
            });
        }
    }
    let elapsed = start.elapsed();

    let report = InsertReport {
        attempted: rows,
        succeeded: rows - failures.len(),
        failures,
        elapsed,
    };
    info!(
        "Inserted {} of {} rows in {:?}",
        report.succeeded, report.attempted, report.elapsed
    );
    Ok(report)
}

/// Per-column view of one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub index: usize,
    pub logical_type: LogicalType,
    pub has_data: bool,
    pub has_validity: bool,
    pub null_count: usize,
}

/// One chunk of the read result
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSummary {
    pub index: usize,
    pub size: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Outcome of a read run
#[derive(Debug, Clone)]
pub struct ReadReport {
    pub vector_size: usize,
    pub row_count: u64,
    pub streaming: bool,
    pub chunk_count: usize,
    pub column_names: Vec<String>,
    pub chunks: Vec<ChunkSummary>,
    /// First row of the first chunk, decoded
    pub sample_row: Option<Vec<Value>>,
    pub elapsed: Duration,
}

impl ReadReport {
    /// Rows summed over all chunks
    pub fn chunk_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.size as u64).sum()
    }

    pub fn null_count(&self) -> usize {
        self.chunks
            .iter()
            .flat_map(|c| c.columns.iter())
            .map(|col| col.null_count)
            .sum()
    }
}

impl fmt::Display for ReadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VECTOR SIZE: {}", self.vector_size)?;
        writeln!(f, "ROW COUNT: {}", self.row_count)?;
        writeln!(f, "IS STREAMING: {}", self.streaming)?;
        writeln!(f, "CHUNK COUNT: {}", self.chunk_count)?;
        writeln!(f, "COLUMNS: {}", self.column_names.join(", "))?;
        for chunk in &self.chunks {
            writeln!(f, "CHUNK {}", chunk.index)?;
            writeln!(f, "  CHUNK ROW COUNT: {}", chunk.size)?;
            writeln!(f, "  CHUNK COLUMN COUNT: {}", chunk.column_count)?;
            for col in &chunk.columns {
                writeln!(
                    f,
                    "  CHUNK COL: {} type={} data={} validity={} nulls={}",
                    col.index,
                    col.logical_type,
                    if col.has_data { "present" } else { "absent" },
                    if col.has_validity { "present" } else { "absent" },
                    col.null_count
                )?;
            }
        }
        if let Some(row) = &self.sample_row {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "FIRST ROW: ({})", values.join(", "))?;
        }
        write!(f, "ELAPSED MS: {}", self.elapsed.as_millis())
    }
}

/// Selects the whole benchmark table and summarizes every chunk.
pub fn read_table(conn: &Connection<'_>, bench: &BenchConfig) -> Result<ReadReport> {
    let start = Instant::now();
    let result = conn.query(&select_all_sql(&bench.table))?;

    let row_count = result.row_count();
    let streaming = result.is_streaming();
    let chunk_count = result.chunk_count();
    debug!(
        "Result has {} rows in {} chunks (streaming: {})",
        row_count, chunk_count, streaming
    );

    let mut chunks = Vec::with_capacity(chunk_count);
    let mut sample_row = None;
    for (index, chunk) in result.chunks().enumerate() {
        let chunk = chunk?;
        if sample_row.is_none() {
            sample_row = chunk.row(0);
        }
        let columns = chunk
            .vectors()
            .enumerate()
            .map(|(column, vector)| {
                let validity = vector.validity();
                ColumnSummary {
                    index: column,
                    logical_type: vector.logical_type(),
                    has_data: !vector.data_ptr().is_null(),
                    has_validity: validity.is_present(),
                    null_count: validity.null_count(),
                }
            })
            .collect();
        chunks.push(ChunkSummary {
            index,
            size: chunk.size(),
            column_count: chunk.column_count(),
            columns,
        });
    }

    let report = ReadReport {
        vector_size: vector_size(),
        row_count,
        streaming,
        chunk_count,
        column_names: result.column_names(),
        chunks,
        sample_row,
        elapsed: start.elapsed(),
    };
    info!("Read {} rows in {:?}", report.row_count, report.elapsed);
    Ok(report)
}

fn open(config: &Config) -> Result<Database> {
    Database::open_with_settings(
        Some(config.database.path.as_path()),
        &config.database.settings,
    )
}

/// Opens the configured database and runs the writer
pub fn run_writer(config: &Config) -> Result<InsertReport> {
    let db = open(config)?;
    let conn = db.connect()?;
    write_table(&conn, &config.bench)
}

/// Opens the configured database and runs the reader
pub fn run_reader(config: &Config) -> Result<ReadReport> {
    let db = open(config)?;
    let conn = db.connect()?;
    read_table(&conn, &config.bench)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TempDatabase;

    #[test]
    fn test_sql_text() {
        assert_eq!(
            create_table_sql("test_tbl"),
            "CREATE TABLE test_tbl (int_col INTEGER, float_col FLOAT, text_col TEXT)"
        );
        assert_eq!(
            insert_row_sql("test_tbl"),
            "INSERT INTO test_tbl VALUES (4321, 1234.0, 'ducks')"
        );
        assert_eq!(select_all_sql("t"), "SELECT * FROM t");
    }

    #[test]
    fn test_write_then_read() {
        let fixture = TempDatabase::new();
        let config = fixture.config(3000);

        let written = run_writer(&config).unwrap();
        assert!(written.is_clean());
        assert_eq!(written.attempted, 3000);
        assert_eq!(written.succeeded, 3000);

        let read = run_reader(&config).unwrap();
        assert_eq!(read.row_count, 3000);
        assert_eq!(read.chunk_rows(), 3000);
        assert!(!read.streaming);
        assert_eq!(read.chunk_count, read.chunks.len());
        assert_eq!(read.vector_size, 2048);
        assert_eq!(read.null_count(), 0);
        assert_eq!(read.column_names, vec!["int_col", "float_col", "text_col"]);
        for chunk in &read.chunks {
            assert_eq!(chunk.column_count, TABLE_COLUMNS);
            assert!(chunk.size <= read.vector_size);
            let types: Vec<LogicalType> = chunk.columns.iter().map(|c| c.logical_type).collect();
            assert_eq!(
                types,
                vec![LogicalType::Integer, LogicalType::Float, LogicalType::Varchar]
            );
            assert!(chunk.columns.iter().all(|c| c.has_data));
        }
        assert_eq!(
            read.sample_row,
            Some(vec![
                Value::Integer(4321),
                Value::Float(1234.0),
                Value::Varchar("ducks".to_string()),
            ])
        );
    }

    #[test]
    fn test_second_write_fails_on_existing_table() {
        let fixture = TempDatabase::new();
        let config = fixture.config(5);
        run_writer(&config).unwrap();

        match run_writer(&config) {
            Err(BenchError::QueryFailed { sql, .. }) => assert!(sql.starts_with("CREATE TABLE")),
            _ => panic!("Expected QueryFailed from CREATE TABLE"),
        }
    }

    #[test]
    fn test_read_missing_table() {
        let fixture = TempDatabase::new();
        let config = fixture.config(5);
        assert!(matches!(
            run_reader(&config),
            Err(BenchError::QueryFailed { .. })
        ));
    }

    #[test]
    fn test_insert_failures_are_collected() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connect().unwrap();
        // Every row carries the same key, so only the first insert succeeds.
        conn.execute("CREATE TABLE dup (int_col INTEGER PRIMARY KEY, float_col FLOAT, text_col TEXT)")
            .unwrap();

        let report = insert_rows(&conn, "dup", 3).unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].row, 1);
        assert_eq!(report.failures[1].row, 2);
        assert!(!report.is_clean());

        let count = conn.query("SELECT * FROM dup").unwrap().row_count();
        assert_eq!(count, 1);

        match report.into_result("dup") {
            Err(BenchError::QueryFailed { message, .. }) => {
                assert!(message.contains("2 of 3 inserts failed"));
                assert!(message.contains("first at row 1"));
            }
            _ => panic!("Expected QueryFailed error"),
        }
    }

    #[test]
    fn test_report_display() {
        let report = InsertReport {
            attempted: 10,
            succeeded: 10,
            failures: Vec::new(),
            elapsed: Duration::from_secs(2),
        };
        let text = report.to_string();
        assert!(text.contains("ROWS INSERTED: 10"));
        assert!(text.contains("ROWS PER SECOND: 5"));
    }
}
