//! Binary layout of the C API's public types, and a walk through the
//! result metadata those types expose.
//!
//! Handle types are opaque pointers; `duckdb_result` is the only struct the
//! caller allocates. Its layout is stable within one major engine version.
use crate::core::db::{Database, ResultMetadata};
use crate::core::{BenchError, Result};
use duckdb::ffi;
use std::fmt;
use std::mem;

/// Size of every handle type on 64-bit targets
pub const HANDLE_SIZE_64: usize = 8;
/// Alignment of every handle type on 64-bit targets
pub const HANDLE_ALIGN_64: usize = 8;
/// Size of `duckdb_result` on 64-bit targets
pub const RESULT_SIZE_64: usize = 48;
/// Alignment of `duckdb_result` on 64-bit targets
pub const RESULT_ALIGN_64: usize = 8;

/// Size and alignment of one C API type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

impl TypeLayout {
    pub fn of<T>(name: &'static str) -> Self {
        TypeLayout {
            name,
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
        }
    }
}

impl fmt::Display for TypeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SIZE: {} ALIGN: {}", self.name, self.size, self.align)
    }
}

/// Layouts of the handle types and the result struct
pub fn type_layouts() -> Vec<TypeLayout> {
    vec![
        TypeLayout::of::<ffi::duckdb_config>("duckdb_config"),
        TypeLayout::of::<ffi::duckdb_database>("duckdb_database"),
        TypeLayout::of::<ffi::duckdb_connection>("duckdb_connection"),
        TypeLayout::of::<ffi::duckdb_result>("duckdb_result"),
        TypeLayout::of::<ffi::duckdb_prepared_statement>("duckdb_prepared_statement"),
        TypeLayout::of::<ffi::duckdb_appender>("duckdb_appender"),
        TypeLayout::of::<ffi::duckdb_data_chunk>("duckdb_data_chunk"),
        TypeLayout::of::<ffi::duckdb_vector>("duckdb_vector"),
    ]
}

/// Expected layout of `name` on this target, when known
pub fn expected_layout(name: &str) -> Option<(usize, usize)> {
    if cfg!(not(target_pointer_width = "64")) {
        return None;
    }
    match name {
        "duckdb_result" => Some((RESULT_SIZE_64, RESULT_ALIGN_64)),
        "duckdb_config"
        | "duckdb_database"
        | "duckdb_connection"
        | "duckdb_prepared_statement"
        | "duckdb_appender"
        | "duckdb_data_chunk"
        | "duckdb_vector" => Some((HANDLE_SIZE_64, HANDLE_ALIGN_64)),
        _ => None,
    }
}

/// Result metadata gathered from three representative statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataProbe {
    /// An INSERT of three rows
    pub insert: ResultMetadata,
    /// A SELECT of two columns over those rows
    pub select: ResultMetadata,
    /// The engine's message for a statement that fails
    pub failure_message: String,
}

impl fmt::Display for MetadataProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, meta) in [("insert", &self.insert), ("select", &self.select)] {
            writeln!(f, "[{}]", label)?;
            writeln!(f, "column_count: {}", meta.column_count)?;
            writeln!(f, "row_count: {}", meta.row_count)?;
            writeln!(f, "rows_changed: {}", meta.rows_changed)?;
            writeln!(
                f,
                "error_message: {}",
                meta.error_message.as_deref().unwrap_or("(none)")
            )?;
        }
        writeln!(f, "[failure]")?;
        write!(f, "error_message: {}", self.failure_message)
    }
}

/// Reads result metadata through the accessor functions on an in-memory
/// database.
pub fn probe_result_metadata() -> Result<MetadataProbe> {
    let db = Database::open_in_memory()?;
    let conn = db.connect()?;
    conn.execute("CREATE TABLE probe (id INTEGER, name TEXT)")?;

    let insert = conn
        .query("INSERT INTO probe VALUES (1, 'a'), (2, 'b'), (3, 'c')")?
        .metadata();
    let select = conn.query("SELECT id, name FROM probe")?.metadata();

    let failure_message = match conn.query("SELECT missing_column FROM probe") {
        Err(BenchError::QueryFailed { message, .. }) => message,
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(BenchError::InvalidArgument(
                "probe statement unexpectedly succeeded".to_string(),
            ))
        }
    };

    Ok(MetadataProbe {
        insert,
        select,
        failure_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_layouts_match_abi_constants() {
        let layouts = type_layouts();
        assert_eq!(layouts.len(), 8);
        for layout in layouts {
            let (size, align) = expected_layout(layout.name).unwrap();
            assert_eq!(layout.size, size, "size of {}", layout.name);
            assert_eq!(layout.align, align, "align of {}", layout.name);
        }
    }

    #[test]
    fn test_unknown_type_has_no_expectation() {
        assert_eq!(expected_layout("duckdb_widget"), None);
    }

    #[test]
    fn test_probe_result_metadata() {
        let probe = probe_result_metadata().unwrap();

        assert_eq!(probe.insert.rows_changed, 3);
        assert_eq!(probe.insert.error_message, None);

        assert_eq!(probe.select.column_count, 2);
        assert_eq!(probe.select.row_count, 3);
        assert_eq!(probe.select.rows_changed, 0);

        assert!(probe.failure_message.contains("missing_column"));

        let text = probe.to_string();
        assert!(text.contains("rows_changed: 3"));
        assert!(text.contains("[failure]"));
    }

    #[test]
    fn test_layout_display() {
        let layout = TypeLayout {
            name: "duckdb_result",
            size: 48,
            align: 8,
        };
        assert_eq!(layout.to_string(), "duckdb_result SIZE: 48 ALIGN: 8");
    }
}
