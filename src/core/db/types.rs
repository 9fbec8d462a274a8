/// Logical Types and Value Decoding
///
/// Maps the engine's type tags onto `LogicalType` and decodes single
/// entries of a vector's data buffer into `Value`s.

use duckdb::ffi;
use std::fmt;
use std::os::raw::c_void;
use std::ptr;

/// Width in bytes of one `duckdb_string_t` entry
pub const STRING_ENTRY_WIDTH: usize = 16;

/// Longest string stored inline in a `duckdb_string_t` entry
pub const STRING_INLINE_LENGTH: usize = 12;

/// Logical type tag of a column or vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Invalid,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Timestamp,
    Date,
    Time,
    Interval,
    HugeInt,
    Varchar,
    Blob,
    Decimal,
    /// A tag this crate has no name for
    Other(u32),
}

impl LogicalType {
    /// Converts the engine's type id
    pub fn from_raw(id: ffi::duckdb_type) -> Self {
        match id {
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_INVALID => LogicalType::Invalid,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_BOOLEAN => LogicalType::Boolean,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_TINYINT => LogicalType::TinyInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_SMALLINT => LogicalType::SmallInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_INTEGER => LogicalType::Integer,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_BIGINT => LogicalType::BigInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_UTINYINT => LogicalType::UTinyInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_USMALLINT => LogicalType::USmallInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_UINTEGER => LogicalType::UInteger,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_UBIGINT => LogicalType::UBigInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_FLOAT => LogicalType::Float,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_DOUBLE => LogicalType::Double,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP => LogicalType::Timestamp,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_DATE => LogicalType::Date,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_TIME => LogicalType::Time,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_INTERVAL => LogicalType::Interval,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_HUGEINT => LogicalType::HugeInt,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_VARCHAR => LogicalType::Varchar,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_BLOB => LogicalType::Blob,
            ffi::DUCKDB_TYPE_DUCKDB_TYPE_DECIMAL => LogicalType::Decimal,
            other => LogicalType::Other(other),
        }
    }

    /// SQL name of the type
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Invalid => "INVALID",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::UTinyInt => "UTINYINT",
            LogicalType::USmallInt => "USMALLINT",
            LogicalType::UInteger => "UINTEGER",
            LogicalType::UBigInt => "UBIGINT",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Interval => "INTERVAL",
            LogicalType::HugeInt => "HUGEINT",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::Blob => "BLOB",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::Other(_) => "OTHER",
        }
    }

    /// Whether `decode` understands this type's buffer layout
    pub fn is_decodable(&self) -> bool {
        matches!(
            self,
            LogicalType::Boolean
                | LogicalType::TinyInt
                | LogicalType::SmallInt
                | LogicalType::Integer
                | LogicalType::BigInt
                | LogicalType::UTinyInt
                | LogicalType::USmallInt
                | LogicalType::UInteger
                | LogicalType::UBigInt
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Varchar
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Other(id) => write!(f, "OTHER({})", id),
            _ => f.write_str(self.name()),
        }
    }
}

/// A single decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    UTinyInt(u8),
    USmallInt(u16),
    UInteger(u32),
    UBigInt(u64),
    Float(f32),
    Double(f64),
    Varchar(String),
    /// Valid entry of a type with no decode rule
    Unsupported(LogicalType),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::UTinyInt(v) => write!(f, "{}", v),
            Value::USmallInt(v) => write!(f, "{}", v),
            Value::UInteger(v) => write!(f, "{}", v),
            Value::UBigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Varchar(v) => write!(f, "'{}'", v),
            Value::Unsupported(ty) => write!(f, "<{}>", ty),
        }
    }
}

unsafe fn read_at<T: Copy>(data: *const c_void, row: usize) -> T {
    ptr::read_unaligned((data as *const T).add(row))
}

/// Reads one `duckdb_string_t` entry.
///
/// Layout: a `u32` length, then either the bytes inline (length ≤ 12) or a
/// 4-byte prefix followed by a pointer at offset 8.
///
/// # Safety
///
/// `entry` must point at 16 readable bytes forming a valid string entry.
pub unsafe fn read_string_entry(entry: *const u8) -> String {
    let len = ptr::read_unaligned(entry as *const u32) as usize;
    let bytes = if len <= STRING_INLINE_LENGTH {
        std::slice::from_raw_parts(entry.add(4), len)
    } else {
        let data = ptr::read_unaligned(entry.add(8) as *const *const u8);
        std::slice::from_raw_parts(data, len)
    };
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes entry `row` of a vector data buffer holding `ty` values.
///
/// Validity is not consulted here; callers check the mask first.
///
/// # Safety
///
/// `data` must be the data buffer of a vector of type `ty` with more than
/// `row` entries.
pub unsafe fn decode(ty: LogicalType, data: *const c_void, row: usize) -> Value {
    match ty {
        LogicalType::Boolean => Value::Boolean(read_at::<u8>(data, row) != 0),
        LogicalType::TinyInt => Value::TinyInt(read_at(data, row)),
        LogicalType::SmallInt => Value::SmallInt(read_at(data, row)),
        LogicalType::Integer => Value::Integer(read_at(data, row)),
        LogicalType::BigInt => Value::BigInt(read_at(data, row)),
        LogicalType::UTinyInt => Value::UTinyInt(read_at(data, row)),
        LogicalType::USmallInt => Value::USmallInt(read_at(data, row)),
        LogicalType::UInteger => Value::UInteger(read_at(data, row)),
        LogicalType::UBigInt => Value::UBigInt(read_at(data, row)),
        LogicalType::Float => Value::Float(read_at(data, row)),
        LogicalType::Double => Value::Double(read_at(data, row)),
        LogicalType::Varchar => {
            Value::Varchar(read_string_entry((data as *const u8).add(row * STRING_ENTRY_WIDTH)))
        }
        other => Value::Unsupported(other),
    }
}
