/// Data Chunk Module
///
/// Columnar access to a result: a `DataChunk` is a batch of at most
/// `vector_size()` rows, a `Vector` one column of it, and `Validity` the
/// vector's packed null mask.

use super::types::{self, LogicalType, Value};
use duckdb::ffi;
use std::marker::PhantomData;
use std::os::raw::c_void;
use std::rc::Rc;
use tracing::debug;

/// Maximum number of rows in a data chunk
pub fn vector_size() -> usize {
    unsafe { ffi::duckdb_vector_size() as usize }
}

/// A data chunk fetched from a `QueryResult`.
///
/// The chunk is destroyed when dropped.
pub struct DataChunk<'res> {
    raw: ffi::duckdb_data_chunk,
    _result: PhantomData<&'res ()>,
    _nosend: PhantomData<Rc<()>>,
}

impl<'res> DataChunk<'res> {
    /// Wraps a chunk handle, returning `None` for a null handle.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a chunk the caller owns and that is valid for
    /// `'res`.
    pub(super) unsafe fn from_raw(raw: ffi::duckdb_data_chunk) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        debug!("acquired data chunk");
        Some(DataChunk {
            raw,
            _result: PhantomData,
            _nosend: PhantomData,
        })
    }

    /// Number of rows in this chunk
    pub fn size(&self) -> usize {
        unsafe { ffi::duckdb_data_chunk_get_size(self.raw) as usize }
    }

    /// Number of columns in this chunk
    pub fn column_count(&self) -> usize {
        unsafe { ffi::duckdb_data_chunk_get_column_count(self.raw) as usize }
    }

    /// The vector holding column `column`
    pub fn vector(&self, column: usize) -> Option<Vector<'_>> {
        if column >= self.column_count() {
            return None;
        }
        let raw = unsafe { ffi::duckdb_data_chunk_get_vector(self.raw, column as ffi::idx_t) };
        if raw.is_null() {
            return None;
        }
        Some(Vector {
            raw,
            len: self.size(),
            _chunk: PhantomData,
        })
    }

    /// All vectors, in column order
    pub fn vectors(&self) -> impl Iterator<Item = Vector<'_>> + '_ {
        (0..self.column_count()).filter_map(move |c| self.vector(c))
    }

    /// Decodes row `row` across all columns
    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.size() {
            return None;
        }
        self.vectors().map(|v| v.value(row)).collect()
    }
}

impl Drop for DataChunk<'_> {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_data_chunk(&mut self.raw) };
        debug!("released data chunk");
    }
}

/// One column of a data chunk. Owned by the chunk; nothing to release.
pub struct Vector<'chunk> {
    raw: ffi::duckdb_vector,
    len: usize,
    _chunk: PhantomData<&'chunk ()>,
}

impl<'chunk> Vector<'chunk> {
    /// Number of entries (the chunk's size)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Logical type tag of the column
    pub fn logical_type(&self) -> LogicalType {
        unsafe {
            let mut handle = ffi::duckdb_vector_get_column_type(self.raw);
            let id = ffi::duckdb_get_type_id(handle);
            ffi::duckdb_destroy_logical_type(&mut handle);
            LogicalType::from_raw(id)
        }
    }

    /// Raw data buffer. Its layout depends on `logical_type()`.
    pub fn data_ptr(&self) -> *const c_void {
        unsafe { ffi::duckdb_vector_get_data(self.raw) as *const c_void }
    }

    /// The validity mask; all rows are valid when the engine keeps none
    pub fn validity(&self) -> Validity<'chunk> {
        let ptr = unsafe { ffi::duckdb_vector_get_validity(self.raw) };
        if ptr.is_null() {
            return Validity::all_valid(self.len);
        }
        let words = unsafe {
            std::slice::from_raw_parts(ptr as *const u64, Validity::word_count(self.len))
        };
        Validity {
            words: Some(words),
            len: self.len,
        }
    }

    /// Decodes entry `row`, `None` past the end
    pub fn value(&self, row: usize) -> Option<Value> {
        if row >= self.len {
            return None;
        }
        if !self.validity().is_valid(row) {
            return Some(Value::Null);
        }
        let data = self.data_ptr();
        if data.is_null() {
            return Some(Value::Unsupported(self.logical_type()));
        }
        Some(unsafe { types::decode(self.logical_type(), data, row) })
    }

    /// Decodes every entry
    pub fn values(&self) -> Vec<Value> {
        let ty = self.logical_type();
        let validity = self.validity();
        let data = self.data_ptr();
        (0..self.len)
            .map(|row| {
                if !validity.is_valid(row) {
                    Value::Null
                } else if data.is_null() {
                    Value::Unsupported(ty)
                } else {
                    unsafe { types::decode(ty, data, row) }
                }
            })
            .collect()
    }
}

/// Packed validity bitmap: one bit per row in 64-bit words, 1 = valid.
#[derive(Debug, Clone, Copy)]
pub struct Validity<'a> {
    words: Option<&'a [u64]>,
    len: usize,
}

impl<'a> Validity<'a> {
    /// Words needed to cover `len` rows
    pub fn word_count(len: usize) -> usize {
        len.div_ceil(64)
    }

    /// A mask with no nulls
    pub fn all_valid(len: usize) -> Self {
        Validity { words: None, len }
    }

    /// Views `words` as the mask of `len` rows.
    ///
    /// Returns `None` when `words` holds fewer than `word_count(len)` entries.
    pub fn from_words(words: &'a [u64], len: usize) -> Option<Self> {
        if words.len() < Self::word_count(len) {
            return None;
        }
        Some(Validity {
            words: Some(words),
            len,
        })
    }

    /// Whether the engine allocated a mask at all
    pub fn is_present(&self) -> bool {
        self.words.is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `row` holds a value; rows past the end are never valid
    pub fn is_valid(&self, row: usize) -> bool {
        if row >= self.len {
            return false;
        }
        match self.words {
            None => true,
            Some(words) => (words[row / 64] >> (row % 64)) & 1 == 1,
        }
    }

    /// Number of null rows
    pub fn null_count(&self) -> usize {
        (0..self.len).filter(|&row| !self.is_valid(row)).count()
    }
}
