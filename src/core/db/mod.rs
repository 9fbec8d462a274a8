/// Database Module
///
/// A thin synchronous facade over DuckDB's C API. Every engine handle is
/// owned by a guard that releases it exactly once when dropped, so handles
/// are freed on every exit path, error returns included.
///
/// ## Architecture
///
/// - **Database and connections** (`database.rs`): open/close, connect/disconnect
/// - **Query results** (`query.rs`): statement execution and result metadata
/// - **Data chunks** (`chunk.rs`): columnar batches, vectors and validity masks
/// - **Logical types** (`types.rs`): type tags and the per-type decode table
///
/// ## Ownership
///
/// Guards borrow their owner: a `Connection` borrows its `Database`, a
/// `QueryResult` its `Connection`, a `DataChunk` its `QueryResult`. The
/// borrow checker therefore rejects any attempt to release an owner while a
/// dependent handle is alive, and drops run in reverse acquisition order.
pub mod chunk;
pub mod database;
pub mod query;
pub mod types;

pub use chunk::*;
pub use database::*;
pub use query::*;
pub use types::*;
