/// Database and Connection Management Module
///
/// Owns the two outermost engine handles. `Database` wraps
/// `duckdb_database`, `Connection` wraps `duckdb_connection` and borrows the
/// database it was created from.

use crate::core::{BenchError, Result};
use duckdb::ffi;
use std::collections::BTreeMap;
use std::ffi::{c_void, CStr, CString};
use std::marker::PhantomData;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;
use std::rc::Rc;
use tracing::{debug, info};

/// Label used in logs and errors for databases that live only in memory
pub const IN_MEMORY: &str = ":memory:";

/// Takes ownership of an engine-allocated error string.
///
/// # Safety
///
/// `err` must be null or a string allocated by the engine that has not been
/// freed yet.
unsafe fn take_error(err: *mut c_char) -> String {
    if err.is_null() {
        return "unknown error".to_string();
    }
    let message = CStr::from_ptr(err).to_string_lossy().into_owned();
    ffi::duckdb_free(err as *mut c_void);
    message
}

/// Engine configuration applied when a database is opened.
///
/// Wraps `duckdb_config`; the object is destroyed when the guard drops.
pub struct DbConfig {
    raw: ffi::duckdb_config,
}

impl DbConfig {
    /// Allocates an empty configuration object
    pub fn new() -> Result<Self> {
        let mut raw: ffi::duckdb_config = ptr::null_mut();
        let state = unsafe { ffi::duckdb_create_config(&mut raw) };
        let config = DbConfig { raw };
        if state != ffi::DuckDBSuccess {
            return Err(BenchError::Config(
                "engine could not allocate a configuration object".to_string(),
            ));
        }
        Ok(config)
    }

    /// Sets a single engine option, e.g. `threads = "1"`.
    ///
    /// The engine rejects unknown option names and values it cannot parse.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let c_name = CString::new(name)?;
        let c_value = CString::new(value)?;
        let state =
            unsafe { ffi::duckdb_set_config(self.raw, c_name.as_ptr(), c_value.as_ptr()) };
        if state != ffi::DuckDBSuccess {
            return Err(BenchError::Config(format!(
                "engine rejected setting {} = '{}'",
                name, value
            )));
        }
        Ok(())
    }

    /// Builds a configuration from a name/value map
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = DbConfig::new()?;
        for (name, value) in settings {
            config.set(name, value)?;
        }
        Ok(config)
    }
}

impl Drop for DbConfig {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_config(&mut self.raw) };
    }
}

/// An open database.
///
/// Closing happens when the value is dropped. Connections borrow the
/// database, so it cannot be dropped while any connection is alive.
pub struct Database {
    raw: ffi::duckdb_database,
    path: String,
    _nosend: PhantomData<Rc<()>>,
}

impl Database {
    /// Opens (or creates) the database file at `path`
    ///
    /// # Returns
    ///
    /// The open database, or `BenchError::OpenFailed` with the engine's
    /// diagnostic.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_settings(Some(path.as_ref()), &BTreeMap::new())
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with_settings(None, &BTreeMap::new())
    }

    /// Opens a database, applying engine `settings` first.
    ///
    /// `None` for `path` opens an in-memory database.
    pub fn open_with_settings(
        path: Option<&Path>,
        settings: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let label = match path {
            Some(p) => p
                .to_str()
                .ok_or_else(|| {
                    BenchError::InvalidArgument(format!("database path {:?} is not UTF-8", p))
                })?
                .to_string(),
            None => IN_MEMORY.to_string(),
        };
        let c_path = match path {
            Some(_) => Some(CString::new(label.as_str())?),
            None => None,
        };
        let path_ptr = c_path.as_ref().map_or(ptr::null(), |p| p.as_ptr());

        let config = DbConfig::from_settings(settings)?;

        let mut raw: ffi::duckdb_database = ptr::null_mut();
        let mut err: *mut c_char = ptr::null_mut();
        let state = unsafe { ffi::duckdb_open_ext(path_ptr, &mut raw, config.raw, &mut err) };
        if state != ffi::DuckDBSuccess {
            let message = unsafe { take_error(err) };
            // Null-safe: releases a partially created handle, if any.
            unsafe { ffi::duckdb_close(&mut raw) };
            return Err(BenchError::OpenFailed {
                path: label,
                message,
            });
        }

        info!("Opened database {}", label);
        Ok(Database {
            raw,
            path: label,
            _nosend: PhantomData,
        })
    }

    /// Closes the database. Same as dropping it.
    pub fn close(self) {}

    /// Path the database was opened from, or `:memory:`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Opens a new connection on this database
    pub fn connect(&self) -> Result<Connection<'_>> {
        let mut raw: ffi::duckdb_connection = ptr::null_mut();
        let state = unsafe { ffi::duckdb_connect(self.raw, &mut raw) };
        if state != ffi::DuckDBSuccess {
            unsafe { ffi::duckdb_disconnect(&mut raw) };
            return Err(BenchError::ConnectFailed(format!(
                "engine rejected a connection to {}",
                self.path
            )));
        }
        debug!("acquired connection to {}", self.path);
        Ok(Connection {
            raw,
            _db: PhantomData,
            _nosend: PhantomData,
        })
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_close(&mut self.raw) };
        debug!("released database {}", self.path);
    }
}

/// A connection bound to one `Database`.
///
/// A connection cannot outlive its database:
///
/// ```compile_fail
/// use duckbench::core::db::Database;
///
/// let conn = {
///     let db = Database::open_in_memory().unwrap();
///     db.connect().unwrap()
/// };
/// ```
///
/// nor can the database be closed under it:
///
/// ```compile_fail
/// use duckbench::core::db::Database;
///
/// let db = Database::open_in_memory().unwrap();
/// let conn = db.connect().unwrap();
/// drop(db);
/// conn.execute("SELECT 1").unwrap();
/// ```
pub struct Connection<'db> {
    pub(super) raw: ffi::duckdb_connection,
    _db: PhantomData<&'db Database>,
    _nosend: PhantomData<Rc<()>>,
}

impl Connection<'_> {
    /// Closes the connection. Same as dropping it.
    pub fn disconnect(self) {}
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_disconnect(&mut self.raw) };
        debug!("released connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Value;
    use crate::test_utils::TempDatabase;

    #[test]
    fn test_open_in_memory_and_connect() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.path(), IN_MEMORY);
        let conn = db.connect().unwrap();
        conn.execute("SELECT 1").unwrap();
        conn.disconnect();
        db.close();
    }

    #[test]
    fn test_multiple_connections_share_database() {
        let db = Database::open_in_memory().unwrap();
        let writer = db.connect().unwrap();
        let reader = db.connect().unwrap();

        writer.execute("CREATE TABLE shared (id INTEGER)").unwrap();
        writer.execute("INSERT INTO shared VALUES (1), (2)").unwrap();

        let result = reader.query("SELECT * FROM shared").unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn test_file_database_persists_across_reopen() {
        let fixture = TempDatabase::new();
        {
            let db = Database::open(fixture.path()).unwrap();
            let conn = db.connect().unwrap();
            conn.execute("CREATE TABLE kv (k TEXT, v INTEGER)").unwrap();
            conn.execute("INSERT INTO kv VALUES ('a', 1)").unwrap();
        }

        let db = Database::open(fixture.path()).unwrap();
        assert_eq!(Some(db.path()), fixture.path().to_str());
        let conn = db.connect().unwrap();
        let result = conn.query("SELECT * FROM kv").unwrap();
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn test_open_error_handling() {
        let result = Database::open("/nonexistent/dir/database.db");
        match result {
            Err(BenchError::OpenFailed { path, message }) => {
                assert_eq!(path, "/nonexistent/dir/database.db");
                assert!(!message.is_empty());
            }
            Err(other) => panic!("Expected OpenFailed, got {other}"),
            Ok(_) => panic!("Expected OpenFailed, got an open database"),
        }
    }

    #[test]
    fn test_path_with_interior_nul_is_rejected() {
        match Database::open("bad\0path.db") {
            Err(BenchError::InvalidArgument(_)) => {}
            _ => panic!("Expected InvalidArgument error"),
        }
    }

    #[test]
    fn test_settings_are_applied() {
        let mut settings = BTreeMap::new();
        settings.insert("threads".to_string(), "1".to_string());
        let db = Database::open_with_settings(None, &settings).unwrap();
        let conn = db.connect().unwrap();
        let result = conn.query("SELECT current_setting('threads')").unwrap();
        let row = result.chunk(0).unwrap().row(0).unwrap();
        // The setting comes back as a number or as text depending on the
        // engine version.
        assert!(
            row == vec![Value::BigInt(1)] || row == vec![Value::Varchar("1".to_string())],
            "unexpected threads setting: {:?}",
            row
        );
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        let mut settings = BTreeMap::new();
        settings.insert("no_such_option".to_string(), "1".to_string());
        // Depending on the engine version the option is refused when set or
        // when the database is opened with it.
        match Database::open_with_settings(None, &settings) {
            Err(BenchError::Config(msg)) => assert!(msg.contains("no_such_option")),
            Err(BenchError::OpenFailed { .. }) => {}
            _ => panic!("Expected the unknown setting to be refused"),
        }
    }
}
