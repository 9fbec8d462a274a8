/// # Test Utilities Module
///
/// Shared fixtures for unit tests:
/// - scratch database files in a temporary directory
/// - configurations pointing at them
/// - capture of `tracing` output for asserting on lifecycle events

use crate::config::Config;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// A database path inside a private temporary directory.
///
/// The directory and everything the engine wrote into it are removed on drop.
pub struct TempDatabase {
    _dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("bench.db");
        TempDatabase { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default configuration aimed at this database with `rows` inserts
    pub fn config(&self, rows: usize) -> Config {
        let mut config = Config::default();
        config.database.path = self.path.clone();
        config.bench.rows = rows;
        config
    }
}

/// Collects formatted `tracing` output in memory.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with a DEBUG-level subscriber writing into this capture
    pub fn run<F: FnOnce()>(&self, f: F) {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().expect("log capture poisoned");
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("log capture poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
