use crate::core::{BenchError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "duckbench.toml";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bench: BenchConfig,
}

/// Database-related configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, relative to the working directory
    pub path: PathBuf,
    /// Engine options applied when the database is opened
    pub settings: BTreeMap<String, String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: PathBuf::from("test.db"),
            settings: BTreeMap::new(),
        }
    }
}

/// Benchmark workload configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    /// Table written by `w` and read by `r`
    pub table: String,
    /// Number of single-row inserts issued by `w`
    pub rows: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            table: "test_tbl".to_string(),
            rows: 10_000,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Checks the values the benchmark relies on
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(BenchError::Config("database.path must not be empty".to_string()));
        }
        if self.bench.rows == 0 {
            return Err(BenchError::Config("bench.rows must be greater than 0".to_string()));
        }
        // The table name is spliced into SQL text.
        if !is_identifier(&self.bench.table) {
            return Err(BenchError::Config(format!(
                "bench.table '{}' is not a plain identifier",
                self.bench.table
            )));
        }
        Ok(())
    }
}

/// Parses and validates configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = duckbench::config::load_config("duckbench.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like `load_config`, but a missing file yields the defaults.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
[database]
path = "bench.duckdb"

[database.settings]
threads = "2"
access_mode = "READ_WRITE"

[bench]
table = "ducks"
rows = 500
"#;

    #[test]
    fn test_load_config_from_str() {
        let config = parse_config(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.path, PathBuf::from("bench.duckdb"));
        assert_eq!(config.database.settings.len(), 2);
        assert_eq!(config.database.settings["threads"], "2");
        assert_eq!(config.bench.table, "ducks");
        assert_eq!(config.bench.rows, 500);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.path, PathBuf::from("test.db"));
        assert_eq!(config.bench.table, "test_tbl");
        assert_eq!(config.bench.rows, 10_000);

        let partial = parse_config("[bench]\nrows = 3\n").unwrap();
        assert_eq!(partial.bench.rows, 3);
        assert_eq!(partial.bench.table, "test_tbl");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            parse_config("[bench]\nrows = 0\n"),
            Err(BenchError::Config(_))
        ));
        assert!(matches!(
            parse_config("[bench]\ntable = \"t; DROP TABLE x\"\n"),
            Err(BenchError::Config(_))
        ));
        assert!(matches!(
            parse_config("[database]\npath = \"\"\n"),
            Err(BenchError::Config(_))
        ));
        assert!(matches!(
            parse_config("[bench]\nrows = \"many\"\n"),
            Err(BenchError::Toml(_))
        ));
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("test_tbl"));
        assert!(is_identifier("_t1"));
        assert!(!is_identifier("1t"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duckbench.toml");

        assert_eq!(load_or_default(&path).unwrap(), Config::default());
        assert!(matches!(load_config(&path), Err(BenchError::Io(_))));

        let mut file = fs::File::create(&path).unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        drop(file);

        assert_eq!(load_or_default(&path).unwrap().bench.rows, 500);
    }
}
