//! Argument handling shared by both binaries.
//!
//! Each argument is an action selected by its first character; arguments
//! run left to right and unrecognised ones are skipped.
use crate::core::{BenchError, Result};
use std::path::PathBuf;
use tracing::debug;

/// Flag naming an alternative configuration file
pub const CONFIG_FLAG: &str = "--config";

/// Actions of the `duckbench` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchAction {
    /// `r`: read the benchmark table chunk by chunk
    Read,
    /// `w`: create the benchmark table and insert rows one at a time
    Write,
}

/// Actions of the `structprobe` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeAction {
    /// `t`: read result metadata through the accessor functions
    TestStruct,
    /// `p`: print size and alignment of the C API types
    PrintSizes,
}

/// Parsed `duckbench` command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchArgs {
    pub config_path: Option<PathBuf>,
    pub actions: Vec<BenchAction>,
}

/// Parses `duckbench` arguments (program name excluded)
pub fn parse_bench_args<I, S>(args: I) -> Result<BenchArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = BenchArgs::default();
    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        if arg == CONFIG_FLAG {
            let path = args.next().ok_or_else(|| {
                BenchError::InvalidArgument(format!("{} requires a path", CONFIG_FLAG))
            })?;
            parsed.config_path = Some(PathBuf::from(path));
            continue;
        }
        match arg.chars().next() {
            Some('r') => parsed.actions.push(BenchAction::Read),
            Some('w') => parsed.actions.push(BenchAction::Write),
            _ => debug!("Ignoring unrecognised argument '{}'", arg),
        }
    }
    Ok(parsed)
}

/// Parses `structprobe` arguments (program name excluded)
pub fn parse_probe_args<I, S>(args: I) -> Vec<ProbeAction>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .filter_map(|arg: String| match arg.chars().next() {
            Some('t') => Some(ProbeAction::TestStruct),
            Some('p') => Some(ProbeAction::PrintSizes),
            _ => {
                debug!("Ignoring unrecognised argument '{}'", arg);
                None
            }
        })
        .collect()
}
