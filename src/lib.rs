// Core infrastructure modules
pub mod core;

// Benchmark and probe modules
pub mod bench;
pub mod cli;
pub mod config;
pub mod layout;

#[cfg(test)]
mod test_utils;
