use std::process::ExitCode;
use tracing::{error, info};
use duckbench::{
    bench,
    cli::{self, BenchAction},
    config,
    core::Result,
};

fn run() -> Result<()> {
    let args = cli::parse_bench_args(std::env::args().skip(1))?;
    let config = match &args.config_path {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(config::DEFAULT_CONFIG_FILE)?,
    };

    for action in args.actions {
        match action {
            BenchAction::Write => {
                println!("writing table");
                let report = bench::run_writer(&config)?;
                println!("{}", report);
                report.into_result(&config.bench.table)?;
            }
            BenchAction::Read => {
                let report = bench::run_reader(&config)?;
                println!("{}", report);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Logs go to stderr so the reports on stdout stay clean
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    info!("Starting duckbench...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
