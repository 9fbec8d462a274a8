use std::process::ExitCode;
use tracing::{error, info};
use duckbench::{
    cli::{self, ProbeAction},
    core::Result,
    layout,
};

fn run() -> Result<()> {
    for action in cli::parse_probe_args(std::env::args().skip(1)) {
        match action {
            ProbeAction::PrintSizes => {
                for type_layout in layout::type_layouts() {
                    println!("{}", type_layout);
                }
            }
            ProbeAction::TestStruct => {
                let probe = layout::probe_result_metadata()?;
                println!("{}", probe);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Logs go to stderr so the reports on stdout stay clean
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    info!("Starting structprobe...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
