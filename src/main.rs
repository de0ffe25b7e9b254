use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use wlconfig::cli::{self, Cli};
use wlconfig::constants::EXIT_SUCCESS;
use wlconfig::logger;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli::run(&cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            error!(exit_code = e.exit_code(), "command failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
