use clap::Parser;
use sortdir::cli::{Cli, run_cli};
use sortdir::logging::init_logging;
use sortdir::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
