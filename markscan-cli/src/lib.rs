// markscan-cli/src/lib.rs
//
// Library portion of the Markscan CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, parse_cli, parse_cli_from};
pub use error::{CliResult, RunOutcome};

use std::path::Path;

/// Dispatches a parsed command line to its command.
pub fn run_command(cli: Cli) -> CliResult<()> {
    let calibration_file: &Path = &cli.calibration_file;
    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run_calibrate(args, calibration_file),
        Commands::Sweep(args) => commands::sweep::run_sweep(args, calibration_file),
        Commands::Detect(args) => commands::detect::run_detect(args, calibration_file),
        Commands::Extract(args) => commands::extract::run_extract(args, calibration_file),
        Commands::Scales(args) => commands::scales::run_scales(args, calibration_file),
    }
}
