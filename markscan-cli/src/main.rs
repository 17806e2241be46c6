// markscan-cli/src/main.rs
//
// Entry point for the markscan binary.
//
// Responsibilities include:
// - Parsing command-line arguments.
// - Setting up logging to the console and the per-run log file.
// - Invoking the selected command.
// - Mapping the result to a process exit code; a skipped calibration is
//   reported as a warning and is not a failure. Fatal errors are logged so
//   they also reach the run log.

use console::style;
use log::error;
use markscan::logging::init_logging;
use markscan::{RunOutcome, parse_cli, run_command};
use markscan_core::terminal_output::print_warning;
use std::process;

fn main() {
    let cli = parse_cli();

    let guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", style(format!("Error: failed to set up logging: {e}")).red().bold());
            process::exit(1);
        }
    };
    if let Some(path) = guard.log_file() {
        log::debug!("Run log: {}", path.display());
    }

    let outcome = RunOutcome::from_result(run_command(cli));
    if let RunOutcome::CalibrationSkipped(resolution) = &outcome {
        print_warning(&format!("No scale factor for {resolution}; calibration skipped"));
    }

    if let RunOutcome::Failed(message) = &outcome {
        error!("{}", style(format!("Error: {message}")).red().bold());
    }

    let code = outcome.exit_code();
    // process::exit skips destructors; flush the run log first.
    drop(guard);
    process::exit(code);
}
