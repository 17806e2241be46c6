//! Implementation of the 'scales' subcommand.
//!
//! Values go to stdout, one `WIDTHxHEIGHT SCALE` pair per line, so the output
//! can be piped; diagnostics go through the logger on stderr.

use crate::cli::{ScalesArgs, ScalesCommand};
use crate::error::CliResult;

use markscan_core::CoreError;
use markscan_core::calibration::CalibrationStore;
use markscan_core::terminal_output::print_success;

use log::info;
use std::path::Path;

pub fn run_scales(args: ScalesArgs, calibration_file: &Path) -> CliResult<()> {
    let mut store = CalibrationStore::open(calibration_file)?;

    match args.action {
        ScalesCommand::List => {
            if store.entries().is_empty() {
                info!("No scale factors stored in {}", store.path().display());
            }
            for (key, scale) in store.entries() {
                println!("{key} {scale}");
            }
        }
        ScalesCommand::Set { resolution, scale } => {
            store.put(resolution, scale)?;
            print_success(&format!(
                "{resolution} -> {scale} ({})",
                store.path().display()
            ));
        }
        ScalesCommand::Get { resolution } => match store.get(resolution) {
            Some(scale) => println!("{resolution} {scale}"),
            None => {
                return Err(CoreError::OperationFailed(format!(
                    "no scale factor stored for {resolution} in {}",
                    store.path().display()
                )));
            }
        },
    }
    Ok(())
}
