// ============================================================================
// markscan-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: run log naming and logger installation for the CLI
//
// The logger itself is log4rs, configured by markscan-core's file_logging
// module: console output on stderr plus one log file per run unless
// `--no-log` is given.

use crate::cli::Cli;

use log::LevelFilter;
use markscan_core::file_logging::{RunLogGuard, run_log_file_name, setup_logging};
use std::path::PathBuf;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `Debug` with `--verbose`, otherwise `Info`.
pub fn log_level(cli: &Cli) -> LevelFilter {
    if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Path of this run's log file, or `None` with `--no-log`.
pub fn run_log_path(cli: &Cli, timestamp: &str) -> Option<PathBuf> {
    (!cli.no_log).then(|| {
        cli.log_dir
            .join(run_log_file_name(cli.command.name(), timestamp))
    })
}

/// Installs the logger for this run.
pub fn init_logging(cli: &Cli) -> anyhow::Result<RunLogGuard> {
    let log_file = run_log_path(cli, &get_timestamp());
    setup_logging(log_file.as_deref(), log_level(cli))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_cli_from;

    #[test]
    fn test_timestamp_format() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_run_log_path() {
        let cli = parse_cli_from(["markscan", "--log-dir", "logs", "scales", "list"]).unwrap();
        assert_eq!(
            run_log_path(&cli, "20250301_101500"),
            Some(PathBuf::from("logs/markscan_scales_run_20250301_101500.log"))
        );
        assert_eq!(log_level(&cli), LevelFilter::Info);

        let cli = parse_cli_from(["markscan", "scales", "list", "--no-log", "-v"]).unwrap();
        assert_eq!(run_log_path(&cli, "20250301_101500"), None);
        assert_eq!(log_level(&cli), LevelFilter::Debug);
    }
}
