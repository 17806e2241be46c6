pub mod setup;

pub use setup::{RunLogGuard, setup_logging};

/// File name of a per-run log: `markscan_{command}_run_{timestamp}.log`.
pub fn run_log_file_name(command: &str, timestamp: &str) -> String {
    format!("markscan_{command}_run_{timestamp}.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_file_name() {
        assert_eq!(
            run_log_file_name("detect", "20250301_101500"),
            "markscan_detect_run_20250301_101500.log"
        );
    }
}
