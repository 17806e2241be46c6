// ============================================================================
// markscan-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result type and exit codes for the CLI
//
// Commands return the core error type unchanged. `main` maps the outcome to
// a process exit code: an unavailable calibration is a skipped run, not a
// failure.

use markscan_core::{CoreError, CoreResult};

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// How a finished command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// No scale could be obtained for the named resolution
    CalibrationSkipped(String),
    Failed(String),
}

impl RunOutcome {
    pub fn from_result(result: CliResult<()>) -> Self {
        match result {
            Ok(()) => RunOutcome::Success,
            Err(CoreError::CalibrationUnavailable(resolution)) => {
                RunOutcome::CalibrationSkipped(resolution)
            }
            Err(e) => RunOutcome::Failed(e.to_string()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success | RunOutcome::CalibrationSkipped(_) => 0,
            RunOutcome::Failed(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_unavailable_exits_zero() {
        let outcome =
            RunOutcome::from_result(Err(CoreError::CalibrationUnavailable("1280x720".into())));
        assert_eq!(outcome, RunOutcome::CalibrationSkipped("1280x720".into()));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_other_errors_exit_one() {
        let outcome = RunOutcome::from_result(Err(CoreError::InvalidScale(-1.0)));
        assert!(matches!(outcome, RunOutcome::Failed(ref msg) if msg.contains("-1")));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(RunOutcome::from_result(Ok(())).exit_code(), 0);
    }
}
