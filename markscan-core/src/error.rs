//! Error types for the markscan-core library.
//!
//! All fallible operations return [`CoreResult`]. Per-frame and per-scale
//! problems are handled locally by the scanners and never surface here;
//! these variants describe failures of a whole operation or source.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Error type for all core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot read source '{path}': {reason}")]
    SourceUnreadable { path: String, reason: String },

    #[error("No calibrated scale factor available for resolution {0}")]
    CalibrationUnavailable(String),

    #[error("Invalid scale factor {0}: must be a positive finite number")]
    InvalidScale(f64),

    #[error("Calibration file error: {0}")]
    CalibrationFile(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Command '{cmd}' failed with status {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Clip {index} export failed: {reason}")]
    ClipExportFailed { index: usize, reason: String },

    #[error("Required external dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("ffprobe output parse error: {0}")]
    FfprobeParse(String),

    #[error("Video info error: {0}")]
    VideoInfoError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No processable video files found")]
    NoFilesFound,

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type alias used throughout the library.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::JsonParseError(err.to_string())
    }
}

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

/// Builds a [`CoreError::SourceUnreadable`] for a path.
pub fn source_unreadable(path: &std::path::Path, reason: impl std::fmt::Display) -> CoreError {
    CoreError::SourceUnreadable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
