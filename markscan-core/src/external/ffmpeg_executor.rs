// ============================================================================
// markscan-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: process abstraction and the stream-copy trim command
//
// KEY COMPONENTS:
// - FfmpegProcess: an active ffmpeg process
// - FfmpegSpawner: creates processes from an FfmpegCommand
// - SidecarSpawner: concrete implementation using ffmpeg-sidecar
// - trim_clip: lossless `-c copy` trim of a time range

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::path::Path;
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around the ffmpeg-sidecar child implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            command_failed_error("ffmpeg (sidecar - get iter)", ExitStatus::default(), e.to_string())
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Clip Trimming ---

/// Builds `ffmpeg -y -ss START -i INPUT -t DURATION -c copy OUTPUT`.
///
/// Times are passed as already formatted strings so that the exact values
/// handed to ffmpeg are decided by the caller.
pub fn build_trim_command(input: &Path, start: &str, duration: &str, output: &Path) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.overwrite();
    cmd.arg("-ss");
    cmd.arg(start);
    cmd.input(input.to_string_lossy().as_ref());
    cmd.arg("-t");
    cmd.arg(duration);
    cmd.arg("-c");
    cmd.arg("copy");
    cmd.output(output.to_string_lossy().as_ref());
    cmd
}

/// Trims `[start, start + duration)` of `input` into `output` without re-encoding.
///
/// Drains ffmpeg's event stream before waiting so the pipes never fill up.
/// A non-zero exit becomes [`crate::CoreError::CommandFailed`] carrying the
/// error lines ffmpeg logged.
pub fn trim_clip<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    start: &str,
    duration: &str,
    output: &Path,
) -> CoreResult<()> {
    let cmd = build_trim_command(input, start, duration, output);
    log::debug!("Running trim command: {cmd:?}");

    let mut process = spawner.spawn(cmd)?;
    let mut errors: Vec<String> = Vec::new();
    process.handle_events(|event| {
        match event {
            FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => {
                log::debug!("ffmpeg: {msg}");
                errors.push(msg);
            }
            _ => {}
        }
        Ok(())
    })?;

    let status = process.wait()?;
    if !status.success() {
        let stderr = if errors.is_empty() {
            "no error output".to_string()
        } else {
            errors.join("; ")
        };
        return Err(command_failed_error("ffmpeg (trim)", status, stderr));
    }
    Ok(())
}
