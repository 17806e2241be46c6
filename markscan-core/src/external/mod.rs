// ============================================================================
// markscan-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: ffmpeg and ffprobe
//
// Decoding, probing and trimming are delegated to ffmpeg/ffprobe. Everything
// that talks to a subprocess sits behind a trait here so the detection and
// export code can be driven by in-memory fakes in tests.
//
// KEY COMPONENTS:
// - FfmpegSpawner / FfmpegProcess: process abstraction used for clip trimming
// - FrameSource: sequential decoded RGB frames
// - probe_video: resolution and frame-rate metadata
// - check_dependency: availability of the ffmpeg/ffprobe binaries

use crate::error::{CoreError, CoreResult};

use std::io;
use std::process::{Command, Stdio};

pub mod ffmpeg_executor;
pub mod ffprobe_executor;
pub mod frame_source;

pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, trim_clip};
pub use ffprobe_executor::{VideoMetadata, probe_video};
pub use frame_source::{FrameSource, SidecarFrameSource};

/// Checks that `cmd_name` can be started with `-version`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

/// Checks for both ffmpeg and ffprobe.
pub fn check_media_dependencies() -> CoreResult<()> {
    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;
    Ok(())
}
