//! FFprobe integration for video metadata.
//!
//! Only what detection and clip export need is extracted: frame dimensions,
//! frame rate and (when the container reports it) the frame count.

use crate::calibration::Resolution;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::utils::parse_frame_rate;

use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Properties of a video's first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub resolution: Resolution,
    /// Average (or, failing that, real base) frame rate; `None` if unusable
    pub fps: Option<f64>,
    /// Frame count from the stream header, if present
    pub total_frames: Option<u64>,
    /// Container duration in seconds
    pub duration_secs: Option<f64>,
}

/// Probes `input_path` for the metadata of its first video stream.
pub fn probe_video(input_path: &Path) -> CoreResult<VideoMetadata> {
    log::debug!("Running ffprobe for video metadata on: {}", input_path.display());

    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!("ffprobe failed on {}: {err:?}", input_path.display());
        map_ffprobe_error(err, "video metadata")
    })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::VideoInfoError(format!("No video stream found in {}", input_path.display()))
        })?;

    let (width, height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
        (w, h) => {
            return Err(CoreError::VideoInfoError(format!(
                "Invalid dimensions in {}: width={w:?}, height={h:?}",
                input_path.display()
            )));
        }
    };

    let fps = parse_frame_rate(&video_stream.avg_frame_rate)
        .or_else(|| parse_frame_rate(&video_stream.r_frame_rate));
    if fps.is_none() {
        log::warn!(
            "No usable frame rate for {} (avg={}, r={})",
            input_path.display(),
            video_stream.avg_frame_rate,
            video_stream.r_frame_rate
        );
    }

    let total_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|f| f.parse::<u64>().ok());

    let duration_secs = metadata
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoMetadata {
        resolution: Resolution::new(width, height),
        fps,
        total_frames,
        duration_secs,
    })
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::JsonParseError(format!("ffprobe {context} output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}
