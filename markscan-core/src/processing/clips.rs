// ============================================================================
// markscan-core/src/processing/clips.rs
// ============================================================================
//
// CLIP EXPORT: merged frame intervals -> stream-copied video clips
//
// Frame intervals are converted to seconds with the source frame rate
// (falling back to DEFAULT_FALLBACK_FPS when it is missing or not positive)
// and formatted with two decimals for ffmpeg. Clips are numbered from 1 as
// clip_001.mp4, clip_002.mp4, ... A failing trim is reported for that clip
// only; the remaining clips are still exported.

use super::intervals::Interval;
use crate::config::DEFAULT_FALLBACK_FPS;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, trim_clip};
use crate::utils::format_seconds;

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// One planned or exported clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// 1-based sequence number
    pub number: usize,
    pub interval: Interval,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub output: PathBuf,
}

impl Clip {
    /// Start time exactly as passed to the trimmer.
    pub fn start_arg(&self) -> String {
        format_seconds(self.start_secs)
    }

    /// Duration exactly as passed to the trimmer.
    pub fn duration_arg(&self) -> String {
        format_seconds(self.duration_secs)
    }
}

/// Frame rate used for timing: `fps` when finite and positive, else the fallback.
pub fn effective_fps(fps: Option<f64>) -> f64 {
    match fps {
        Some(f) if f.is_finite() && f > 0.0 => f,
        _ => DEFAULT_FALLBACK_FPS,
    }
}

/// Computes clip timings and output paths without running anything.
pub fn plan_clips(intervals: &[Interval], fps: Option<f64>, output_dir: &Path) -> Vec<Clip> {
    let fps = effective_fps(fps);
    intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let number = i + 1;
            Clip {
                number,
                interval: *interval,
                start_secs: interval.start as f64 / fps,
                duration_secs: (interval.end - interval.start) as f64 / fps,
                output: output_dir.join(format!("clip_{number:03}.mp4")),
            }
        })
        .collect()
}

/// Exports clips of one source video through an [`FfmpegSpawner`].
pub struct ClipExporter<'a, S: FfmpegSpawner> {
    spawner: &'a S,
    source: &'a Path,
}

impl<'a, S: FfmpegSpawner> ClipExporter<'a, S> {
    pub fn new(spawner: &'a S, source: &'a Path) -> Self {
        Self { spawner, source }
    }

    /// Trims every clip in order. The returned vector has one entry per
    /// clip; failures are [`CoreError::ClipExportFailed`].
    pub fn export(&self, clips: &[Clip]) -> Vec<CoreResult<Clip>> {
        clips.iter().map(|clip| self.export_one(clip)).collect()
    }

    fn export_one(&self, clip: &Clip) -> CoreResult<Clip> {
        let failed = |reason: String| CoreError::ClipExportFailed {
            index: clip.number,
            reason,
        };

        if let Some(parent) = clip.output.parent() {
            fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }

        match trim_clip(
            self.spawner,
            self.source,
            &clip.start_arg(),
            &clip.duration_arg(),
            &clip.output,
        ) {
            Ok(()) => {
                info!(
                    "Clip {:03}: frames {} -> {} (start {}s, {}s)",
                    clip.number,
                    clip.interval,
                    clip.output.display(),
                    clip.start_arg(),
                    clip.duration_arg()
                );
                Ok(clip.clone())
            }
            Err(e) => {
                warn!("Clip {:03} ({}) failed: {e}", clip.number, clip.interval);
                Err(failed(e.to_string()))
            }
        }
    }
}
