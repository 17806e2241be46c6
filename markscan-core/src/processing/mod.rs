//! Calibration search, detection and clip export.
//!
//! The submodules hold the individual stages; [`detect_video`] chains them
//! the way every entry point uses them: resolve the scale for the source's
//! resolution, scan the source at that scale, then merge the detections.

/// Scale search on still images and video sweeps
pub mod scale_search;

/// Fixed-scale detection over a frame source
pub mod scanner;

/// Detection padding and interval merging
pub mod intervals;

/// Interval to clip conversion and export
pub mod clips;

pub use clips::{Clip, ClipExporter, effective_fps, plan_clips};
pub use intervals::{Interval, detection_window, merge_detections, merge_intervals};
pub use scale_search::{
    ImageCalibration, ScaleCandidate, SearchOutcome, SearchSeed, SweepBest, SweepOptions,
    SweepOutcome,
    calibrate_image, search_scale, sweep_video,
};
pub use scanner::{FrameScanner, ScanReport, annotation_dir};

use crate::calibration::{CalibrationStore, Resolution, ScaleProvider};
use crate::config::{DetectionConfig, IntervalPolicy};
use crate::error::CoreResult;
use crate::external::FrameSource;
use crate::matching::Template;
use crate::terminal_output::FrameProgress;

use log::info;
use std::path::PathBuf;

/// Outcome of detecting the marker in one video.
#[derive(Debug, Clone)]
pub struct VideoDetection {
    pub resolution: Resolution,
    pub scale: f64,
    pub report: ScanReport,
    pub intervals: Vec<Interval>,
    /// Where annotated frames (and clips) for this run go
    pub output_dir: PathBuf,
}

/// Resolves the calibrated scale, scans `source` and merges detections.
///
/// Returns [`crate::CoreError::CalibrationUnavailable`] without reading any
/// frame when no scale can be obtained for the source's resolution.
#[allow(clippy::too_many_arguments)]
pub fn detect_video(
    source: &mut dyn FrameSource,
    video_stem: &str,
    template: &Template,
    store: &mut CalibrationStore,
    provider: &mut dyn ScaleProvider,
    config: &DetectionConfig,
    policy: &IntervalPolicy,
    progress: &FrameProgress,
) -> CoreResult<VideoDetection> {
    let resolution = source.resolution();
    let scale = store.resolve_or_prompt(resolution, provider)?;
    info!("Using scale factor {scale:.5} for {resolution}");

    let scanner = FrameScanner::new(template, scale, config.clone())?.annotate_for(video_stem);
    let report = scanner.scan(source, progress)?;
    let intervals = merge_detections(&report.detection_indices(), policy);
    info!(
        "{} detections merged into {} intervals",
        report.detections.len(),
        intervals.len()
    );

    Ok(VideoDetection {
        resolution,
        scale,
        report,
        intervals,
        output_dir: annotation_dir(&config.output_dir, video_stem, scale),
    })
}
