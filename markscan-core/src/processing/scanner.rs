// ============================================================================
// markscan-core/src/processing/scanner.rs
// ============================================================================
//
// FRAME SCANNER: fixed-scale detection over a whole video
//
// Every frame is decoded so indices stay continuous, but only frames with
// `index >= start_frame && index % stride == 0` are matched. Frames whose
// score is indeterminate count as "no detection" and never become the best
// frame. Each detection writes an annotated copy of the frame to
// `{output_dir}/{video_stem}_scale{scale:.5}/frame_{index}.jpg`.

use crate::config::DetectionConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::FrameSource;
use crate::matching::{MatchResult, ScaledTemplate, Template, annotate_match};
use crate::terminal_output::FrameProgress;
use crate::utils::format_scale;

use image::imageops::grayscale;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory for one video's annotated detections at one scale.
pub fn annotation_dir(output_dir: &Path, video_stem: &str, scale: f64) -> PathBuf {
    output_dir.join(format!("{video_stem}_scale{}", format_scale(scale)))
}

/// Everything a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Matches at or above the threshold, in frame order
    pub detections: Vec<MatchResult>,
    /// Highest determinate score over all evaluated frames, even below threshold
    pub best: Option<MatchResult>,
    pub frames_decoded: u64,
    pub frames_evaluated: u64,
    /// Annotated frames written
    pub annotated: Vec<PathBuf>,
}

impl ScanReport {
    pub fn detection_indices(&self) -> Vec<u64> {
        self.detections.iter().map(|d| d.frame_index).collect()
    }
}

/// Matches one pre-scaled template against a stream of frames.
pub struct FrameScanner {
    template: ScaledTemplate,
    config: DetectionConfig,
    annotate_to: Option<PathBuf>,
}

impl FrameScanner {
    /// Prepares the template at `scale`.
    ///
    /// Fails with [`CoreError::InvalidScale`] when the scale is not positive
    /// or produces a degenerate template.
    pub fn new(template: &Template, scale: f64, config: DetectionConfig) -> CoreResult<Self> {
        config.validate()?;
        let scaled = template.scaled(scale).ok_or(CoreError::InvalidScale(scale))?;
        let (w, h) = scaled.dimensions();
        debug!("Scanner template at scale {}: {w}x{h}", format_scale(scale));
        Ok(Self {
            template: scaled,
            config,
            annotate_to: None,
        })
    }

    /// Writes annotated detections under [`annotation_dir`] for `video_stem`.
    pub fn annotate_for(mut self, video_stem: &str) -> Self {
        self.annotate_to = Some(annotation_dir(
            &self.config.output_dir,
            video_stem,
            self.template.scale(),
        ));
        self
    }

    pub fn scale(&self) -> f64 {
        self.template.scale()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Reads `source` to the end and returns every detection.
    pub fn scan(&self, source: &mut dyn FrameSource, progress: &FrameProgress) -> CoreResult<ScanReport> {
        let resolution = source.resolution();
        if !self.template.fits(resolution.width, resolution.height) {
            let (w, h) = self.template.dimensions();
            return Err(CoreError::Config(format!(
                "template at scale {} is {w}x{h}, larger than {resolution} frames",
                format_scale(self.scale())
            )));
        }
        if let Some(dir) = &self.annotate_to {
            fs::create_dir_all(dir)?;
        }

        let threshold = self.config.threshold;
        let mut report = ScanReport::default();
        let mut index = 0u64;

        while let Some(frame) = source.next_frame()? {
            let current = index;
            index += 1;
            report.frames_decoded = index;
            progress.set_position(index);

            if !self.config.samples_frame(current) {
                continue;
            }
            report.frames_evaluated += 1;

            let result = self.template.match_in(current, &grayscale(&frame));
            if !result.is_determinate() {
                continue;
            }
            if report.best.is_none_or(|best| result.score > best.score) {
                report.best = Some(result);
            }
            if result.score < threshold {
                continue;
            }

            info!(
                "[DETECT] frame {current} score {:.5} at ({}, {})",
                result.score, result.location.0, result.location.1
            );
            report.detections.push(result);
            progress.set_message(format!("{} detections", report.detections.len()));

            if let Some(dir) = &self.annotate_to {
                let path = dir.join(format!("frame_{current}.jpg"));
                match annotate_match(&frame, &result).save(&path) {
                    Ok(()) => report.annotated.push(path),
                    Err(e) => warn!("Failed to write {}: {e}", path.display()),
                }
            }
        }
        progress.finish();

        match &report.best {
            Some(best) => info!(
                "Scanned {} of {} frames; best score {:.5} at frame {}",
                report.frames_evaluated, report.frames_decoded, best.score, best.frame_index
            ),
            None => info!(
                "Scanned {} of {} frames; no determinate score",
                report.frames_evaluated, report.frames_decoded
            ),
        }
        Ok(report)
    }
}
