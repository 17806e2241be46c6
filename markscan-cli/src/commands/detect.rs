//! Implementation of the 'detect' subcommand.
//!
//! Resolves the calibrated scale for each input video, scans it and reports
//! the merged detection intervals. Annotated frames are written under the
//! output directory. A directory input is processed video by video; one
//! failing video does not stop the others.

use super::ProviderSource;
use crate::cli::DetectArgs;
use crate::error::CliResult;

use markscan_core::calibration::{CalibrationStore, ScaleProvider};
use markscan_core::config::{DetectionConfig, IntervalPolicy};
use markscan_core::external::{FrameSource, SidecarFrameSource, check_media_dependencies};
use markscan_core::matching::Template;
use markscan_core::processing::{VideoDetection, detect_video};
use markscan_core::terminal_output::{
    FrameProgress, print_processing, print_section, print_status, print_sub_item, print_success,
    print_warning,
};
use markscan_core::utils::{file_stem_safe, format_duration, format_scale};
use markscan_core::{CoreError, resolve_inputs};

use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Counts of how a batch went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// `Ok` unless some video failed outright.
    pub fn into_result(self) -> CliResult<()> {
        if self.failed > 0 {
            return Err(CoreError::OperationFailed(format!(
                "{} of {} videos failed",
                self.failed,
                self.processed + self.skipped + self.failed
            )));
        }
        Ok(())
    }
}

pub fn run_detect(args: DetectArgs, calibration_file: &Path) -> CliResult<()> {
    print_section("Detect");
    let summary = detect_each(
        &args,
        calibration_file,
        &IntervalPolicy::default(),
        |_, _, _| Ok(()),
    )?;
    summary.into_result()
}

/// Runs detection on every input video and hands each result to `on_detected`
/// together with the video path and its frame rate.
///
/// Videos without a usable calibration are skipped with a warning. Any other
/// per-video error is logged and counted.
pub(crate) fn detect_each<F>(
    args: &DetectArgs,
    calibration_file: &Path,
    policy: &IntervalPolicy,
    mut on_detected: F,
) -> CliResult<BatchSummary>
where
    F: FnMut(&Path, Option<f64>, &VideoDetection) -> CliResult<()>,
{
    let config = args.detection_config();
    config.validate()?;
    let template = Template::load(&args.template)?;
    let videos = resolve_inputs(&args.input)?;
    check_media_dependencies()?;

    let mut store = CalibrationStore::open(calibration_file)?;
    let provider_source = ProviderSource::from_args(args)?;
    let mut provider = provider_source.provider(&template, config.threshold);

    print_status("Videos", &videos.len().to_string(), false);
    print_status("Threshold", &config.threshold.to_string(), false);
    print_status("Stride", &config.stride.to_string(), false);
    print_status("Calibration", &calibration_file.display().to_string(), false);

    let mut summary = BatchSummary::default();
    let mut last_skipped = None;
    for (i, video) in videos.iter().enumerate() {
        print_processing(&format!("[{}/{}] {}", i + 1, videos.len(), video.display()));
        let started = Instant::now();

        let result = detect_one(video, &template, &mut store, provider.as_mut(), &config, policy)
            .and_then(|(fps, detection)| on_detected(video, fps, &detection));

        match result {
            Ok(()) => {
                summary.processed += 1;
                info!(
                    "Finished {} in {}",
                    video.display(),
                    format_duration(started.elapsed().as_secs_f64())
                );
            }
            Err(CoreError::CalibrationUnavailable(resolution)) => {
                summary.skipped += 1;
                print_warning(&format!(
                    "Calibration skipped for {resolution}; {} not processed",
                    video.display()
                ));
                last_skipped = Some(resolution);
            }
            Err(e) => {
                summary.failed += 1;
                error!("{}: {e}", video.display());
            }
        }
    }

    // A lone uncalibrated video is reported as such rather than as a batch.
    if videos.len() == 1 {
        if let Some(resolution) = last_skipped {
            return Err(CoreError::CalibrationUnavailable(resolution));
        }
    }

    print_success(&format!(
        "{} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    ));
    Ok(summary)
}

fn detect_one(
    video: &Path,
    template: &Template,
    store: &mut CalibrationStore,
    provider: &mut dyn ScaleProvider,
    config: &DetectionConfig,
    policy: &IntervalPolicy,
) -> CliResult<(Option<f64>, VideoDetection)> {
    let stem = file_stem_safe(video)?;
    let mut source = SidecarFrameSource::open(video)?;
    let fps = source.fps();
    let progress = FrameProgress::new(&stem, source.frame_count_hint());

    let detection = detect_video(
        &mut source,
        &stem,
        template,
        store,
        provider,
        config,
        policy,
        &progress,
    )?;
    report_detection(&detection, fps);
    Ok((fps, detection))
}

fn report_detection(detection: &VideoDetection, fps: Option<f64>) {
    let report = &detection.report;
    print_status("Resolution", &detection.resolution.to_string(), false);
    print_status("Scale", &format_scale(detection.scale), true);
    print_status(
        "Frames",
        &format!("{} decoded, {} evaluated", report.frames_decoded, report.frames_evaluated),
        false,
    );
    if let Some(best) = &report.best {
        print_status(
            "Best score",
            &format!("{:.5} (frame {})", best.score, best.frame_index),
            false,
        );
    }
    print_status("Detections", &report.detections.len().to_string(), true);
    print_status("Intervals", &detection.intervals.len().to_string(), true);
    for interval in &detection.intervals {
        let timing = fps
            .map(|f| {
                format!(
                    " ({} - {})",
                    format_duration(interval.start as f64 / f),
                    format_duration(interval.end as f64 / f)
                )
            })
            .unwrap_or_default();
        print_sub_item(&format!("frames {interval}{timing}"));
    }
    if !report.annotated.is_empty() {
        print_status("Output", &detection.output_dir.display().to_string(), false);
    }
}
