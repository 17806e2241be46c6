//! Implementation of the 'extract' subcommand.
//!
//! Runs detection like `detect` with a configurable interval policy, then
//! trims one stream-copied clip per merged interval next to the annotated
//! frames. A failed clip is reported and the remaining clips still run.

use super::detect::detect_each;
use crate::cli::ExtractArgs;
use crate::error::CliResult;

use markscan_core::external::SidecarSpawner;
use markscan_core::processing::{ClipExporter, effective_fps, plan_clips};
use markscan_core::CoreError;
use markscan_core::terminal_output::{print_section, print_status, print_sub_item};

use log::{error, warn};
use std::path::Path;

pub fn run_extract(args: ExtractArgs, calibration_file: &Path) -> CliResult<()> {
    print_section("Extract");
    let policy = args.interval_policy();
    print_status(
        "Padding",
        &format!("{} before, {} after", policy.pad_before, policy.pad_after),
        false,
    );

    let spawner = SidecarSpawner;
    let mut clip_failures = 0usize;

    let summary = detect_each(&args.detect, calibration_file, &policy, |video, fps, detection| {
        if detection.intervals.is_empty() {
            print_sub_item("No detections; nothing to extract");
            return Ok(());
        }
        if fps.is_none() {
            warn!(
                "{} reports no usable frame rate; clip times assume {} fps",
                video.display(),
                effective_fps(None)
            );
        }

        let clips = plan_clips(&detection.intervals, fps, &detection.output_dir);
        let results = ClipExporter::new(&spawner, video).export(&clips);
        let exported = results.iter().filter(|r| r.is_ok()).count();
        for result in results {
            if let Err(e) = result {
                clip_failures += 1;
                error!("{}: {e}", video.display());
            }
        }
        print_status("Clips", &format!("{exported} of {} exported", clips.len()), true);
        Ok(())
    })?;

    summary.into_result()?;
    if clip_failures > 0 {
        return Err(CoreError::OperationFailed(format!(
            "{clip_failures} clips failed to export"
        )));
    }
    Ok(())
}
