//! Implementation of the 'sweep' subcommand.
//!
//! Decodes a video once and scores every sampled frame against every
//! candidate scale in the requested range. The best scale is stored for the
//! video's resolution when it reaches the threshold.

use crate::cli::SweepArgs;
use crate::error::CliResult;

use markscan_core::calibration::CalibrationStore;
use markscan_core::external::{FrameSource, SidecarFrameSource, check_media_dependencies};
use markscan_core::matching::Template;
use markscan_core::processing::{SweepOptions, sweep_video};
use markscan_core::terminal_output::{
    FrameProgress, print_section, print_status, print_success, print_warning,
};
use markscan_core::utils::{file_stem_safe, format_scale};

use std::path::Path;

pub fn run_sweep(args: SweepArgs, calibration_file: &Path) -> CliResult<()> {
    print_section("Sweep");
    let config = args.search_config();
    config.validate()?;
    let template = Template::load(&args.template)?;
    check_media_dependencies()?;
    let mut store = CalibrationStore::open(calibration_file)?;

    let stem = file_stem_safe(&args.video)?;
    let mut source = SidecarFrameSource::open(&args.video)?;
    print_status("Video", &args.video.display().to_string(), false);
    print_status("Resolution", &source.resolution().to_string(), false);
    print_status(
        "Scales",
        &format!(
            "{} samples in [{}, {}]",
            config.samples,
            format_scale(config.range.0),
            format_scale(config.range.1)
        ),
        false,
    );

    let options = SweepOptions {
        start_frame: args.start_frame,
        stride: args.stride,
        output_dir: (!args.no_save).then(|| args.output_dir.clone()),
        video_stem: stem.clone(),
    };
    let progress = FrameProgress::new(&stem, source.frame_count_hint());
    let outcome = sweep_video(&mut source, &template, &config, &options, &mut store, &progress)?;

    print_status("Frames", &outcome.frames_evaluated.to_string(), false);
    print_status("Saved frames", &outcome.saved.len().to_string(), false);
    match outcome.best {
        Some(best) => {
            print_status("Best scale", &format_scale(best.scale), true);
            print_status(
                "Best score",
                &format!("{:.5} (frame {})", best.score, best.frame_index),
                true,
            );
        }
        None => print_status("Best scale", "none", true),
    }

    if outcome.committed {
        print_success(&format!("Stored scale for {}", outcome.resolution));
    } else {
        print_warning(&format!(
            "No scale reached threshold {}; nothing stored",
            config.threshold
        ));
    }
    Ok(())
}
