//! Implementation of the 'calibrate' subcommand.
//!
//! Searches a labeled still image for the template scale and commits the
//! winner to the calibration file when it reaches the threshold.

use crate::cli::CalibrateArgs;
use crate::error::CliResult;

use markscan_core::calibration::CalibrationStore;
use markscan_core::matching::Template;
use markscan_core::processing::calibrate_image;
use markscan_core::terminal_output::{
    print_section, print_status, print_sub_item, print_success, print_warning,
};
use markscan_core::utils::format_scale;

use std::path::Path;

pub fn run_calibrate(args: CalibrateArgs, calibration_file: &Path) -> CliResult<()> {
    print_section("Calibrate");
    let config = args.search_config();
    let template = Template::load(&args.template)?;
    let mut store = CalibrationStore::open(calibration_file)?;

    print_status("Image", &args.image.display().to_string(), false);
    print_status("Template", &args.template.display().to_string(), false);

    let output_dir = (!args.no_annotate).then_some(args.output_dir.as_path());
    let calibration = calibrate_image(
        &args.image,
        &template,
        &config,
        args.search_seed(),
        &mut store,
        output_dir,
    )?;

    let outcome = &calibration.outcome;
    print_status("Resolution", &calibration.resolution.to_string(), false);
    match calibration.seed {
        Some(seed) => print_status("Seed", &format_scale(seed), false),
        None => print_status("Seed", "none (full range)", false),
    }
    print_status(
        "Candidates",
        &format!("{} evaluated, {} skipped", outcome.evaluated, outcome.skipped),
        false,
    );
    match outcome.best {
        Some(best) => {
            print_status("Best scale", &format_scale(best.scale), true);
            print_status("Best score", &format!("{:.5}", best.score()), true);
        }
        None => print_status("Best scale", "none", true),
    }
    for path in &calibration.annotated {
        print_sub_item(&path.display().to_string());
    }

    if calibration.committed {
        print_success(&format!(
            "Stored scale for {} in {}",
            calibration.resolution,
            store.path().display()
        ));
    } else {
        print_warning(&format!(
            "No scale reached threshold {}; nothing stored",
            config.threshold
        ));
    }
    Ok(())
}
