// markscan-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use markscan_core::calibration::Resolution;
use markscan_core::config::{
    DEFAULT_ADJACENCY_TOLERANCE, DEFAULT_CALIBRATION_FILE, DEFAULT_OUTPUT_DIR, DEFAULT_PAD_AFTER,
    DEFAULT_PAD_BEFORE, DEFAULT_SEARCH_SAMPLES, DEFAULT_START_FRAME, DEFAULT_STRIDE,
    DEFAULT_SWEEP_RANGE, DEFAULT_SWEEP_SAMPLES, DEFAULT_THRESHOLD, DetectionConfig,
    IntervalPolicy, SearchConfig,
};
use markscan_core::processing::SearchSeed;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Markscan: marker calibration, detection and clip extraction",
    long_about = "Finds a red marker in video frames at a calibrated scale, merges detections \
                  into intervals and exports them as clips using ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not write a per-run log file
    #[arg(long, global = true)]
    pub no_log: bool,

    /// Directory for per-run log files
    #[arg(long, global = true, value_name = "LOG_DIR", default_value = "log")]
    pub log_dir: PathBuf,

    /// Resolution -> scale factor calibration file
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "MARKSCAN_CALIBRATION_FILE",
        default_value = DEFAULT_CALIBRATION_FILE
    )]
    pub calibration_file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Searches a labeled still image for the template scale and stores it
    Calibrate(CalibrateArgs),
    /// Sweeps a video over a range of scales and stores the best one
    Sweep(SweepArgs),
    /// Detects the marker in a video (or every video in a directory)
    Detect(DetectArgs),
    /// Detects the marker and exports the merged intervals as clips
    Extract(ExtractArgs),
    /// Inspects or edits the calibration file
    Scales(ScalesArgs),
}

impl Commands {
    /// Short name used for the run log file.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Calibrate(_) => "calibrate",
            Commands::Sweep(_) => "sweep",
            Commands::Detect(_) => "detect",
            Commands::Extract(_) => "extract",
            Commands::Scales(_) => "scales",
        }
    }
}

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Labeled still image showing the marker
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Marker template image
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Directory for annotated matches
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Do not write annotated matches
    #[arg(long)]
    pub no_annotate: bool,

    /// Minimum correlation score to accept a scale
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Number of candidate scales
    #[arg(long, default_value_t = DEFAULT_SEARCH_SAMPLES)]
    pub samples: usize,

    /// Refine around this scale instead of the stored one
    #[arg(long, value_name = "SCALE")]
    pub seed: Option<f64>,

    /// Search the full scale range even when a scale is stored
    #[arg(long, conflicts_with = "seed")]
    pub wide: bool,
}

impl CalibrateArgs {
    pub fn search_seed(&self) -> SearchSeed {
        match self.seed {
            Some(scale) => SearchSeed::Explicit(scale),
            None if self.wide => SearchSeed::Wide,
            None => SearchSeed::Stored,
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threshold: self.threshold,
            samples: self.samples,
            ..SearchConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Video to sweep
    #[arg(value_name = "VIDEO")]
    pub video: PathBuf,

    /// Marker template image
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Directory for frames that match at some scale
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Do not save matching frames
    #[arg(long)]
    pub no_save: bool,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Smallest candidate scale
    #[arg(long, default_value_t = DEFAULT_SWEEP_RANGE.0)]
    pub min_scale: f64,

    /// Largest candidate scale
    #[arg(long, default_value_t = DEFAULT_SWEEP_RANGE.1)]
    pub max_scale: f64,

    /// Number of candidate scales between min and max (inclusive)
    #[arg(long, default_value_t = DEFAULT_SWEEP_SAMPLES)]
    pub samples: usize,

    /// First frame index to evaluate
    #[arg(long, default_value_t = DEFAULT_START_FRAME)]
    pub start_frame: u64,

    /// Evaluate every Nth frame
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    pub stride: u64,
}

impl SweepArgs {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threshold: self.threshold,
            samples: self.samples,
            range: (self.min_scale, self.max_scale),
            ..SearchConfig::sweep()
        }
    }
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Video file or directory of videos
    #[arg(value_name = "INPUT_PATH")]
    pub input: PathBuf,

    /// Marker template image
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Directory for annotated frames and clips
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Evaluate every Nth frame
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    pub stride: u64,

    /// First frame index to evaluate
    #[arg(long, default_value_t = DEFAULT_START_FRAME)]
    pub start_frame: u64,

    /// Scale to store for an uncalibrated resolution instead of prompting
    #[arg(long, value_name = "SCALE", conflicts_with = "reference")]
    pub scale: Option<f64>,

    /// Labeled frame to search when a resolution is uncalibrated
    #[arg(long, value_name = "IMAGE")]
    pub reference: Option<PathBuf>,
}

impl DetectArgs {
    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            threshold: self.threshold,
            stride: self.stride,
            start_frame: self.start_frame,
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Frames added before each detection
    #[arg(long, default_value_t = DEFAULT_PAD_BEFORE)]
    pub pad_before: u64,

    /// Frames added after each detection
    #[arg(long, default_value_t = DEFAULT_PAD_AFTER)]
    pub pad_after: u64,

    /// Merge windows separated by at most this many frames
    #[arg(long, default_value_t = DEFAULT_ADJACENCY_TOLERANCE)]
    pub tolerance: u64,
}

impl ExtractArgs {
    pub fn interval_policy(&self) -> IntervalPolicy {
        IntervalPolicy {
            pad_before: self.pad_before,
            pad_after: self.pad_after,
            adjacency_tolerance: self.tolerance,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScalesArgs {
    #[command(subcommand)]
    pub action: ScalesCommand,
}

#[derive(Subcommand, Debug)]
pub enum ScalesCommand {
    /// Prints every stored entry
    List,
    /// Stores a scale factor for a resolution
    Set {
        /// Resolution as WIDTHxHEIGHT
        resolution: Resolution,
        /// Positive scale factor
        scale: f64,
    },
    /// Prints the scale factor stored for a resolution
    Get {
        /// Resolution as WIDTHxHEIGHT
        resolution: Resolution,
    },
}

/// Parses the process arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses an explicit argument list (first item is the program name).
pub fn parse_cli_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect_defaults() {
        let cli = parse_cli_from(["markscan", "detect", "video.mp4", "-t", "marker.png"]).unwrap();
        assert!(!cli.verbose);
        assert!(!cli.no_log);
        assert_eq!(cli.log_dir, PathBuf::from("log"));
        match cli.command {
            Commands::Detect(args) => {
                assert_eq!(args.input, PathBuf::from("video.mp4"));
                assert_eq!(args.template, PathBuf::from("marker.png"));
                let config = args.detection_config();
                assert_eq!(config.threshold, DEFAULT_THRESHOLD);
                assert_eq!(config.stride, 1);
                assert_eq!(config.start_frame, 0);
                assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
                assert!(args.scale.is_none());
                assert!(args.reference.is_none());
            }
            other => panic!("Expected Detect command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_extract_with_policy() {
        let cli = parse_cli_from([
            "markscan",
            "extract",
            "videos",
            "--template",
            "marker.png",
            "--stride",
            "5",
            "--pad-before",
            "30",
            "--pad-after",
            "10",
            "--tolerance",
            "2",
            "--scale",
            "0.5",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.detect.stride, 5);
                assert_eq!(args.detect.scale, Some(0.5));
                assert_eq!(
                    args.interval_policy(),
                    IntervalPolicy {
                        pad_before: 30,
                        pad_after: 10,
                        adjacency_tolerance: 2,
                    }
                );
            }
            other => panic!("Expected Extract command, got {other:?}"),
        }
    }

    #[test]
    fn test_scale_conflicts_with_reference() {
        let result = parse_cli_from([
            "markscan",
            "detect",
            "video.mp4",
            "-t",
            "marker.png",
            "--scale",
            "0.5",
            "--reference",
            "frame.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_calibrate_seed_selection() {
        let seed_of = |extra: &[&str]| {
            let mut argv = vec!["markscan", "calibrate", "frame.png", "-t", "marker.png"];
            argv.extend_from_slice(extra);
            match parse_cli_from(argv).unwrap().command {
                Commands::Calibrate(args) => args.search_seed(),
                other => panic!("Expected Calibrate command, got {other:?}"),
            }
        };
        assert_eq!(seed_of(&[]), SearchSeed::Stored);
        assert_eq!(seed_of(&["--wide"]), SearchSeed::Wide);
        assert_eq!(seed_of(&["--seed", "0.42"]), SearchSeed::Explicit(0.42));

        let both = parse_cli_from([
            "markscan", "calibrate", "frame.png", "-t", "marker.png", "--seed", "0.4", "--wide",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_sweep_range() {
        let cli = parse_cli_from([
            "markscan",
            "sweep",
            "video.mp4",
            "-t",
            "marker.png",
            "--min-scale",
            "0.3",
            "--max-scale",
            "0.7",
            "--samples",
            "41",
        ])
        .unwrap();
        match cli.command {
            Commands::Sweep(args) => {
                let config = args.search_config();
                assert_eq!(config.range, (0.3, 0.7));
                assert_eq!(config.samples, 41);
            }
            other => panic!("Expected Sweep command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_scales_set() {
        let cli = parse_cli_from(["markscan", "scales", "set", "1280x720", "0.42738"]).unwrap();
        assert_eq!(cli.command.name(), "scales");
        match cli.command {
            Commands::Scales(ScalesArgs {
                action: ScalesCommand::Set { resolution, scale },
            }) => {
                assert_eq!(resolution, Resolution::new(1280, 720));
                assert_eq!(scale, 0.42738);
            }
            other => panic!("Expected scales set, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_resolution_is_rejected() {
        assert!(parse_cli_from(["markscan", "scales", "get", "1280by720"]).is_err());
    }
}
