//! Core library for locating a red marker in video frames at an unknown scale.
//!
//! This crate calibrates and persists the per-resolution scale of a marker
//! template, detects the marker across a video with color-masked normalized
//! cross-correlation, merges detections into padded frame intervals and
//! exports those intervals as stream-copied clips via ffmpeg.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use markscan_core::calibration::{CalibrationStore, InteractivePrompt};
//! use markscan_core::config::{DetectionConfig, IntervalPolicy};
//! use markscan_core::external::{SidecarFrameSource, SidecarSpawner};
//! use markscan_core::matching::Template;
//! use markscan_core::processing::{ClipExporter, detect_video, plan_clips};
//! use markscan_core::terminal_output::FrameProgress;
//! use std::path::{Path, PathBuf};
//!
//! let template = Template::load(Path::new("marker.png")).unwrap();
//! let mut store = CalibrationStore::open("scale_factors.json").unwrap();
//! let mut prompt = InteractivePrompt::stdio();
//! let config = DetectionConfig::new(PathBuf::from("matched_frames"));
//!
//! let video = Path::new("video.mp4");
//! let mut source = SidecarFrameSource::open(video).unwrap();
//! let fps = source.fps();
//! let detection = detect_video(
//!     &mut source,
//!     "video",
//!     &template,
//!     &mut store,
//!     &mut prompt,
//!     &config,
//!     &IntervalPolicy::default(),
//!     &FrameProgress::hidden(),
//! )
//! .unwrap();
//!
//! let clips = plan_clips(&detection.intervals, fps, &detection.output_dir);
//! for result in ClipExporter::new(&SidecarSpawner, video).export(&clips) {
//!     if let Err(e) = result {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod matching;
pub mod processing;
pub mod terminal_output;
pub mod utils;

// Re-exports for public API
pub use image;
pub use calibration::{CalibrationStore, Resolution, ScaleProvider};
pub use config::{DetectionConfig, IntervalPolicy, SearchConfig};
pub use discovery::{find_video_files, resolve_inputs};
pub use error::{CoreError, CoreResult};
pub use matching::{MatchResult, Template};
pub use processing::{Clip, Interval, ScanReport, VideoDetection, detect_video};
pub use utils::{format_duration, format_scale, format_seconds};
