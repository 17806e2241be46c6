//! Configuration structures and constants for the markscan-core library.
//!
//! The variable parameters of detection, calibration search and interval
//! merging live here so that every entry point shares one canonical policy.

use crate::error::CoreError;
use std::path::PathBuf;

// Default constants

/// Default acceptance threshold for correlation scores.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Default frame stride (process every frame).
pub const DEFAULT_STRIDE: u64 = 1;

/// Default first frame index to evaluate.
pub const DEFAULT_START_FRAME: u64 = 0;

/// Frames of lead-in added before each detection.
pub const DEFAULT_PAD_BEFORE: u64 = 200;

/// Frames of lead-out added after each detection.
pub const DEFAULT_PAD_AFTER: u64 = 100;

/// Windows whose start is at most this many frames past the previous end are merged.
pub const DEFAULT_ADJACENCY_TOLERANCE: u64 = 1;

/// Frame rate used when the source does not report a usable one.
pub const DEFAULT_FALLBACK_FPS: f64 = 30.0;

/// Number of evenly spaced candidate scales in a calibration search.
pub const DEFAULT_SEARCH_SAMPLES: usize = 100;

/// Half-width of the search window around a seed scale.
pub const DEFAULT_SEED_WINDOW: f64 = 0.01;

/// Search range used when no seed scale is known.
pub const DEFAULT_SEARCH_RANGE: (f64, f64) = (0.0, 1.0);

/// Scale range for a video sweep.
pub const DEFAULT_SWEEP_RANGE: (f64, f64) = (0.4, 0.6);

/// Number of candidate scales in a video sweep.
pub const DEFAULT_SWEEP_SAMPLES: usize = 20;

/// Scaled templates with a side shorter than this are degenerate.
pub const MIN_TEMPLATE_SIDE: u32 = 2;

/// Scaled templates whose color mask covers fewer pixels than this are degenerate.
/// With only a handful of samples the normalized correlation saturates at +/-1.
pub const MIN_MASK_PIXELS: usize = 16;

/// Default location of the persisted resolution -> scale mapping.
pub const DEFAULT_CALIBRATION_FILE: &str = "scale_factors.json";

/// Default output directory for annotated frames and clips.
pub const DEFAULT_OUTPUT_DIR: &str = "matched_frames";

fn validate_threshold(threshold: f64) -> Result<(), CoreError> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(CoreError::Config(format!(
            "threshold must be in (0, 1], got {threshold}"
        )));
    }
    Ok(())
}

/// Parameters for sweeping a video with a fixed, pre-resolved scale.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Minimum correlation score for a detection
    pub threshold: f64,

    /// Only frames whose index is a multiple of this are evaluated
    pub stride: u64,

    /// Frames before this index are decoded but discarded
    pub start_frame: u64,

    /// Root directory for annotated frames and clips
    pub output_dir: PathBuf,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            stride: DEFAULT_STRIDE,
            start_frame: DEFAULT_START_FRAME,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl DetectionConfig {
    /// Creates config with the output directory. Other fields use defaults.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Default::default()
        }
    }

    /// Validates threshold (0, 1] and stride >= 1.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_threshold(self.threshold)?;
        if self.stride == 0 {
            return Err(CoreError::Config("stride must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Whether the frame with this index is evaluated.
    pub fn samples_frame(&self, index: u64) -> bool {
        index >= self.start_frame && index % self.stride == 0
    }
}

/// Parameters for the scale search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum best score for a scale to be committed
    pub threshold: f64,

    /// Number of evenly spaced candidates (inclusive of both ends)
    pub samples: usize,

    /// Inclusive range searched when no seed is given
    pub range: (f64, f64),

    /// Half-width of the window searched around a seed
    pub seed_window: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            samples: DEFAULT_SEARCH_SAMPLES,
            range: DEFAULT_SEARCH_RANGE,
            seed_window: DEFAULT_SEED_WINDOW,
        }
    }
}

impl SearchConfig {
    /// Config for a video sweep over `DEFAULT_SWEEP_RANGE`.
    pub fn sweep() -> Self {
        Self {
            samples: DEFAULT_SWEEP_SAMPLES,
            range: DEFAULT_SWEEP_RANGE,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_threshold(self.threshold)?;
        if self.samples == 0 {
            return Err(CoreError::Config("samples must be at least 1".to_string()));
        }
        let (lo, hi) = self.range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(CoreError::Config(format!(
                "scale range must satisfy min <= max, got [{lo}, {hi}]"
            )));
        }
        if !(self.seed_window.is_finite() && self.seed_window >= 0.0) {
            return Err(CoreError::Config(format!(
                "seed window must be non-negative, got {}",
                self.seed_window
            )));
        }
        Ok(())
    }

    /// Candidate scales: narrow window around `seed` if given, else the full range.
    pub fn candidates(&self, seed: Option<f64>) -> Vec<f64> {
        let (lo, hi) = match seed {
            Some(s) => (s - self.seed_window, s + self.seed_window),
            None => self.range,
        };
        linspace(lo, hi, self.samples)
    }
}

/// Evenly spaced values over `[lo, hi]` inclusive.
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Padding and adjacency rules used to turn detections into clip intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    pub pad_before: u64,
    pub pad_after: u64,
    pub adjacency_tolerance: u64,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            pad_before: DEFAULT_PAD_BEFORE,
            pad_after: DEFAULT_PAD_AFTER,
            adjacency_tolerance: DEFAULT_ADJACENCY_TOLERANCE,
        }
    }
}

impl IntervalPolicy {
    /// Policy with no padding; only the adjacency tolerance applies.
    pub fn unpadded(adjacency_tolerance: u64) -> Self {
        Self {
            pad_before: 0,
            pad_after: 0,
            adjacency_tolerance,
        }
    }
}
