// ============================================================================
// markscan-core/src/processing/scale_search.rs
// ============================================================================
//
// SCALE SEARCH: find the template scale that best matches a labeled frame
//
// Candidates are evenly spaced over a range (wide when nothing is known,
// narrow around a seed otherwise). Each candidate resizes the template and
// derives a fresh mask, then takes the best masked correlation against the
// reference. The highest score wins; ties keep the lower scale. A winner at
// or above the threshold is committed to the calibration store.
//
// The video sweep applies the same search to every sampled frame of a video
// and ranks candidates by their best score over all frames.

use crate::calibration::{CalibrationStore, Resolution};
use crate::config::SearchConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::FrameSource;
use crate::matching::{MatchResult, ScaledTemplate, Template, annotate_match, load_image};
use crate::terminal_output::FrameProgress;
use crate::utils::{file_stem_safe, format_scale};

use image::RgbImage;
use image::imageops::grayscale;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// One evaluated candidate scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCandidate {
    pub scale: f64,
    pub result: MatchResult,
}

impl ScaleCandidate {
    pub fn score(&self) -> f64 {
        self.result.score
    }
}

/// Result of searching one reference image.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Highest-scoring determinate candidate, if any
    pub best: Option<ScaleCandidate>,
    /// Whether `best` reached the threshold
    pub accepted: bool,
    /// Candidates whose correlation was computed
    pub evaluated: usize,
    /// Degenerate or oversized candidates
    pub skipped: usize,
    /// Every candidate at or above the threshold, in scale order
    pub matches: Vec<ScaleCandidate>,
}

/// Searches for the scale at which `template` best matches `reference`.
///
/// Pure: nothing is written. `seed` narrows the search to
/// `seed ± config.seed_window`.
pub fn search_scale(
    reference: &RgbImage,
    template: &Template,
    config: &SearchConfig,
    seed: Option<f64>,
) -> SearchOutcome {
    let gray = grayscale(reference);
    let (frame_w, frame_h) = reference.dimensions();
    let mut outcome = SearchOutcome::default();

    for scale in config.candidates(seed) {
        let Some(scaled) = usable_candidate(template, scale, frame_w, frame_h) else {
            outcome.skipped += 1;
            continue;
        };

        let result = scaled.match_in(0, &gray);
        outcome.evaluated += 1;
        if !result.is_determinate() {
            debug!("scale {}: indeterminate score", format_scale(scale));
            continue;
        }
        debug!("scale {}: score {:.5}", format_scale(scale), result.score);

        let candidate = ScaleCandidate { scale, result };
        if result.score >= config.threshold {
            outcome.matches.push(candidate);
        }
        if outcome.best.is_none_or(|best| result.score > best.score()) {
            outcome.best = Some(candidate);
        }
    }

    outcome.accepted = outcome
        .best
        .is_some_and(|best| best.score() >= config.threshold);
    outcome
}

/// Resizes the template for `scale`, or `None` if the candidate must be skipped.
fn usable_candidate(
    template: &Template,
    scale: f64,
    frame_w: u32,
    frame_h: u32,
) -> Option<ScaledTemplate> {
    let Some(scaled) = template.scaled(scale) else {
        debug!("scale {}: degenerate template, skipped", format_scale(scale));
        return None;
    };
    if !scaled.fits(frame_w, frame_h) {
        debug!("scale {}: template larger than frame, skipped", format_scale(scale));
        return None;
    }
    Some(scaled)
}

/// Result of calibrating against a still image.
#[derive(Debug, Clone)]
pub struct ImageCalibration {
    pub resolution: Resolution,
    pub seed: Option<f64>,
    pub outcome: SearchOutcome,
    /// Whether the best scale was written to the store
    pub committed: bool,
    /// Annotated copies written for candidates at or above the threshold
    pub annotated: Vec<PathBuf>,
}

/// Where a still-image calibration centers its search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SearchSeed {
    /// Refine around the scale already stored for the image's resolution,
    /// or search the full range when none is stored.
    #[default]
    Stored,
    /// Refine around this scale.
    Explicit(f64),
    /// Search the full range, ignoring any stored scale.
    Wide,
}

impl SearchSeed {
    /// The search center for `resolution`, if any.
    pub fn resolve(self, store: &CalibrationStore, resolution: Resolution) -> Option<f64> {
        match self {
            SearchSeed::Stored => store.get(resolution),
            SearchSeed::Explicit(scale) => Some(scale),
            SearchSeed::Wide => None,
        }
    }
}

/// Runs [`search_scale`] on the image at `image_path` and commits an
/// accepted result under the image's resolution.
///
/// By default a scale already stored for the resolution seeds the search,
/// so repeated calibrations refine the stored value.
///
/// When `output_dir` is given, every candidate at or above the threshold is
/// saved as `{output_dir}/{image_stem}/scale_{scale:.5}.jpg` with the match
/// outlined.
pub fn calibrate_image(
    image_path: &Path,
    template: &Template,
    config: &SearchConfig,
    seed: SearchSeed,
    store: &mut CalibrationStore,
    output_dir: Option<&Path>,
) -> CoreResult<ImageCalibration> {
    config.validate()?;
    let reference = load_image(image_path)?;
    let resolution = Resolution::new(reference.width(), reference.height());
    let seed = seed.resolve(store, resolution);
    info!(
        "Calibrating {} ({resolution}) over {} candidates{}",
        image_path.display(),
        config.samples,
        seed.map_or_else(String::new, |s| format!(" around {}", format_scale(s)))
    );

    let outcome = search_scale(&reference, template, config, seed);

    let mut annotated = Vec::new();
    if let Some(output_dir) = output_dir {
        if !outcome.matches.is_empty() {
            let dir = output_dir.join(file_stem_safe(image_path)?);
            fs::create_dir_all(&dir)?;
            for candidate in &outcome.matches {
                let path = dir.join(format!("scale_{}.jpg", format_scale(candidate.scale)));
                match annotate_match(&reference, &candidate.result).save(&path) {
                    Ok(()) => {
                        info!(
                            "[MATCH] scale {} score {:.5} -> {}",
                            format_scale(candidate.scale),
                            candidate.score(),
                            path.display()
                        );
                        annotated.push(path);
                    }
                    Err(e) => warn!("Failed to write {}: {e}", path.display()),
                }
            }
        }
    }

    let best = outcome.best.map(|b| (b.scale, b.score()));
    let committed = commit_if_accepted(store, resolution, outcome.accepted, best)?;

    Ok(ImageCalibration {
        resolution,
        seed,
        outcome,
        committed,
        annotated,
    })
}

fn commit_if_accepted(
    store: &mut CalibrationStore,
    resolution: Resolution,
    accepted: bool,
    best: Option<(f64, f64)>,
) -> CoreResult<bool> {
    match best {
        Some((scale, _)) if accepted => {
            store.put(resolution, scale)?;
            Ok(true)
        }
        Some((scale, score)) => {
            warn!(
                "No acceptable scale for {resolution}: best {} scored {score:.5}",
                format_scale(scale)
            );
            Ok(false)
        }
        None => {
            warn!("No candidate scale produced a determinate score for {resolution}");
            Ok(false)
        }
    }
}

/// Frame selection and output for a video sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Frames before this index are decoded and discarded
    pub start_frame: u64,
    /// Only indices that are multiples of this are evaluated
    pub stride: u64,
    /// Matching frames go to `{output_dir}/{video_stem}/` when set
    pub output_dir: Option<PathBuf>,
    /// Stem used for the output subdirectory
    pub video_stem: String,
}

/// Best (scale, score, frame) found by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepBest {
    pub scale: f64,
    pub score: f64,
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub resolution: Resolution,
    pub best: Option<SweepBest>,
    pub accepted: bool,
    pub committed: bool,
    pub frames_evaluated: u64,
    /// Frames written for (scale, frame) pairs at or above the threshold
    pub saved: Vec<PathBuf>,
}

/// Sweeps every sampled frame of `source` with every candidate scale in
/// `config.range` and commits the best scale when it reaches the threshold.
///
/// Each candidate's mask comes from that candidate's own resize. A candidate's
/// rank is its best score over all frames; the earliest frame wins ties.
pub fn sweep_video(
    source: &mut dyn FrameSource,
    template: &Template,
    config: &SearchConfig,
    options: &SweepOptions,
    store: &mut CalibrationStore,
    progress: &FrameProgress,
) -> CoreResult<SweepOutcome> {
    config.validate()?;
    if options.stride == 0 {
        return Err(CoreError::Config("stride must be at least 1".to_string()));
    }
    let stride = options.stride;
    let resolution = source.resolution();

    let candidates: Vec<ScaledTemplate> = config
        .candidates(None)
        .into_iter()
        .filter_map(|scale| usable_candidate(template, scale, resolution.width, resolution.height))
        .collect();
    info!(
        "Sweeping {} usable candidate scales at {resolution} from frame {}",
        candidates.len(),
        options.start_frame
    );

    let save_dir = match &options.output_dir {
        Some(dir) => {
            let dir = dir.join(&options.video_stem);
            fs::create_dir_all(&dir)?;
            Some(dir)
        }
        None => None,
    };

    // Per candidate: (best score, frame index)
    let mut per_scale: Vec<Option<(f64, u64)>> = vec![None; candidates.len()];
    let mut saved = Vec::new();
    let mut frames_evaluated = 0u64;
    let mut index = 0u64;

    while let Some(frame) = source.next_frame()? {
        let current = index;
        index += 1;
        progress.set_position(index);
        if current < options.start_frame || current % stride != 0 {
            continue;
        }
        frames_evaluated += 1;
        let gray = grayscale(&frame);

        for (slot, scaled) in per_scale.iter_mut().zip(&candidates) {
            let result = scaled.match_in(current, &gray);
            if !result.is_determinate() {
                continue;
            }
            if slot.is_none_or(|(score, _)| result.score > score) {
                *slot = Some((result.score, current));
            }
            if result.score >= config.threshold {
                if let Some(dir) = &save_dir {
                    let path = dir.join(format!(
                        "scale_{}_frame_{current}.jpg",
                        format_scale(scaled.scale())
                    ));
                    match frame.save(&path) {
                        Ok(()) => {
                            info!(
                                "[MATCH] scale {} frame {current} score {:.5} -> {}",
                                format_scale(scaled.scale()),
                                result.score,
                                path.display()
                            );
                            saved.push(path);
                        }
                        Err(e) => warn!("Failed to write {}: {e}", path.display()),
                    }
                }
            }
        }
    }
    progress.finish();

    let mut best: Option<SweepBest> = None;
    for (slot, scaled) in per_scale.iter().zip(&candidates) {
        if let Some((score, frame_index)) = *slot {
            if best.is_none_or(|b| score > b.score) {
                best = Some(SweepBest {
                    scale: scaled.scale(),
                    score,
                    frame_index,
                });
            }
        }
    }

    let accepted = best.is_some_and(|b| b.score >= config.threshold);
    let committed =
        commit_if_accepted(store, resolution, accepted, best.map(|b| (b.scale, b.score)))?;

    Ok(SweepOutcome {
        resolution,
        best,
        accepted,
        committed,
        frames_evaluated,
        saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Red template with an irregular brightness pattern.
    fn red_template() -> Template {
        Template::from_rgb(RgbImage::from_fn(20, 20, |x, y| {
            Rgb([120 + ((x * 37 + y * 53) % 110) as u8, 10, 15])
        }))
    }

    #[test]
    fn test_all_candidates_degenerate() {
        let reference = RgbImage::from_pixel(30, 30, Rgb([40, 40, 40]));
        let config = SearchConfig {
            range: (0.01, 0.05),
            samples: 5,
            ..SearchConfig::default()
        };
        let outcome = search_scale(&reference, &red_template(), &config, None);
        assert_eq!(outcome.evaluated, 0);
        assert_eq!(outcome.skipped, 5);
        assert!(outcome.best.is_none());
        assert!(!outcome.accepted);
    }

    #[test]
    fn test_oversized_candidates_are_skipped() {
        let reference = RgbImage::from_fn(15, 15, |x, _| Rgb([(x * 10) as u8, 0, 0]));
        let config = SearchConfig {
            range: (0.5, 1.0),
            samples: 2,
            ..SearchConfig::default()
        };
        let outcome = search_scale(&reference, &red_template(), &config, None);
        // 1.0 -> 20x20 does not fit in 15x15
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.evaluated, 1);
    }

    #[test]
    fn test_flat_reference_is_never_accepted() {
        let reference = RgbImage::from_pixel(40, 40, Rgb([90, 90, 90]));
        let config = SearchConfig {
            range: (0.5, 1.0),
            samples: 6,
            ..SearchConfig::default()
        };
        let outcome = search_scale(&reference, &red_template(), &config, None);
        assert!(outcome.evaluated > 0);
        assert!(outcome.best.is_none());
        assert!(!outcome.accepted);
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn test_exact_scale_one_is_found() {
        let template = red_template();
        let mut reference = RgbImage::from_fn(50, 40, |x, y| Rgb([((x * 3 + y * 7) % 97) as u8, 60, 60]));
        image::imageops::replace(&mut reference, template.image(), 17, 9);

        let config = SearchConfig {
            range: (0.5, 1.0),
            samples: 2,
            ..SearchConfig::default()
        };
        let outcome = search_scale(&reference, &template, &config, None);
        let best = outcome.best.unwrap();
        assert_eq!(best.scale, 1.0);
        assert!((best.score() - 1.0).abs() < 1e-9);
        assert_eq!(best.result.location, (17, 9));
        assert!(outcome.accepted);
    }
}
