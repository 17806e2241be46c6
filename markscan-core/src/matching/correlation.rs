//! Masked normalized cross-correlation.
//!
//! Scores follow the zero-mean normalized formulation restricted to the set
//! pixels of a binary mask:
//!
//! ```text
//!            sum_m (T - mean_T) * (I - mean_I)
//! R(x, y) = -----------------------------------
//!           sqrt(sum_m (T - mean_T)^2 * sum_m (I - mean_I)^2)
//! ```
//!
//! 1.0 is a perfect match. Windows (or templates) with no intensity variance
//! under the mask have no defined score; they are skipped. If no position is
//! defined the returned score is NaN and callers treat it as "no detection".

use super::color_mask::ColorMask;

use image::GrayImage;
use rayon::prelude::*;

/// Sums of squared deviations at or below this are treated as zero.
/// Integer intensities give at least 0.5 for any non-constant window.
const VARIANCE_EPSILON: f64 = 1e-6;

/// Best score over all positions and its top-left location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak {
    pub score: f64,
    pub x: u32,
    pub y: u32,
}

impl CorrelationPeak {
    fn indeterminate() -> Self {
        Self {
            score: f64::NAN,
            x: 0,
            y: 0,
        }
    }

    pub fn is_determinate(&self) -> bool {
        self.score.is_finite()
    }
}

/// Slides `template` over `frame` and returns the highest masked score.
///
/// `mask` must have the template's dimensions. Ties keep the first position in
/// row-major order. A template larger than the frame yields an indeterminate peak.
pub fn match_template_masked(
    frame: &GrayImage,
    template: &GrayImage,
    mask: &ColorMask,
) -> CorrelationPeak {
    let (fw, fh) = frame.dimensions();
    let (tw, th) = template.dimensions();
    debug_assert_eq!(mask.dimensions(), (tw, th));

    if tw == 0 || th == 0 || tw > fw || th > fh {
        return CorrelationPeak::indeterminate();
    }

    // (linear offset into the frame, centered template intensity)
    let mut samples: Vec<(usize, f64)> = Vec::with_capacity(mask.count());
    let mut sum_t = 0.0;
    for dy in 0..th {
        for dx in 0..tw {
            if mask.is_set(dx, dy) {
                let t = f64::from(template.get_pixel(dx, dy).0[0]);
                samples.push((dy as usize * fw as usize + dx as usize, t));
                sum_t += t;
            }
        }
    }
    if samples.is_empty() {
        return CorrelationPeak::indeterminate();
    }

    let n = samples.len() as f64;
    let mean_t = sum_t / n;
    let mut sum_tt = 0.0;
    for sample in &mut samples {
        sample.1 -= mean_t;
        sum_tt += sample.1 * sample.1;
    }
    if sum_tt <= VARIANCE_EPSILON {
        return CorrelationPeak::indeterminate();
    }

    let pixels = frame.as_raw();
    let stride = fw as usize;
    let max_x = fw - tw;
    let max_y = fh - th;

    let row_peaks: Vec<Option<CorrelationPeak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| {
            let mut best: Option<CorrelationPeak> = None;
            for x in 0..=max_x {
                let base = y as usize * stride + x as usize;
                let mut sum_i = 0.0;
                let mut sum_ii = 0.0;
                let mut sum_it = 0.0;
                for &(offset, t) in &samples {
                    let i = f64::from(pixels[base + offset]);
                    sum_i += i;
                    sum_ii += i * i;
                    sum_it += i * t;
                }
                // sum(t) == 0, so the window mean drops out of the numerator.
                let var_i = sum_ii - sum_i * sum_i / n;
                if var_i <= VARIANCE_EPSILON {
                    continue;
                }
                let score = sum_it / (sum_tt * var_i).sqrt();
                if !score.is_finite() {
                    continue;
                }
                if best.is_none_or(|b| score > b.score) {
                    best = Some(CorrelationPeak { score, x, y });
                }
            }
            best
        })
        .collect();

    row_peaks
        .into_iter()
        .flatten()
        .fold(None, |best: Option<CorrelationPeak>, peak| match best {
            Some(b) if b.score >= peak.score => Some(b),
            _ => Some(peak),
        })
        .unwrap_or_else(CorrelationPeak::indeterminate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::color_mask::HueBand;
    use image::{Luma, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn full_mask(w: u32, h: u32) -> ColorMask {
        let img = RgbImage::from_pixel(w, h, Rgb([230, 10, 10]));
        ColorMask::from_image(&img, &HueBand::red())
    }

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]))
    }

    fn noise(w: u32, h: u32, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        GrayImage::from_fn(w, h, |_, _| Luma([rng.random()]))
    }

    #[test]
    fn test_exact_subimage_scores_one() {
        let frame = noise(40, 30, 17);
        let template = image::imageops::crop_imm(&frame, 11, 7, 8, 6).to_image();
        let peak = match_template_masked(&frame, &template, &full_mask(8, 6));
        assert!((peak.score - 1.0).abs() < 1e-9, "score {}", peak.score);
        assert_eq!((peak.x, peak.y), (11, 7));
    }

    #[test]
    fn test_equal_scores_keep_first_row_major_position() {
        // The gradient repeats: the window at (24, 0) holds the same pixels
        // as the one at (11, 7).
        let frame = gradient(40, 30);
        let template = image::imageops::crop_imm(&frame, 11, 7, 8, 6).to_image();
        let peak = match_template_masked(&frame, &template, &full_mask(8, 6));
        assert!((peak.score - 1.0).abs() < 1e-9, "score {}", peak.score);
        assert_eq!((peak.x, peak.y), (24, 0));
    }

    #[test]
    fn test_inverted_window_scores_minus_one_and_is_not_picked() {
        let template = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 10 + y * 40) as u8]));
        let mut frame = GrayImage::from_pixel(12, 4, Luma([0]));
        for y in 0..4 {
            for x in 0..4 {
                let v = template.get_pixel(x, y).0[0];
                frame.put_pixel(x, y, Luma([255 - v]));
                frame.put_pixel(x + 8, y, Luma([v]));
            }
        }
        let peak = match_template_masked(&frame, &template, &full_mask(4, 4));
        assert_eq!((peak.x, peak.y), (8, 0));
        assert!((peak.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_frame_is_indeterminate() {
        let frame = GrayImage::from_pixel(20, 20, Luma([128]));
        let template = gradient(5, 5);
        let peak = match_template_masked(&frame, &template, &full_mask(5, 5));
        assert!(!peak.is_determinate());
    }

    #[test]
    fn test_flat_template_is_indeterminate() {
        let frame = gradient(20, 20);
        let template = GrayImage::from_pixel(5, 5, Luma([90]));
        let peak = match_template_masked(&frame, &template, &full_mask(5, 5));
        assert!(peak.score.is_nan());
    }

    #[test]
    fn test_empty_mask_is_indeterminate() {
        let frame = gradient(20, 20);
        let template = gradient(5, 5);
        let white = RgbImage::from_pixel(5, 5, Rgb([255, 255, 255]));
        let mask = ColorMask::from_image(&white, &HueBand::red());
        assert!(!match_template_masked(&frame, &template, &mask).is_determinate());
    }

    #[test]
    fn test_template_larger_than_frame_is_indeterminate() {
        let frame = gradient(4, 4);
        let template = gradient(5, 3);
        assert!(!match_template_masked(&frame, &template, &full_mask(5, 3)).is_determinate());
    }

    #[test]
    fn test_mask_excludes_pixels() {
        // Only the left column of the template is masked in; the right column
        // disagrees with the frame but must not affect the score.
        let template = GrayImage::from_fn(2, 4, |x, y| Luma([if x == 0 { (y * 50) as u8 } else { 200 }]));
        let mut colors = RgbImage::from_pixel(2, 4, Rgb([255, 255, 255]));
        for y in 0..4 {
            colors.put_pixel(0, y, Rgb([230, 10, 10]));
        }
        let mask = ColorMask::from_image(&colors, &HueBand::red());

        let frame = GrayImage::from_fn(2, 4, |x, y| Luma([if x == 0 { (y * 50 + 3) as u8 } else { 7 }]));
        let peak = match_template_masked(&frame, &template, &mask);
        assert!((peak.score - 1.0).abs() < 1e-9);
    }
}
