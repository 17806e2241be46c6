//! Marker template handling and per-frame matching.
//!
//! A [`Template`] is loaded once per run. For each scale it is resized into a
//! [`ScaledTemplate`], which carries a grayscale copy and a color mask derived
//! from the resized pixels. Masks are never reused across scales.

pub mod color_mask;
pub mod correlation;

pub use color_mask::{ColorBand, ColorMask, HueBand};
pub use correlation::{CorrelationPeak, match_template_masked};

use crate::config::{MIN_MASK_PIXELS, MIN_TEMPLATE_SIDE};
use crate::error::{CoreResult, source_unreadable};

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use log::debug;
use std::path::Path;

/// Outline color for annotated matches.
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline thickness in pixels.
const OUTLINE_THICKNESS: u32 = 2;

/// Reads an image file as 8-bit RGB, dropping any alpha channel.
pub fn load_image(path: &Path) -> CoreResult<RgbImage> {
    Ok(image::open(path)
        .map_err(|e| source_unreadable(path, e))?
        .to_rgb8())
}

/// The marker image. Any alpha channel is dropped on load.
#[derive(Debug, Clone)]
pub struct Template {
    image: RgbImage,
    band: HueBand,
}

impl Template {
    /// Loads a template from disk.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let image = load_image(path)?;
        debug!(
            "Loaded template {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_rgb(image))
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image,
            band: HueBand::default(),
        }
    }

    /// Replaces the marker color signature (red by default).
    pub fn with_band(mut self, band: HueBand) -> Self {
        self.band = band;
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Resizes to `floor(w * scale) x floor(h * scale)` and derives a fresh mask.
    ///
    /// Returns `None` for degenerate candidates: non-positive scales, sides
    /// shorter than [`MIN_TEMPLATE_SIDE`] or masks covering fewer than
    /// [`MIN_MASK_PIXELS`] pixels.
    pub fn scaled(&self, scale: f64) -> Option<ScaledTemplate> {
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let (w, h) = self.image.dimensions();
        let width = scaled_side(w, scale)?;
        let height = scaled_side(h, scale)?;

        let resized = imageops::resize(&self.image, width, height, FilterType::Triangle);
        let mask = ColorMask::from_image(&resized, &self.band);
        if mask.count() < MIN_MASK_PIXELS {
            return None;
        }
        let gray = imageops::grayscale(&resized);

        Some(ScaledTemplate { scale, gray, mask })
    }
}

fn scaled_side(side: u32, scale: f64) -> Option<u32> {
    let scaled = (f64::from(side) * scale).floor();
    if scaled < f64::from(MIN_TEMPLATE_SIDE) || scaled > f64::from(u32::MAX) {
        None
    } else {
        Some(scaled as u32)
    }
}

/// A template resized for one candidate scale.
#[derive(Debug, Clone)]
pub struct ScaledTemplate {
    scale: f64,
    gray: GrayImage,
    mask: ColorMask,
}

impl ScaledTemplate {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.gray.dimensions()
    }

    pub fn mask(&self) -> &ColorMask {
        &self.mask
    }

    /// Whether the template fits inside a frame of the given size.
    pub fn fits(&self, frame_width: u32, frame_height: u32) -> bool {
        let (w, h) = self.dimensions();
        w <= frame_width && h <= frame_height
    }

    /// Best masked correlation against a grayscale frame.
    pub fn match_in(&self, frame_index: u64, frame: &GrayImage) -> MatchResult {
        let peak = match_template_masked(frame, &self.gray, &self.mask);
        let (width, height) = self.dimensions();
        MatchResult {
            frame_index,
            score: peak.score,
            location: (peak.x, peak.y),
            width,
            height,
        }
    }
}

/// Outcome of matching one template against one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub frame_index: u64,
    pub score: f64,
    /// Top-left corner of the best match
    pub location: (u32, u32),
    pub width: u32,
    pub height: u32,
}

impl MatchResult {
    /// False when the correlation produced no finite score.
    pub fn is_determinate(&self) -> bool {
        self.score.is_finite()
    }

    /// Determinate and at or above `threshold`.
    pub fn is_detection(&self, threshold: f64) -> bool {
        self.is_determinate() && self.score >= threshold
    }
}

/// Returns a copy of `frame` with the matched region outlined in red.
pub fn annotate_match(frame: &RgbImage, result: &MatchResult) -> RgbImage {
    let mut annotated = frame.clone();
    draw_match_outline(&mut annotated, result);
    annotated
}

/// Draws a rectangle outline around the matched region, clipped to the image.
pub fn draw_match_outline(image: &mut RgbImage, result: &MatchResult) {
    let (img_w, img_h) = image.dimensions();
    let (x0, y0) = result.location;
    let x1 = x0.saturating_add(result.width).min(img_w);
    let y1 = y0.saturating_add(result.height).min(img_h);

    for y in y0..y1 {
        for x in x0..x1 {
            let on_edge = x < x0 + OUTLINE_THICKNESS
                || y < y0 + OUTLINE_THICKNESS
                || x + OUTLINE_THICKNESS >= x0 + result.width
                || y + OUTLINE_THICKNESS >= y0 + result.height;
            if on_edge {
                image.put_pixel(x, y, OUTLINE_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_template(w: u32, h: u32) -> Template {
        Template::from_rgb(RgbImage::from_fn(w, h, |x, y| {
            Rgb([150 + ((x * 11 + y * 5) % 100) as u8, 10, 20])
        }))
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        let template = red_template(40, 30);
        let scaled = template.scaled(0.5).unwrap();
        assert_eq!(scaled.dimensions(), (20, 15));
        assert_eq!(scaled.mask().dimensions(), (20, 15));

        let scaled = template.scaled(0.33).unwrap();
        assert_eq!(scaled.dimensions(), (13, 9));
        assert_eq!(scaled.mask().dimensions(), (13, 9));
    }

    #[test]
    fn test_degenerate_scales_are_none() {
        let template = red_template(40, 30);
        assert!(template.scaled(0.0).is_none());
        assert!(template.scaled(-1.0).is_none());
        assert!(template.scaled(f64::NAN).is_none());
        // 40 * 0.04 = 1.6 -> 1 px wide
        assert!(template.scaled(0.04).is_none());
    }

    #[test]
    fn test_small_mask_is_degenerate() {
        // Mostly white template: only one red pixel survives.
        let mut img = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        img.put_pixel(3, 3, Rgb([230, 10, 10]));
        assert!(Template::from_rgb(img).scaled(1.0).is_none());
    }

    #[test]
    fn test_fits() {
        let scaled = red_template(40, 30).scaled(1.0).unwrap();
        assert!(scaled.fits(40, 30));
        assert!(!scaled.fits(39, 30));
        assert!(!scaled.fits(40, 29));
    }

    #[test]
    fn test_match_result_determinacy() {
        let mut result = MatchResult {
            frame_index: 3,
            score: 0.8,
            location: (0, 0),
            width: 4,
            height: 4,
        };
        assert!(result.is_detection(0.7));
        assert!(!result.is_detection(0.9));
        result.score = f64::NAN;
        assert!(!result.is_determinate());
        assert!(!result.is_detection(0.0));
    }

    #[test]
    fn test_outline_is_two_pixels_and_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let result = MatchResult {
            frame_index: 0,
            score: 1.0,
            location: (2, 2),
            width: 6,
            height: 6,
        };
        draw_match_outline(&mut img, &result);
        assert_eq!(*img.get_pixel(2, 2), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(3, 5), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(7, 7), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(4, 4), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(1, 1), Rgb([0, 0, 0]));

        let overflowing = MatchResult {
            location: (8, 8),
            ..result
        };
        draw_match_outline(&mut img, &overflowing);
        assert_eq!(*img.get_pixel(9, 9), OUTLINE_COLOR);
    }
}
