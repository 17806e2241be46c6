//! Hue-band color segmentation.
//!
//! Colors are converted to HSV using the 8-bit convention of common vision
//! libraries: hue in [0, 180) (degrees halved), saturation and value in
//! [0, 255]. Red wraps around hue 0, so the default marker signature is the
//! union of two bands.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Inclusive HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBand {
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
}

impl ColorBand {
    pub fn contains(&self, (h, s, v): (u8, u8, u8)) -> bool {
        (self.hue.0..=self.hue.1).contains(&h)
            && (self.saturation.0..=self.saturation.1).contains(&s)
            && (self.value.0..=self.value.1).contains(&v)
    }
}

/// A set of HSV bands; a pixel matches if it falls in any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HueBand {
    pub bands: Vec<ColorBand>,
}

impl HueBand {
    /// Dual red band with saturation/value floors of 70.
    pub fn red() -> Self {
        Self {
            bands: vec![
                ColorBand {
                    hue: (0, 10),
                    saturation: (70, 255),
                    value: (70, 255),
                },
                ColorBand {
                    hue: (170, 180),
                    saturation: (70, 255),
                    value: (70, 255),
                },
            ],
        }
    }

    pub fn matches(&self, pixel: &Rgb<u8>) -> bool {
        let hsv = rgb_to_hsv(pixel);
        self.bands.iter().any(|band| band.contains(hsv))
    }
}

impl Default for HueBand {
    fn default() -> Self {
        Self::red()
    }
}

/// Binary per-pixel mask (255 = inside the band).
#[derive(Debug, Clone)]
pub struct ColorMask {
    image: GrayImage,
    count: usize,
}

impl ColorMask {
    /// Segments `image` by `band`. The mask always has the image's dimensions.
    pub fn from_image(image: &RgbImage, band: &HueBand) -> Self {
        let mut count = 0;
        let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            if band.matches(image.get_pixel(x, y)) {
                count += 1;
                Luma([255])
            } else {
                Luma([0])
            }
        });
        Self { image: mask, count }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// 8-bit HSV (H in [0, 180), S and V in [0, 255]).
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> (u8, u8, u8) {
    let [r, g, b] = pixel.0.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { delta * 255.0 / v } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    ((h / 2.0).round() as u8, s.round() as u8, v as u8)
}
