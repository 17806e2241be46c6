// markscan-core/tests/common/mod.rs
//
// Synthetic frames shared by the integration tests. The marker is a 40x40
// red patch with an irregular brightness pattern; frames are seeded noise
// so that no position correlates strongly with it by chance.

#![allow(dead_code)]

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use markscan_core::calibration::Resolution;
use markscan_core::external::frame_source::IterFrameSource;
use markscan_core::matching::Template;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MARKER_SIDE: u32 = 40;

pub fn marker_image() -> RgbImage {
    RgbImage::from_fn(MARKER_SIDE, MARKER_SIDE, |x, y| {
        Rgb([120 + ((x * 37 + y * 53) % 110) as u8, 10, 15])
    })
}

pub fn marker_template() -> Template {
    Template::from_rgb(marker_image())
}

/// The marker as it appears at `scale`, resized the same way the matcher does.
pub fn marker_at_scale(scale: f64) -> RgbImage {
    let side = (f64::from(MARKER_SIDE) * scale).floor() as u32;
    imageops::resize(&marker_image(), side, side, FilterType::Triangle)
}

pub fn noise_frame(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
}

/// Noise frame with the marker pasted at `scale` with its top-left at (x, y).
pub fn frame_with_marker(width: u32, height: u32, seed: u64, scale: f64, x: i64, y: i64) -> RgbImage {
    let mut frame = noise_frame(width, height, seed);
    imageops::replace(&mut frame, &marker_at_scale(scale), x, y);
    frame
}

/// A `total`-frame video whose frames in `visible` show the marker at `scale`.
pub fn synthetic_video(
    width: u32,
    height: u32,
    total: u64,
    visible: std::ops::RangeInclusive<u64>,
    scale: f64,
) -> IterFrameSource<impl Iterator<Item = RgbImage>> {
    let plain = noise_frame(width, height, 99);
    let marked = frame_with_marker(width, height, 99, scale, 13, 7);
    let frames = (0..total).map(move |i| {
        if visible.contains(&i) {
            marked.clone()
        } else {
            plain.clone()
        }
    });
    IterFrameSource::new(Resolution::new(width, height), frames)
}
