//! Background color inference from corner samples.
//!
//! Sprite sheets are drawn on a flat fill, so the corners of the sheet are
//! almost always background. Four square windows, one per corner, are pooled
//! and the most frequent RGB value wins.

use std::collections::HashMap;

use image::{Rgb, RgbaImage};

use crate::error::{Error, Result};

/// Corner window edge used by the segmentation pipeline.
pub const SEGMENT_SAMPLE_SIZE: u32 = 100;

/// Corner window edge used by the feathering pipeline.
pub const FEATHER_SAMPLE_SIZE: u32 = 20;

/// Top-left origins of the four `size x size` corner windows, in sampling order:
/// top-left, top-right, bottom-left, bottom-right.
fn corner_origins(width: u32, height: u32, size: u32) -> [(u32, u32); 4] {
    let right = width - size;
    let bottom = height - size;
    [(0, 0), (right, 0), (0, bottom), (right, bottom)]
}

/// Infer the background color of `image` from its four corners.
///
/// Every pixel of the four `sample_size x sample_size` corner windows is
/// counted by its RGB value (alpha is ignored). The most frequent value is
/// returned; ties go to the value encountered first, scanning the windows in
/// top-left, top-right, bottom-left, bottom-right order and each window
/// row-major.
///
/// # Errors
///
/// Returns [`Error::InvalidSampleSize`] if `sample_size` is zero or larger
/// than either image dimension.
pub fn infer_background(image: &RgbaImage, sample_size: u32) -> Result<Rgb<u8>> {
    let (width, height) = image.dimensions();
    if sample_size == 0 || sample_size > width || sample_size > height {
        return Err(Error::InvalidSampleSize {
            sample_size,
            width,
            height,
        });
    }

    // value -> (count, first-seen position)
    let mut counts: HashMap<[u8; 3], (u32, usize)> = HashMap::new();
    let mut seen = 0usize;

    for (ox, oy) in corner_origins(width, height, sample_size) {
        for y in oy..oy + sample_size {
            for x in ox..ox + sample_size {
                let px = image.get_pixel(x, y);
                let entry = counts.entry([px[0], px[1], px[2]]).or_insert((0, seen));
                entry.0 += 1;
                seen += 1;
            }
        }
    }

    let (rgb, _) = counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .ok_or(Error::InvalidSampleSize {
            sample_size,
            width,
            height,
        })?;

    tracing::debug!(r = rgb[0], g = rgb[1], b = rgb[2], sample_size, "inferred background");
    Ok(Rgb(rgb))
}
