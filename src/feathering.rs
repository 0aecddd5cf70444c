//! Background-to-alpha conversion.
//!
//! The opacity of each pixel is derived from its distance to the inferred
//! background color. With a hard cutoff a pixel is either fully opaque or
//! fully transparent; with feathering the opacity ramps linearly from
//! `threshold / 2` (transparent) to `threshold * 2` (opaque), which softens
//! anti-aliased edges instead of leaving a jagged fringe.
//!
//! Only the alpha channel is rewritten. RGB is left as-is even where alpha
//! becomes zero, so a later pass can still recover the original colors.

use image::{Rgb, RgbaImage};

use crate::background::{infer_background, FEATHER_SAMPLE_SIZE};
use crate::distance::pixel_distance;
use crate::error::{check_threshold, Result};

/// Options for [`apply_alpha`] and [`remove_background`].
#[derive(Debug, Clone)]
pub struct FeatherOptions {
    /// Background distance threshold.
    pub threshold: f32,
    /// Ramp the alpha instead of cutting at `threshold`.
    pub feather: bool,
    /// Corner window edge for background inference.
    pub sample_size: u32,
}

impl Default for FeatherOptions {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            feather: true,
            sample_size: FEATHER_SAMPLE_SIZE,
        }
    }
}

impl FeatherOptions {
    /// Check the options before touching any pixels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidThreshold`] for a negative or non-finite
    /// threshold.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.threshold)
    }
}

/// Map a background distance to an alpha value.
///
/// Hard cutoff: 255 when `distance > threshold`, else 0.
///
/// Feathered: `(distance - threshold/2) / (1.5 * threshold) * 255`, clamped to
/// `[0, 255]` and truncated. A zero threshold leaves no ramp, so any nonzero
/// distance is opaque.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn alpha_for_distance(distance: f32, threshold: f32, feather: bool) -> u8 {
    if !feather || threshold <= 0.0 {
        return if distance > threshold { u8::MAX } else { 0 };
    }

    let start = threshold * 0.5;
    let span = threshold * 1.5;
    ((distance - start) / span * 255.0).clamp(0.0, 255.0) as u8
}

/// Rewrite the alpha channel of `image` in place.
///
/// Returns the inferred background color.
///
/// # Errors
///
/// Fails if the threshold is invalid or the sample window does not fit.
pub fn apply_alpha(image: &mut RgbaImage, opts: &FeatherOptions) -> Result<Rgb<u8>> {
    opts.validate()?;
    let background = infer_background(image, opts.sample_size)?;

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        image.par_pixels_mut().for_each(|px| {
            px[3] = alpha_for_distance(pixel_distance(px, background), opts.threshold, opts.feather);
        });
    }

    #[cfg(not(feature = "rayon"))]
    for px in image.pixels_mut() {
        px[3] = alpha_for_distance(pixel_distance(px, background), opts.threshold, opts.feather);
    }

    Ok(background)
}

/// Return a copy of `image` with its background turned into alpha.
///
/// # Errors
///
/// See [`apply_alpha`].
pub fn remove_background(image: &RgbaImage, opts: &FeatherOptions) -> Result<RgbaImage> {
    let mut out = image.clone();
    apply_alpha(&mut out, opts)?;
    Ok(out)
}
