//! Error types for the sprite-extract crate.

/// Errors that can occur while segmenting sheets or removing backgrounds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The corner sample window does not fit inside the image.
    #[error("sample window {sample_size}x{sample_size} does not fit a {width}x{height} image")]
    InvalidSampleSize {
        /// Requested window edge length in pixels.
        sample_size: u32,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// A color-distance threshold was negative or not a finite number.
    #[error("threshold must be a finite, non-negative distance, got {0}")]
    InvalidThreshold(f32),

    /// The minimum element size was zero.
    #[error("minimum element size must be at least 1 pixel")]
    InvalidMinSize,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format cannot carry an alpha channel.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image codec failed to decode or encode.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Check that `threshold` is usable as a color distance.
pub(crate) fn check_threshold(threshold: f32) -> Result<()> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("jpeg".to_string());
        assert!(unsupported.to_string().contains("jpeg"));

        let bad_window = Error::InvalidSampleSize {
            sample_size: 100,
            width: 64,
            height: 80,
        };
        let msg = bad_window.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("64x80"));

        assert!(Error::InvalidThreshold(-1.0).to_string().contains("-1"));
    }

    #[test]
    fn threshold_check_rejects_negative_and_nan() {
        assert!(check_threshold(0.0).is_ok());
        assert!(check_threshold(30.0).is_ok());
        assert!(matches!(
            check_threshold(-0.5),
            Err(Error::InvalidThreshold(_))
        ));
        assert!(check_threshold(f32::NAN).is_err());
        assert!(check_threshold(f32::INFINITY).is_err());
    }
}
