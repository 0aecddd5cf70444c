//! Euclidean RGB distance to the background color.
//!
//! Both pipelines threshold this map, so they share one definition of how far
//! a pixel is from the background.

use image::{ImageBuffer, Luma, Rgb, Rgba, RgbaImage};

/// Per-pixel distance to the background, same shape as the source image.
pub type DistanceMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Euclidean distance between the RGB part of `px` and `background`.
///
/// Channel differences are taken in `i16` and the squared sum in `i32`, so no
/// combination of `u8` inputs can wrap. Alpha does not participate.
#[must_use]
pub fn pixel_distance(px: &Rgba<u8>, background: Rgb<u8>) -> f32 {
    let sum: i32 = (0..3)
        .map(|ch| {
            let d = i16::from(px[ch]) - i16::from(background[ch]);
            i32::from(d) * i32::from(d)
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let sum = sum as f32;
    sum.sqrt()
}

/// Compute the distance map of `image` against `background`.
///
/// With the `rayon` feature rows are processed in parallel; every value is
/// computed by [`pixel_distance`] either way, so the result is identical.
#[must_use]
pub fn color_distance(image: &RgbaImage, background: Rgb<u8>) -> DistanceMap {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;

        let (width, height) = image.dimensions();
        let mut map = DistanceMap::new(width, height);
        if width == 0 || height == 0 {
            return map;
        }
        let src: &[u8] = image.as_raw();
        map.par_chunks_mut(width as usize)
            .zip(src.par_chunks(width as usize * 4))
            .for_each(|(dst, row)| {
                for (d, px) in dst.iter_mut().zip(row.chunks_exact(4)) {
                    *d = pixel_distance(&Rgba([px[0], px[1], px[2], px[3]]), background);
                }
            });
        map
    }

    #[cfg(not(feature = "rayon"))]
    {
        imageproc::map::map_colors(image, |px| Luma([pixel_distance(&px, background)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_only_for_exact_match() {
        let bg = Rgb([200, 100, 50]);
        assert!(pixel_distance(&Rgba([200, 100, 50, 0]), bg).abs() < f32::EPSILON);
        assert!(pixel_distance(&Rgba([200, 100, 51, 255]), bg) > 0.0);
    }

    #[test]
    fn distance_of_axis_offset_is_exact() {
        let bg = Rgb([100, 100, 100]);
        assert!((pixel_distance(&Rgba([125, 100, 100, 255]), bg) - 25.0).abs() < f32::EPSILON);
        assert!((pixel_distance(&Rgba([100, 74, 100, 255]), bg) - 26.0).abs() < f32::EPSILON);
    }

    #[test]
    fn extreme_channels_do_not_overflow() {
        let d = pixel_distance(&Rgba([255, 255, 255, 255]), Rgb([0, 0, 0]));
        let expected = (3.0_f32 * 255.0 * 255.0).sqrt();
        assert!((d - expected).abs() < 1e-3, "got {d}");

        let d = pixel_distance(&Rgba([0, 0, 0, 255]), Rgb([255, 255, 255]));
        assert!((d - expected).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn map_matches_per_pixel_distance() {
        #[allow(clippy::cast_possible_truncation)]
        let img = RgbaImage::from_fn(7, 5, |x, y| Rgba([(x * 30) as u8, (y * 50) as u8, 10, 255]));
        let bg = Rgb([0, 0, 10]);
        let map = color_distance(&img, bg);
        assert_eq!(map.dimensions(), (7, 5));
        for (x, y, d) in map.enumerate_pixels() {
            let expected = pixel_distance(img.get_pixel(x, y), bg);
            assert!((d[0] - expected).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn empty_image_gives_empty_map() {
        let map = color_distance(&RgbaImage::new(0, 0), Rgb([0, 0, 0]));
        assert_eq!(map.dimensions(), (0, 0));
    }
}
