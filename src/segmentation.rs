//! Sprite sheet segmentation.
//!
//! Pipeline:
//! 1. Infer the background from the sheet corners ([`SEGMENT_SAMPLE_SIZE`] window).
//! 2. Mark every pixel farther than `color_threshold` from it as foreground.
//! 3. Label 8-connected foreground regions.
//! 4. Size-filter each region on its tight box, then pad, clamp and crop.
//!
//! Labels follow raster-scan order of each region's first pixel: scanning rows
//! top to bottom and each row left to right, the first foreground pixel met
//! belongs to label 1, the first pixel of a not-yet-seen region to label 2, and
//! so on. Element indices (and therefore output file names) are these labels.

use image::{imageops, GrayImage, ImageBuffer, Luma, Rgb, RgbaImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::background::{infer_background, SEGMENT_SAMPLE_SIZE};
use crate::distance::{color_distance, DistanceMap};
use crate::error::{check_threshold, Error, Result};

/// Mask value for foreground pixels.
const FOREGROUND: u8 = 255;

/// Per-pixel component labels; `0` is background, regions are `1..=N`.
pub type LabelMap = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Options for [`segment`].
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Distance above which a pixel counts as foreground (strict).
    pub color_threshold: f32,
    /// Margin added on every side of an element's tight box.
    pub padding: u32,
    /// Minimum tight-box width and height; smaller regions are discarded.
    pub min_size: u32,
    /// Corner window edge for background inference.
    pub sample_size: u32,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            color_threshold: 30.0,
            padding: 4,
            min_size: 15,
            sample_size: SEGMENT_SAMPLE_SIZE,
        }
    }
}

impl SegmentOptions {
    /// Check the options before touching any pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThreshold`] for a negative or non-finite
    /// threshold and [`Error::InvalidMinSize`] when `min_size` is zero.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.color_threshold)?;
        if self.min_size == 0 {
            return Err(Error::InvalidMinSize);
        }
        Ok(())
    }
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Leftmost column.
    pub x_min: u32,
    /// Topmost row.
    pub y_min: u32,
    /// Rightmost column (inclusive).
    pub x_max: u32,
    /// Bottom row (inclusive).
    pub y_max: u32,
}

impl BoundingBox {
    fn at(x: u32, y: u32) -> Self {
        Self {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    /// Width in pixels, both ends included.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    /// Height in pixels, both ends included.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    /// Grow by `padding` on every side, clamped to a `width x height` image.
    #[must_use]
    pub fn padded(&self, padding: u32, width: u32, height: u32) -> Self {
        Self {
            x_min: self.x_min.saturating_sub(padding),
            y_min: self.y_min.saturating_sub(padding),
            x_max: self
                .x_max
                .saturating_add(padding)
                .min(width.saturating_sub(1)),
            y_max: self
                .y_max
                .saturating_add(padding)
                .min(height.saturating_sub(1)),
        }
    }
}

/// Placement metadata for one extracted element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    /// Component label, 1-based.
    pub index: u32,
    /// Padded and clamped box that was cropped.
    pub bounds: BoundingBox,
    /// Tight box around the component's pixels.
    pub content: BoundingBox,
    /// Width of the cropped image.
    pub width: u32,
    /// Height of the cropped image.
    pub height: u32,
}

impl ElementRecord {
    /// Output file name, e.g. `element_03_20x18.png` (tight dimensions).
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "element_{:02}_{}x{}.png",
            self.index,
            self.content.width(),
            self.content.height()
        )
    }
}

/// A cropped element and where it came from.
#[derive(Debug, Clone)]
pub struct Element {
    /// Placement metadata.
    pub record: ElementRecord,
    /// Crop of the original sheet, color and alpha untouched.
    pub image: RgbaImage,
}

/// A component dropped by the size filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discarded {
    /// Component label, 1-based.
    pub index: u32,
    /// Tight-box width.
    pub width: u32,
    /// Tight-box height.
    pub height: u32,
}

/// Outcome of segmenting one sheet.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Inferred background color.
    pub background: Rgb<u8>,
    /// Surviving elements in label order.
    pub elements: Vec<Element>,
    /// Components rejected by the size filter, in label order.
    pub discarded: Vec<Discarded>,
}

impl Segmentation {
    /// Records of the surviving elements, in label order.
    #[must_use]
    pub fn records(&self) -> Vec<ElementRecord> {
        self.elements.iter().map(|e| e.record.clone()).collect()
    }
}

/// Foreground mask: [`FOREGROUND`] where `distance > threshold`, 0 elsewhere.
#[must_use]
pub fn foreground_mask(distance: &DistanceMap, threshold: f32) -> GrayImage {
    let mut mask = GrayImage::new(distance.width(), distance.height());
    for (m, d) in mask.pixels_mut().zip(distance.pixels()) {
        if d[0] > threshold {
            m[0] = FOREGROUND;
        }
    }
    mask
}

/// Label the 8-connected foreground regions of `mask`.
///
/// Labels are dense and assigned in raster-scan first-pixel order.
#[must_use]
pub fn label_components(mask: &GrayImage) -> LabelMap {
    connected_components(mask, Connectivity::Eight, Luma([0u8]))
}

/// Tight bounding box of every label, indexed by `label - 1`.
#[must_use]
pub fn component_bounds(labels: &LabelMap) -> Vec<BoundingBox> {
    let mut boxes: Vec<Option<BoundingBox>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let Some(slot) = (label[0] as usize).checked_sub(1) else {
            continue;
        };
        if slot >= boxes.len() {
            boxes.resize(slot + 1, None);
        }
        if let Some(bbox) = &mut boxes[slot] {
            bbox.include(x, y);
        } else {
            boxes[slot] = Some(BoundingBox::at(x, y));
        }
    }
    // Labels are dense, so every slot has been filled.
    boxes.into_iter().flatten().collect()
}

/// Split a sprite sheet into its elements.
///
/// An empty sheet, or one where every component is below `min_size`, yields
/// an empty element list rather than an error.
///
/// # Errors
///
/// Fails if the options are invalid or the sample window does not fit.
pub fn segment(image: &RgbaImage, opts: &SegmentOptions) -> Result<Segmentation> {
    opts.validate()?;

    let background = infer_background(image, opts.sample_size)?;
    let distance = color_distance(image, background);
    let mask = foreground_mask(&distance, opts.color_threshold);

    let foreground = mask.pixels().filter(|p| p[0] == FOREGROUND).count();
    tracing::debug!(
        foreground,
        total = mask.len(),
        "computed foreground mask"
    );

    let labels = label_components(&mask);
    let boxes = component_bounds(&labels);
    tracing::debug!(components = boxes.len(), "labelled components");

    let (width, height) = image.dimensions();
    let mut elements = Vec::new();
    let mut discarded = Vec::new();

    for (index, content) in (1u32..).zip(boxes) {
        if content.width() < opts.min_size || content.height() < opts.min_size {
            tracing::debug!(
                index,
                width = content.width(),
                height = content.height(),
                "skipping component below minimum size"
            );
            discarded.push(Discarded {
                index,
                width: content.width(),
                height: content.height(),
            });
            continue;
        }

        let bounds = content.padded(opts.padding, width, height);
        let crop = imageops::crop_imm(
            image,
            bounds.x_min,
            bounds.y_min,
            bounds.width(),
            bounds.height(),
        )
        .to_image();

        elements.push(Element {
            record: ElementRecord {
                index,
                bounds,
                content,
                width: crop.width(),
                height: crop.height(),
            },
            image: crop,
        });
    }

    Ok(Segmentation {
        background,
        elements,
        discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const PAPER: Rgba<u8> = Rgba([250, 245, 230, 255]);
    const INK: Rgba<u8> = Rgba([20, 30, 40, 255]);

    fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, px: Rgba<u8>) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, px);
            }
        }
    }

    fn opts(sample_size: u32) -> SegmentOptions {
        SegmentOptions {
            sample_size,
            ..SegmentOptions::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let o = SegmentOptions::default();
        assert!((o.color_threshold - 30.0).abs() < f32::EPSILON);
        assert_eq!(o.padding, 4);
        assert_eq!(o.min_size, 15);
        assert_eq!(o.sample_size, 100);
    }

    #[test]
    fn mask_threshold_is_strict() {
        let distance = DistanceMap::from_raw(3, 1, vec![29.9, 30.0, 30.1]).unwrap();
        let mask = foreground_mask(&distance, 30.0);
        assert_eq!(mask.as_raw(), &vec![0, 0, FOREGROUND]);
    }

    #[test]
    fn diagonal_pixels_share_a_label() {
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        mask.put_pixel(1, 1, Luma([FOREGROUND]));
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        let labels = label_components(&mask);
        assert_eq!(labels.get_pixel(0, 0)[0], 1);
        assert_eq!(labels.get_pixel(2, 2)[0], 1);
        assert_eq!(component_bounds(&labels).len(), 1);
    }

    #[test]
    fn labels_follow_raster_order_of_first_pixel() {
        let mut mask = GrayImage::new(10, 10);
        // Region A starts lower but further left; region B starts on row 0.
        for y in 5..8 {
            mask.put_pixel(0, y, Luma([FOREGROUND]));
        }
        for y in 0..3 {
            mask.put_pixel(8, y, Luma([FOREGROUND]));
        }
        let labels = label_components(&mask);
        assert_eq!(labels.get_pixel(8, 0)[0], 1);
        assert_eq!(labels.get_pixel(0, 5)[0], 2);

        let boxes = component_bounds(&labels);
        assert_eq!(
            boxes,
            vec![
                BoundingBox {
                    x_min: 8,
                    y_min: 0,
                    x_max: 8,
                    y_max: 2
                },
                BoundingBox {
                    x_min: 0,
                    y_min: 5,
                    x_max: 0,
                    y_max: 7
                },
            ]
        );
    }

    #[test]
    fn u_shape_is_one_component_with_tight_box() {
        let mut mask = GrayImage::new(8, 8);
        for y in 1..6 {
            mask.put_pixel(1, y, Luma([FOREGROUND]));
            mask.put_pixel(5, y, Luma([FOREGROUND]));
        }
        for x in 1..6 {
            mask.put_pixel(x, 5, Luma([FOREGROUND]));
        }
        let boxes = component_bounds(&label_components(&mask));
        assert_eq!(
            boxes,
            vec![BoundingBox {
                x_min: 1,
                y_min: 1,
                x_max: 5,
                y_max: 5
            }]
        );
    }

    #[test]
    fn padding_clamps_to_image_edges() {
        let tight = BoundingBox {
            x_min: 2,
            y_min: 0,
            x_max: 97,
            y_max: 99,
        };
        let padded = tight.padded(4, 100, 100);
        assert_eq!(
            padded,
            BoundingBox {
                x_min: 0,
                y_min: 0,
                x_max: 99,
                y_max: 99
            }
        );
    }

    #[test]
    fn centered_square_is_padded_and_cropped() {
        let mut img = RgbaImage::from_pixel(100, 100, PAPER);
        fill_rect(&mut img, 40, 40, 20, 20, INK);

        let seg = segment(&img, &opts(100)).unwrap();
        assert_eq!(seg.background, Rgb([250, 245, 230]));
        assert_eq!(seg.elements.len(), 1);

        let record = &seg.elements[0].record;
        assert_eq!(record.index, 1);
        assert_eq!(
            record.bounds,
            BoundingBox {
                x_min: 36,
                y_min: 36,
                x_max: 63,
                y_max: 63
            }
        );
        assert_eq!((record.width, record.height), (28, 28));
        assert_eq!(record.file_name(), "element_01_20x20.png");
        assert_eq!(seg.records(), vec![record.clone()]);

        let crop = &seg.elements[0].image;
        assert_eq!(crop.dimensions(), (28, 28));
        assert_eq!(*crop.get_pixel(0, 0), PAPER);
        assert_eq!(*crop.get_pixel(4, 4), INK);
    }

    #[test]
    fn region_below_min_size_is_discarded() {
        let mut img = RgbaImage::from_pixel(100, 100, PAPER);
        fill_rect(&mut img, 40, 40, 20, 20, INK);

        let seg = segment(
            &img,
            &SegmentOptions {
                min_size: 25,
                ..opts(100)
            },
        )
        .unwrap();
        assert!(seg.elements.is_empty());
        assert_eq!(
            seg.discarded,
            vec![Discarded {
                index: 1,
                width: 20,
                height: 20
            }]
        );
    }

    #[test]
    fn size_filter_uses_both_dimensions() {
        let mut img = RgbaImage::from_pixel(120, 120, PAPER);
        // Wide but short bar: 40x10.
        fill_rect(&mut img, 30, 30, 40, 10, INK);
        let seg = segment(&img, &opts(20)).unwrap();
        assert!(seg.elements.is_empty());
        assert_eq!(seg.discarded.len(), 1);
    }

    #[test]
    fn blank_sheet_yields_no_elements() {
        let img = RgbaImage::from_pixel(64, 64, PAPER);
        let seg = segment(&img, &opts(32)).unwrap();
        assert!(seg.elements.is_empty());
        assert!(seg.discarded.is_empty());
    }

    #[test]
    fn crop_keeps_original_alpha() {
        let mut img = RgbaImage::from_pixel(80, 80, PAPER);
        fill_rect(&mut img, 20, 20, 16, 16, Rgba([20, 30, 40, 90]));
        let seg = segment(
            &img,
            &SegmentOptions {
                padding: 0,
                ..opts(10)
            },
        )
        .unwrap();
        let crop = &seg.elements[0].image;
        assert_eq!(crop.dimensions(), (16, 16));
        assert!(crop.pixels().all(|p| *p == Rgba([20, 30, 40, 90])));
    }

    #[test]
    fn elements_are_reported_in_label_order() {
        let mut img = RgbaImage::from_pixel(200, 120, PAPER);
        // Top-right element begins on an earlier row than the left one.
        fill_rect(&mut img, 150, 25, 20, 20, INK);
        fill_rect(&mut img, 25, 60, 30, 30, INK);
        // Speck that the size filter drops.
        fill_rect(&mut img, 100, 100, 3, 3, INK);

        let seg = segment(&img, &opts(20)).unwrap();
        let indices: Vec<u32> = seg.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(seg.elements[0].record.content.x_min, 150);
        assert_eq!(seg.elements[1].record.content.x_min, 25);
        assert_eq!(seg.discarded[0].index, 3);
    }

    #[test]
    fn invalid_options_fail_fast() {
        let img = RgbaImage::from_pixel(50, 50, PAPER);
        assert!(matches!(
            segment(
                &img,
                &SegmentOptions {
                    min_size: 0,
                    ..opts(10)
                }
            ),
            Err(Error::InvalidMinSize)
        ));
        assert!(matches!(
            segment(
                &img,
                &SegmentOptions {
                    color_threshold: -1.0,
                    ..opts(10)
                }
            ),
            Err(Error::InvalidThreshold(_))
        ));
        assert!(matches!(
            segment(&img, &opts(100)),
            Err(Error::InvalidSampleSize { .. })
        ));
    }
}
