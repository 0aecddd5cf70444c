//! Cut sprite sheets into individual elements and turn flat backgrounds into alpha.
//!
//! Both pipelines start by inferring the sheet's background color from its
//! four corners, then measure each pixel's RGB distance to it.
//!
//! # Segmentation
//!
//! Pixels farther than a threshold from the background are foreground;
//! 8-connected foreground regions become elements, each padded, clamped to the
//! sheet and cropped.
//!
//! ```no_run
//! use sprite_extract::{segment, SegmentOptions};
//!
//! let sheet = image::open("ui_sheet.png").unwrap().to_rgba8();
//! let seg = segment(&sheet, &SegmentOptions::default()).unwrap();
//! for element in &seg.elements {
//!     element.image.save(element.record.file_name()).unwrap();
//! }
//! ```
//!
//! # Background removal
//!
//! The same distance drives the alpha channel, either as a hard cutoff or as
//! a feathered ramp that keeps anti-aliased edges smooth.
//!
//! ```no_run
//! use sprite_extract::{apply_alpha, FeatherOptions};
//!
//! let mut img = image::open("button.png").unwrap().to_rgba8();
//! apply_alpha(&mut img, &FeatherOptions::default()).unwrap();
//! img.save("button_transparent.png").unwrap();
//! ```

#![deny(missing_docs)]

pub mod background;
pub mod distance;
mod engine;
pub mod error;
pub mod feathering;
pub mod manifest;
pub mod segmentation;

pub use background::infer_background;
pub use distance::{color_distance, pixel_distance, DistanceMap};
pub use engine::{
    default_extract_dir, default_transparent_dir, default_transparent_path, extract_directory,
    extract_file, is_supported_image, load_rgba, remove_background_directory,
    remove_background_file, save_image, to_rgba, ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use feathering::{alpha_for_distance, apply_alpha, remove_background, FeatherOptions};
pub use manifest::{format_manifest, write_manifest};
pub use segmentation::{
    segment, BoundingBox, Discarded, Element, ElementRecord, SegmentOptions, Segmentation,
};
