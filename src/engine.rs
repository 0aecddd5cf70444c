//! File and directory front end for both pipelines.
//!
//! Everything here is I/O plumbing: decode, run a pipeline, encode. A failure
//! on one file (or one element of a sheet) is recorded in its
//! [`ProcessResult`] and never stops the rest of a batch.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::feathering::{apply_alpha, FeatherOptions};
use crate::manifest::{write_manifest, MANIFEST_FILE};
use crate::segmentation::{segment, SegmentOptions};

/// Options controlling reporting and side outputs.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Write `manifest.txt` next to extracted elements.
    pub write_manifest: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            write_manifest: true,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file produced nothing (e.g. no elements survived).
    pub skipped: bool,
    /// Number of images written.
    pub written: usize,
    /// Number of elements that could not be written.
    pub failed_elements: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            written: 0,
            failed_elements: 0,
            message: String::new(),
        }
    }

    fn failed(path: &Path, message: String) -> Self {
        tracing::warn!(path = %path.display(), "{message}");
        Self {
            message,
            ..Self::new(path)
        }
    }
}

/// Decode `path` as RGBA, adding an opaque alpha channel when the source has none.
///
/// # Errors
///
/// Returns [`Error::Image`] if the file cannot be read or decoded.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(to_rgba(image::open(path)?))
}

/// Cut a sprite sheet into elements under `output_dir`.
///
/// Each element is saved as [`ElementRecord::file_name`](crate::ElementRecord::file_name);
/// a manifest is written unless disabled in `process`.
#[must_use]
pub fn extract_file(
    input: &Path,
    output_dir: &Path,
    opts: &SegmentOptions,
    process: &ProcessOptions,
) -> ProcessResult {
    let mut result = ProcessResult::new(input);

    let sheet = match load_rgba(input) {
        Ok(img) => img,
        Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
    };

    let segmentation = match segment(&sheet, opts) {
        Ok(s) => s,
        Err(e) => return ProcessResult::failed(input, format!("Segmentation failed: {e}")),
    };

    for d in &segmentation.discarded {
        tracing::info!(
            index = d.index,
            "skipping element {}: too small ({}x{})",
            d.index,
            d.width,
            d.height
        );
    }

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        return ProcessResult::failed(
            input,
            format!("Failed to create output directory: {e}"),
        );
    }

    let mut records = Vec::with_capacity(segmentation.elements.len());
    for element in &segmentation.elements {
        let path = output_dir.join(element.record.file_name());
        match save_image(&element.image, &path) {
            Ok(()) => {
                tracing::info!(
                    "extracted {} at ({}, {})",
                    element.record.file_name(),
                    element.record.bounds.x_min,
                    element.record.bounds.y_min
                );
                records.push(element.record.clone());
                result.written += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to save element: {e}");
                result.failed_elements += 1;
            }
        }
    }

    if process.write_manifest {
        let manifest_path = output_dir.join(MANIFEST_FILE);
        if let Err(e) = write_manifest(&manifest_path, input, &records) {
            tracing::warn!(path = %manifest_path.display(), "failed to write manifest: {e}");
            return ProcessResult {
                message: format!("Failed to write manifest: {e}"),
                ..result
            };
        }
    }

    result.success = true;
    result.skipped = segmentation.elements.is_empty();
    result.message = format!(
        "Extracted {} element(s), {} too small",
        result.written,
        segmentation.discarded.len()
    );
    if result.failed_elements > 0 {
        let _ = write!(result.message, ", {} failed to save", result.failed_elements);
    }
    result
}

/// Turn the background of `input` into alpha and save it to `output`.
#[must_use]
pub fn remove_background_file(
    input: &Path,
    output: &Path,
    opts: &FeatherOptions,
) -> ProcessResult {
    let mut result = ProcessResult::new(input);

    let mut img = match load_rgba(input) {
        Ok(img) => img,
        Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
    };

    let background = match apply_alpha(&mut img, opts) {
        Ok(bg) => bg,
        Err(e) => return ProcessResult::failed(input, format!("Background removal failed: {e}")),
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return ProcessResult::failed(
                    input,
                    format!("Failed to create output directory: {e}"),
                );
            }
        }
    }

    match save_image(&img, output) {
        Ok(()) => {
            result.success = true;
            result.written = 1;
            result.message = format!(
                "Background RGB({}, {}, {}) removed",
                background[0], background[1], background[2]
            );
        }
        Err(e) => return ProcessResult::failed(input, format!("Failed to save: {e}")),
    }

    result
}

/// List the supported image files directly inside `dir`, sorted by path.
fn image_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Run `job` over every supported image in `input_dir`.
///
/// Uses parallel iteration when the `rayon` feature is enabled. Results keep
/// the sorted input order.
fn process_entries<F>(input_dir: &Path, output_dir: &Path, job: F) -> Vec<ProcessResult>
where
    F: Fn(&Path) -> ProcessResult + Sync,
{
    let entries = match image_entries(input_dir) {
        Ok(entries) => entries,
        Err(e) => {
            return vec![ProcessResult::failed(
                input_dir,
                format!("Failed to read directory: {e}"),
            )]
        }
    };

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        return vec![ProcessResult::failed(
            output_dir,
            format!("Failed to create output directory: {e}"),
        )];
    }

    let entries = with_stem_owners(entries);
    let run = |(input, owner): &(PathBuf, Option<PathBuf>)| match owner {
        Some(first) => ProcessResult::failed(
            input,
            format!(
                "Output name collides with {}; rename one of them",
                first.display()
            ),
        ),
        None => job(input.as_path()),
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        entries.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        entries.iter().map(run).collect()
    }
}

/// Pair each entry with the earlier entry sharing its file stem, if any.
///
/// Directory outputs are named after the stem, so `icon.png` and `icon.bmp`
/// would write to the same target. Only the first of them in sorted order is
/// processed.
fn with_stem_owners(entries: Vec<PathBuf>) -> Vec<(PathBuf, Option<PathBuf>)> {
    let mut owners: HashMap<OsString, PathBuf> = HashMap::new();
    entries
        .into_iter()
        .map(|path| {
            let stem = path.file_stem().unwrap_or_default().to_os_string();
            let owner = owners.get(&stem).cloned();
            if owner.is_none() {
                owners.insert(stem, path.clone());
            }
            (path, owner)
        })
        .collect()
}

/// Extract every sheet in `input_dir` into `output_dir/<stem>/`.
///
/// Sheets whose stem repeats an earlier one (`sheet.png`, `sheet.bmp`) fail
/// instead of sharing a folder.
#[must_use]
pub fn extract_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &SegmentOptions,
    process: &ProcessOptions,
) -> Vec<ProcessResult> {
    process_entries(input_dir, output_dir, |input| {
        let stem = input.file_stem().unwrap_or_default();
        extract_file(input, &output_dir.join(stem), opts, process)
    })
}

/// Remove the background of every image in `input_dir`.
///
/// Outputs keep their stem and are always written as PNG; an input whose stem
/// repeats an earlier one fails rather than overwriting it.
#[must_use]
pub fn remove_background_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &FeatherOptions,
) -> Vec<ProcessResult> {
    process_entries(input_dir, output_dir, |input| {
        let mut name = PathBuf::from(input.file_name().unwrap_or_default());
        name.set_extension("png");
        remove_background_file(input, &output_dir.join(name), opts)
    })
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image, keeping the alpha channel.
///
/// Only formats that can carry alpha are accepted.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} cannot store an alpha channel"
            )));
        }
    }

    Ok(())
}

/// Re-encode an in-memory image as RGBA, the form both pipelines consume.
#[must_use]
pub fn to_rgba(img: DynamicImage) -> RgbaImage {
    img.into_rgba8()
}

/// Default element directory for a sheet.
///
/// Example: `"ui/sheet.png"` becomes `"ui/sheet_elements"`.
#[must_use]
pub fn default_extract_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_elements"))
}

/// Default output path for a single background-removal run.
///
/// Example: `"button.jpg"` becomes `"button_transparent.png"`.
#[must_use]
pub fn default_transparent_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_transparent.png"))
}

/// Default output directory for a batch background-removal run.
///
/// Example: `"assets/buttons"` becomes `"assets/buttons_transparent"`.
#[must_use]
pub fn default_transparent_dir(input_dir: &Path) -> PathBuf {
    let mut name = input_dir.as_os_str().to_os_string();
    name.push("_transparent");
    PathBuf::from(name)
}
