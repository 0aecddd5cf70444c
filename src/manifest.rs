//! Plain-text manifest listing the elements cut from a sheet.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::segmentation::ElementRecord;

/// File name of the manifest inside an output directory.
pub const MANIFEST_FILE: &str = "manifest.txt";

/// Render the manifest for `records` extracted from `source`.
///
/// ```text
/// Source: sheets/ui.png
/// Elements: 2
///
/// element_01_20x20.png: x=36, y=36, 28x28
/// element_03_41x17.png: x=100, y=8, 49x25
/// ```
#[must_use]
pub fn format_manifest(source: &Path, records: &[ElementRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source: {}", source.display());
    let _ = writeln!(out, "Elements: {}", records.len());
    out.push('\n');
    for r in records {
        let _ = writeln!(
            out,
            "{}: x={}, y={}, {}x{}",
            r.file_name(),
            r.bounds.x_min,
            r.bounds.y_min,
            r.width,
            r.height
        );
    }
    out
}

/// Write the manifest to `path`.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file cannot be written.
pub fn write_manifest(path: &Path, source: &Path, records: &[ElementRecord]) -> Result<()> {
    std::fs::write(path, format_manifest(source, records))?;
    Ok(())
}
