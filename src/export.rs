//! Writing edited images back to disk.
//!
//! Export walks the catalogue in order and JPEG-encodes every handle that is
//! loaded, edited and not culled. Output names come from a pattern with a
//! `{n}` counter that starts at 0 and only advances for written files:
//!
//! ```text
//! catalogue:  a.jpg (edited)  b.jpg (culled)  c.png (untouched)  d.tif (edited)
//! output:     edited_0.jpg                                       edited_1.jpg
//! ```
//!
//! The counter restarts every run, so a second export overwrites the first.

use crate::catalogue::{Catalogue, ImageHandle};
use crate::config::Config;
use crate::imaging::{BackendError, ImageBackend, Quality};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export of {source_path} failed: {error}")]
    Encode {
        source_path: PathBuf,
        #[source]
        error: BackendError,
    },
}

/// Where and how to write exported images.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub directory: PathBuf,
    pub pattern: String,
    pub quality: Quality,
}

impl ExportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: config.export.directory.clone(),
            pattern: config.export.pattern.clone(),
            quality: config.quality(),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Files written by an export run, in catalogue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<ExportedImage>,
    /// Handles passed over (culled, untouched or empty).
    pub skipped: usize,
}

impl ExportReport {
    pub fn count(&self) -> usize {
        self.written.len()
    }
}

/// Expand the `{n}` counter in an output pattern.
///
/// ```
/// # use darkroom::export::output_name;
/// assert_eq!(output_name("edited_{n}.jpg", 3), "edited_3.jpg");
/// ```
pub fn output_name(pattern: &str, n: usize) -> String {
    pattern.replace("{n}", &n.to_string())
}

/// Write every exportable handle in `catalogue`.
pub fn export(
    backend: &impl ImageBackend,
    catalogue: &Catalogue,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError> {
    let mut report = ExportReport::default();
    let exportable = catalogue.iter().filter(|h| h.is_exportable()).count();
    report.skipped = catalogue.len() - exportable;
    if exportable == 0 {
        return Ok(report);
    }

    std::fs::create_dir_all(&options.directory)?;

    for handle in catalogue.iter().filter(|h| h.is_exportable()) {
        let output = options
            .directory
            .join(output_name(&options.pattern, report.written.len()));
        write_handle(backend, handle, &output, options.quality)?;
        report.written.push(ExportedImage {
            source: handle.path().to_path_buf(),
            output,
        });
    }

    Ok(report)
}

/// Write a single handle to `output` if it is exportable.
///
/// Returns `Ok(false)` when the handle was skipped.
pub fn export_single(
    backend: &impl ImageBackend,
    handle: &ImageHandle,
    output: &Path,
    quality: Quality,
) -> Result<bool, ExportError> {
    if !handle.is_exportable() {
        return Ok(false);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_handle(backend, handle, output, quality)?;
    Ok(true)
}

fn write_handle(
    backend: &impl ImageBackend,
    handle: &ImageHandle,
    output: &Path,
    quality: Quality,
) -> Result<(), ExportError> {
    let Some(pixels) = handle.pixels() else {
        return Ok(());
    };
    log::debug!("Writing {} -> {}", handle.path().display(), output.display());
    backend
        .encode_jpeg(pixels, output, quality)
        .map_err(|error| ExportError::Encode {
            source_path: handle.path().to_path_buf(),
            error,
        })
}
