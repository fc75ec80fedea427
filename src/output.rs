//! Terminal output for loading, editing and export.
//!
//! Every message is built by a pure `format_*` function returning strings,
//! with thin `print_*` wrappers for the CLI. The session writes the same
//! strings through its own writer, so tests can assert on exact text without
//! capturing stdout.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Loaded 3 files from shoots/dawn
//!     1 could not be decoded
//! Skipped shoots/missing (not a directory)
//! ```
//!
//! ## Editing
//!
//! ```text
//! [1/3] Editing shoots/dawn/001.jpg
//! [b]rightness [h]sl [m]ask [c]ull [s]ave preset [l]oad preset [n]ext [q]uit ...:
//! ```
//!
//! ## Export
//!
//! ```text
//! shoots/dawn/001.jpg → out/edited_0.jpg
//! Processed 1 images
//! ```

use crate::catalogue::{ImageHandle, LoadReport};
use crate::export::ExportReport;
use crate::imaging::OperationError;
use crate::preset::{Preset, PresetError};
use crate::session::SessionSummary;
use std::path::Path;

/// Prompt shown before every command.
pub const COMMAND_MENU: &str = "[b]rightness [h]sl [m]ask [c]ull [s]ave preset [l]oad preset \
[n]ext [q]uit [d]enoise [i]nfo [g] text [r]emove: ";

pub fn format_usage(program: &str) -> String {
    format!("Usage: {program} <catalogue folders...>")
}

pub fn format_load_report(report: &LoadReport) -> Vec<String> {
    let mut lines = Vec::new();
    for folder in &report.folders {
        lines.push(format!(
            "Loaded {} files from {}",
            folder.files,
            folder.folder.display()
        ));
        if folder.failed > 0 {
            lines.push(format!("    {} could not be decoded", folder.failed));
        }
    }
    for skipped in &report.skipped {
        lines.push(format!("Skipped {} (not a directory)", skipped.display()));
    }
    lines
}

pub fn format_editing_header(index: usize, total: usize, handle: &ImageHandle) -> String {
    let mut line = format!(
        "[{}/{}] Editing {}",
        index + 1,
        total,
        handle.path().display()
    );
    if !handle.is_loaded() {
        line.push_str(" (not loaded)");
    }
    line
}

pub fn format_input_error(message: &str) -> String {
    format!("Invalid input: {message}")
}

pub fn format_not_loaded(handle: &ImageHandle) -> String {
    format!("Skipped: {} is not loaded", handle.path().display())
}

pub fn format_operation_error(label: &str, error: &OperationError) -> String {
    format!("{label} failed: {error}")
}

pub fn format_metadata_written(sidecar: &Path) -> String {
    format!("Wrote {}", sidecar.display())
}

pub fn format_preset_saved(preset: &Preset, path: &Path) -> String {
    format!("Saved preset {preset} to {}", path.display())
}

pub fn format_preset_applied(preset: &Preset) -> String {
    format!("Applied preset {preset}")
}

pub fn format_preset_error(error: &PresetError) -> String {
    format!("Keeping previous preset: {error}")
}

pub fn format_session_summary(summary: &SessionSummary, total: usize) -> String {
    let mut line = format!(
        "Reviewed {} of {} images, {} culled",
        summary.visited, total, summary.culled
    );
    if summary.quit {
        line.push_str(" (quit)");
    }
    line
}

pub fn format_export_report(report: &ExportReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .written
        .iter()
        .map(|w| format!("{} → {}", w.source.display(), w.output.display()))
        .collect();
    lines.push(format!("Processed {} images", report.count()));
    lines
}

pub fn print_load_report(report: &LoadReport) {
    for line in format_load_report(report) {
        println!("{line}");
    }
}

pub fn print_export_report(report: &ExportReport) {
    for line in format_export_report(report) {
        println!("{line}");
    }
}
