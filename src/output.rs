//! CLI output formatting for every command.
//!
//! Results are listed as entities: a header line with a positional index and
//! a name, followed by indented detail lines.
//!
//! # Output Format
//!
//! ## Compose
//!
//! ```text
//! Canvas 800x400 (base: photo.jpg)
//! Layers (top to bottom)
//! 001 badge.png
//!     Position: 600.0, 40.0
//!     Size: 120.0x60.0
//!     Rotation: -15.0°
//! 002 logo.png
//!     Position: 20.0, 20.0
//!     Size: 160.0x80.0
//! Saved watermarked-image.png
//! ```
//!
//! ## Resize
//!
//! ```text
//! 001 photo.png → processed_photo.jpg
//!     Original: 2411.52 KB, 4000x3000
//!     Processed: 512.08 KB, 2000x1500
//!     Quality: 80
//! ```
//!
//! ## PDF scale / background removal
//!
//! ```text
//! report.pdf → compressed_report.pdf
//!     Pages: 12 scaled to 70%
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. `*_json`
//! functions build the machine-readable form used by `--json`.

use crate::background::RemoveReport;
use crate::editor::Editor;
use crate::imaging::{CompressReport, kilobytes};
use crate::pdf::{ScaleMode, ScaleReport};
use serde_json::{Value, json};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolution((w, h): (u32, u32)) -> String {
    format!("{w}x{h}")
}

fn size_kb(bytes: u64) -> String {
    format!("{:.2} KB", kilobytes(bytes))
}

// ============================================================================
// Compose
// ============================================================================

/// Canvas, layer stack (top first, the order the layer panel shows) and the
/// saved file.
pub fn format_compose_output(editor: &Editor, saved: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if let (Some(canvas), Some(base)) = (editor.canvas(), editor.base()) {
        lines.push(format!(
            "Canvas {}x{} (base: {})",
            canvas.width, canvas.height, base.name
        ));
    }

    if editor.layers().is_empty() {
        lines.push("No layers".to_string());
    } else {
        lines.push("Layers (top to bottom)".to_string());
        for (i, layer) in editor.layers().iter_top_down().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), layer.name));
            lines.push(format!("{}Position: {:.1}, {:.1}", indent(1), layer.x, layer.y));
            lines.push(format!(
                "{}Size: {:.1}x{:.1}",
                indent(1),
                layer.width,
                layer.height
            ));
            let degrees = layer.rotation_degrees();
            if degrees.abs() > f64::EPSILON {
                lines.push(format!("{}Rotation: {:.1}°", indent(1), degrees));
            }
        }
    }

    lines.push(format!("Saved {}", saved.display()));
    lines
}

pub fn print_compose_output(editor: &Editor, saved: &Path) {
    for line in format_compose_output(editor, saved) {
        println!("{}", line);
    }
}

// ============================================================================
// Resize
// ============================================================================

/// One compressed image: sizes in KB with two decimals and both resolutions.
pub fn format_compress_report(index: usize, report: &CompressReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} {} \u{2192} {}",
            format_index(index),
            file_name(&report.source),
            file_name(&report.output)
        ),
        format!(
            "{}Original: {}, {}",
            indent(1),
            size_kb(report.original_bytes),
            resolution(report.original)
        ),
        format!(
            "{}Processed: {}, {}",
            indent(1),
            size_kb(report.processed_bytes),
            resolution(report.processed)
        ),
        format!("{}Quality: {}", indent(1), report.quality.value()),
    ];
    if !report.within_limit {
        lines.push(format!("{}Warning: output is above the size limit", indent(1)));
    }
    lines
}

pub fn format_compress_error(index: usize, source: &Path, error: &dyn std::error::Error) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), file_name(source)),
        format!("{}Error: {}", indent(1), error),
    ]
}

pub fn compress_report_json(report: &CompressReport) -> Value {
    json!({
        "source": report.source.display().to_string(),
        "output": report.output.display().to_string(),
        "original_kb": kilobytes(report.original_bytes),
        "processed_kb": kilobytes(report.processed_bytes),
        "original_resolution": resolution(report.original),
        "processed_resolution": resolution(report.processed),
        "quality": report.quality.value(),
        "within_limit": report.within_limit,
    })
}

pub fn print_compress_report(index: usize, report: &CompressReport) {
    for line in format_compress_report(index, report) {
        println!("{}", line);
    }
}

pub fn print_compress_error(index: usize, source: &Path, error: &dyn std::error::Error) {
    for line in format_compress_error(index, source, error) {
        println!("{}", line);
    }
}

// ============================================================================
// PDF scale
// ============================================================================

pub fn format_pdf_report(report: &ScaleReport) -> Vec<String> {
    let percent = (report.factor * 100.0).round() as u32;
    let mut lines = vec![
        format!(
            "{} \u{2192} {}",
            file_name(&report.source),
            file_name(&report.output)
        ),
        format!("{}Pages: {} scaled to {}%", indent(1), report.pages, percent),
    ];
    if report.mode == ScaleMode::Page {
        lines.push(format!("{}Page size scaled", indent(1)));
    }
    lines
}

pub fn pdf_report_json(report: &ScaleReport) -> Value {
    let mode = match report.mode {
        ScaleMode::Content => "content",
        ScaleMode::Page => "page",
    };
    json!({
        "source": report.source.display().to_string(),
        "output": report.output.display().to_string(),
        "pages": report.pages,
        "factor": report.factor,
        "mode": mode,
    })
}

pub fn print_pdf_report(report: &ScaleReport) {
    for line in format_pdf_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Background removal
// ============================================================================

pub fn format_remove_output(report: &RemoveReport) -> Vec<String> {
    vec![
        format!(
            "{} \u{2192} {}",
            file_name(&report.source),
            file_name(&report.output)
        ),
        format!("{}Size: {}", indent(1), size_kb(report.bytes)),
    ]
}

pub fn print_remove_output(report: &RemoveReport) {
    for line in format_remove_output(report) {
        println!("{}", line);
    }
}

/// Print a JSON value on one line.
pub fn print_json(value: &Value) {
    println!("{}", value);
}
