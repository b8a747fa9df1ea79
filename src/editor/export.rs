//! PNG export of the composition.
//!
//! Export renders with the selection highlight suppressed. The selection
//! itself is untouched, so the editor looks the same before and after.

use super::EditorError;
use super::controller::Editor;
use super::render::{RenderOptions, render};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// Download name used when the caller does not choose one.
pub const DEFAULT_FILE_NAME: &str = "watermarked-image.png";

/// Render without the selection outline and encode as PNG.
pub fn export_png(editor: &Editor) -> Result<Vec<u8>, EditorError> {
    let surface = render(editor, RenderOptions::export()).ok_or(EditorError::NoBaseImage)?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(surface).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Export to `path`, creating parent directories as needed.
pub fn save_png(editor: &Editor, path: &Path) -> Result<(), EditorError> {
    let bytes = export_png(editor)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "exported composition");
    Ok(())
}
