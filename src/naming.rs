//! Output file naming.
//!
//! Every tool derives its output name from the input the same way:
//! - resize: `photo.png` → `processed_photo.jpg` (output is always JPEG);
//!   in a batch, later inputs that collide get `processed_photo_2.jpg`, ...
//! - pdf-scale: `report.pdf` → `compressed_report.pdf`
//! - remove-bg: always `transparent-image.png`
//! - compose: always `watermarked-image.png`

pub use crate::editor::export::DEFAULT_FILE_NAME as COMPOSE_FILE_NAME;

use std::collections::HashSet;

pub const PROCESSED_PREFIX: &str = "processed_";
pub const COMPRESSED_PREFIX: &str = "compressed_";
pub const TRANSPARENT_FILE_NAME: &str = "transparent-image.png";

/// Fallback when the input has no usable file name.
const PROCESSED_FALLBACK: &str = "processed_image.jpg";

/// Name for a resized/compressed image. The extension becomes `.jpg`.
pub fn processed_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    };
    if stem.is_empty() {
        return PROCESSED_FALLBACK.to_string();
    }
    format!("{PROCESSED_PREFIX}{stem}.jpg")
}

/// [`processed_name`] for a batch, with every output name distinct.
///
/// The first input keeps the plain name; each later collision gets the
/// lowest free `_<n>` suffix (n ≥ 2) on its stem.
pub fn processed_names<S: AsRef<str>>(file_names: &[S]) -> Vec<String> {
    let plain: Vec<String> = file_names
        .iter()
        .map(|n| processed_name(n.as_ref()))
        .collect();
    let mut taken = HashSet::new();
    plain
        .iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name.clone();
            }
            let stem = name.strip_suffix(".jpg").unwrap_or(name.as_str());
            let unique = (2..)
                .map(|n| format!("{stem}_{n}.jpg"))
                .find(|candidate| !taken.contains(candidate) && !plain.contains(candidate))
                .unwrap_or_else(|| name.clone());
            taken.insert(unique.clone());
            unique
        })
        .collect()
}

/// Name for a scaled PDF: the original name with a prefix.
pub fn compressed_name(file_name: &str) -> String {
    format!("{COMPRESSED_PREFIX}{file_name}")
}
