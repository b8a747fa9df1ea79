//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Rotate | `image::DynamicImage::rotate90/180/270` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeParams, Rotation};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

/// Input formats with decoders compiled in.
const INPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> Vec<&'static str> {
    INPUT_FORMATS
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// `None` when no rotation is needed.
fn rotate(img: &DynamicImage, rotation: Rotation) -> Option<DynamicImage> {
    match rotation {
        Rotation::None => None,
        Rotation::Quarter => Some(img.rotate90()),
        Rotation::Half => Some(img.rotate180()),
        Rotation::ThreeQuarters => Some(img.rotate270()),
    }
}

/// JPEG has no alpha channel: flatten onto RGB.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(data)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
    }

    fn encode(&self, img: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let resized = ((img.width(), img.height()) != (params.width, params.height))
            .then(|| img.resize_exact(params.width, params.height, FilterType::Lanczos3));
        let img = resized.as_ref().unwrap_or(img);
        let rotated = rotate(img, params.rotation);
        encode_jpeg(rotated.as_ref().unwrap_or(img), params.quality.value() as u8)
    }
}
