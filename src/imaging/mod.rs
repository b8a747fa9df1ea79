//! Image resize/compress, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory`, once per source |
//! | **Resize** | Lanczos3 via `image::DynamicImage::resize_exact` |
//! | **Rotate** | quarter turns via `image::DynamicImage::rotate*` |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{fit_within, kilobytes, rotated_dimensions, target_longer_edge};
pub use operations::{
    CompressConfig, CompressOutcome, CompressReport, compress_file, compress_files,
    compress_image, plan_encode,
};
pub use params::{EncodeParams, Quality, Rotation};
pub use rust_backend::{RustBackend, supported_input_extensions};
