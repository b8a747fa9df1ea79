//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute the encode plan, decode the source once, and
//! encode it until the output fits the size ceiling.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{fit_within, rotated_dimensions, shrink_step, target_longer_edge};
use super::params::{EncodeParams, Quality, Rotation};
use super::rust_backend::supported_input_extensions;
use crate::config::ResizeConfig;
use crate::naming;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Quality is lowered in these steps before dimensions are touched.
pub const QUALITY_STEP: u32 = 5;
pub const MIN_QUALITY: u32 = 10;

/// Settings for one resize/compress run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressConfig {
    /// Longer edge as a percentage of the original (10–100).
    pub percent: u32,
    pub quality: Quality,
    pub max_bytes: u64,
    pub rotation: Rotation,
}

impl CompressConfig {
    pub fn from_resize_config(config: &ResizeConfig, rotation: Rotation) -> Self {
        Self {
            percent: config.percent,
            quality: Quality::new(config.quality),
            max_bytes: config.max_bytes(),
            rotation,
        }
    }
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self::from_resize_config(&ResizeConfig::default(), Rotation::None)
    }
}

/// Encoded output plus the numbers shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOutcome {
    pub bytes: Vec<u8>,
    pub original_bytes: u64,
    pub original: (u32, u32),
    /// Output resolution, after rotation.
    pub processed: (u32, u32),
    /// Quality of the final encode (may be below the requested one).
    pub quality: Quality,
    /// Whether the output is within `max_bytes`.
    pub within_limit: bool,
}

/// Plan the first encode attempt without executing it.
pub fn plan_encode(original: (u32, u32), config: &CompressConfig) -> EncodeParams {
    let edge = target_longer_edge(original, config.percent);
    let (width, height) = fit_within(original, edge);
    EncodeParams {
        width,
        height,
        quality: config.quality,
        rotation: config.rotation,
    }
}

/// Resize, rotate and re-encode `data`, stepping quality and then size down
/// until the result fits `max_bytes`.
///
/// When even the smallest attempt is too large the last attempt is returned
/// with `within_limit == false`.
pub fn compress_image(
    backend: &impl ImageBackend,
    data: &[u8],
    config: &CompressConfig,
) -> Result<CompressOutcome> {
    let img = backend.decode(data)?;
    let original = (img.width(), img.height());
    let mut params = plan_encode(original, config);

    loop {
        let bytes = backend.encode(&img, &params)?;
        let size = bytes.len() as u64;
        debug!(
            width = params.width,
            height = params.height,
            quality = params.quality.value(),
            size,
            "encoded attempt"
        );

        let within_limit = size <= config.max_bytes;
        let next = if within_limit {
            None
        } else {
            next_attempt(&params)
        };

        match next {
            Some(next) => params = next,
            None => {
                if !within_limit {
                    warn!(size, limit = config.max_bytes, "could not reach size limit");
                }
                return Ok(CompressOutcome {
                    original_bytes: data.len() as u64,
                    original,
                    processed: rotated_dimensions((params.width, params.height), params.rotation),
                    quality: params.quality,
                    within_limit,
                    bytes,
                });
            }
        }
    }
}

fn next_attempt(params: &EncodeParams) -> Option<EncodeParams> {
    let quality = params.quality.value();
    if quality > MIN_QUALITY {
        return Some(EncodeParams {
            quality: Quality::new(quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY)),
            ..*params
        });
    }
    let (width, height) = shrink_step((params.width, params.height))?;
    Some(EncodeParams {
        width,
        height,
        ..*params
    })
}

/// What a file compression produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original_bytes: u64,
    pub processed_bytes: u64,
    pub original: (u32, u32),
    pub processed: (u32, u32),
    pub quality: Quality,
    pub within_limit: bool,
}

/// Compress one file into `output_dir` as `processed_<stem>.jpg`.
pub fn compress_file(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    config: &CompressConfig,
) -> Result<CompressReport> {
    let name = naming::processed_name(&file_name(source));
    compress_to(backend, source, output_dir, &name, config)
}

/// Compress many files in parallel. Results keep the input order.
///
/// Output names are assigned up front so inputs sharing a stem
/// (`photo.png`, `photo.jpg`) never write the same file.
pub fn compress_files(
    backend: &(impl ImageBackend + Sync),
    sources: &[PathBuf],
    output_dir: &Path,
    config: &CompressConfig,
) -> Vec<(PathBuf, Result<CompressReport>)> {
    let file_names: Vec<String> = sources.iter().map(|s| file_name(s)).collect();
    let names = naming::processed_names(&file_names);

    sources
        .par_iter()
        .zip(names.par_iter())
        .map(|(source, name)| {
            let result = compress_to(backend, source, output_dir, name, config);
            (source.clone(), result)
        })
        .collect()
}

fn file_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Inputs are accepted by extension, case-insensitively.
fn check_input_extension(source: &Path) -> Result<()> {
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if supported_input_extensions().contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(BackendError::UnsupportedFormat(source.display().to_string()))
    }
}

fn compress_to(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    name: &str,
    config: &CompressConfig,
) -> Result<CompressReport> {
    check_input_extension(source)?;
    let data = std::fs::read(source)?;
    let outcome = compress_image(backend, &data, config)?;

    let output = output_dir.join(name);
    std::fs::create_dir_all(output_dir)?;
    std::fs::write(&output, &outcome.bytes)?;
    debug!(source = %source.display(), output = %output.display(), "wrote processed image");

    Ok(CompressReport {
        source: source.to_path_buf(),
        output,
        original_bytes: outcome.original_bytes,
        processed_bytes: outcome.bytes.len() as u64,
        original: outcome.original,
        processed: outcome.processed,
        quality: outcome.quality,
        within_limit: outcome.within_limit,
    })
}
