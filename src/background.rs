//! Background removal.
//!
//! Segmentation itself is done by an external program: the input image is
//! written to its stdin and a PNG with transparency is read from its stdout.
//! Anything that speaks that protocol works (`rembg i - -` for instance).
//!
//! [`remove_background`] wraps any [`BackgroundRemover`] with the checks every
//! run needs: input must be PNG or JPEG and the result must decode as PNG.

use crate::config::BackgroundConfig;
use crate::naming;
use image::ImageFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RemoveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported input format, expected PNG or JPEG")]
    UnsupportedFormat,
    #[error("Background removal is not configured (set [background] command)")]
    NotConfigured,
    #[error("Failed to process the image: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, RemoveError>;

/// Produces a PNG with the background made transparent.
pub trait BackgroundRemover: Sync {
    fn remove(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Runs an external program with the image piped through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRemover {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandRemover {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &BackgroundConfig) -> Result<Self> {
        let program = config.command.clone().ok_or(RemoveError::NotConfigured)?;
        Ok(Self::new(program, config.args.clone()))
    }
}

impl BackgroundRemover for CommandRemover {
    fn remove(&self, data: &[u8]) -> Result<Vec<u8>> {
        debug!(program = %self.program, args = ?self.args, "spawning background remover");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoveError::Failed(format!("failed to execute {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RemoveError::Failed("stdin not captured".into()))?;

        // stdin is fed from a second thread so a program that streams output
        // before reading all input cannot deadlock on a full pipe.
        let (written, output) = std::thread::scope(|s| {
            let writer = s.spawn(move || stdin.write_all(data));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RemoveError::Failed(format!(
                "{} exited with code {}: {}",
                self.program,
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                stderr.trim()
            )));
        }
        // A program that exits 0 without draining stdin leaves a broken pipe.
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(RemoveError::Failed(format!(
                    "{} did not read the input: {e}",
                    self.program
                )));
            }
            Err(_) => return Err(RemoveError::Failed("stdin writer panicked".into())),
        }

        Ok(output.stdout)
    }
}

/// Check the input format, run the remover, and validate its PNG output.
pub fn remove_background(remover: &impl BackgroundRemover, data: &[u8]) -> Result<Vec<u8>> {
    match image::guess_format(data) {
        Ok(ImageFormat::Png | ImageFormat::Jpeg) => {}
        _ => return Err(RemoveError::UnsupportedFormat),
    }

    let png = remover.remove(data)?;
    if !matches!(image::guess_format(&png), Ok(ImageFormat::Png)) {
        return Err(RemoveError::Failed("result is not a PNG".into()));
    }
    image::load_from_memory_with_format(&png, ImageFormat::Png)
        .map_err(|e| RemoveError::Failed(format!("result does not decode: {e}")))?;
    Ok(png)
}

/// What a background removal run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub bytes: u64,
}

/// Remove the background of `source` and write `transparent-image.png` into
/// `output_dir`.
pub fn remove_background_file(
    remover: &impl BackgroundRemover,
    source: &Path,
    output_dir: &Path,
) -> Result<RemoveReport> {
    let data = std::fs::read(source)?;
    let png = remove_background(remover, &data)?;

    std::fs::create_dir_all(output_dir)?;
    let output = output_dir.join(naming::TRANSPARENT_FILE_NAME);
    std::fs::write(&output, &png)?;
    info!(source = %source.display(), output = %output.display(), "removed background");

    Ok(RemoveReport {
        source: source.to_path_buf(),
        output,
        bytes: png.len() as u64,
    })
}
