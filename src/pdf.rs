//! PDF page scaling.
//!
//! Every page's content is wrapped between two new content streams:
//!
//! ```text
//! q s 0 0 s 0 0 cm      <- prefix: save state, scale by s
//! ...original content...
//! Q                     <- suffix: restore state
//! ```
//!
//! In [`ScaleMode::Content`] (the default) the page boxes are untouched, so
//! the drawing shrinks toward the bottom-left corner of a same-sized page.
//! [`ScaleMode::Page`] also scales `MediaBox` and `CropBox`, resolving boxes
//! a page inherits from its `Pages` ancestors.

use crate::naming;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const MIN_PERCENT: u32 = 10;
pub const MAX_PERCENT: u32 = 100;
pub const DEFAULT_PERCENT: u32 = 70;

/// Inherited attributes are looked up at most this many `Parent` links up.
const MAX_PARENT_DEPTH: usize = 32;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Malformed PDF: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Scale the drawing only; page size is kept.
    #[default]
    Content,
    /// Scale the drawing and the page boxes together.
    Page,
}

/// Scale factor for a percentage, clamped to 10–100.
pub fn scale_factor(percent: u32) -> f32 {
    percent.clamp(MIN_PERCENT, MAX_PERCENT) as f32 / 100.0
}

fn prefix_content(factor: f32) -> Vec<u8> {
    format!("q {factor} 0 0 {factor} 0 0 cm\n").into_bytes()
}

fn suffix_content() -> Vec<u8> {
    b"\nQ\n".to_vec()
}

/// The page's content stream references, flattening an indirect array.
///
/// Returns `None` for pages without `Contents`.
fn content_refs(doc: &Document, page: &Dictionary) -> Result<Option<Vec<Object>>> {
    let contents = match page.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(None),
    };
    match contents {
        Object::Array(items) => Ok(Some(items.clone())),
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => Ok(Some(items.clone())),
            Object::Stream(_) => Ok(Some(vec![Object::Reference(*id)])),
            _ => Err(PdfError::Malformed(format!("Contents {id:?} is not a stream"))),
        },
        _ => Err(PdfError::Malformed("Contents is not a stream".into())),
    }
}

/// Look up `key` on the page, then on its `Pages` ancestors.
fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Result<Option<Object>> {
    let mut dict = page;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(obj) = dict.get(key) {
            return Ok(Some(match obj {
                Object::Reference(id) => doc.get_object(*id)?.clone(),
                direct => direct.clone(),
            }));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => dict = doc.get_dictionary(*parent_id)?,
            _ => return Ok(None),
        }
    }
    Err(PdfError::Malformed("page tree is too deep".into()))
}

fn number(obj: &Object) -> Result<f32> {
    match obj {
        Object::Integer(i) => Ok(*i as f32),
        Object::Real(f) => Ok(*f),
        _ => Err(PdfError::Malformed("box value is not a number".into())),
    }
}

fn scale_box(rect: &Object, factor: f32) -> Result<Object> {
    let values = rect
        .as_array()
        .map_err(|_| PdfError::Malformed("page box is not an array".into()))?;
    if values.len() != 4 {
        return Err(PdfError::Malformed("page box needs 4 values".into()));
    }
    let scaled = values
        .iter()
        .map(|v| number(v).map(|n| Object::Real(n * factor)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Object::Array(scaled))
}

/// Wrap every page's content in a scale transform. Returns the number of
/// pages that were scaled.
pub fn scale_document(doc: &mut Document, factor: f32, mode: ScaleMode) -> Result<usize> {
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix_content(factor)));
    let suffix_id = doc.add_object(Stream::new(Dictionary::new(), suffix_content()));

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut scaled = 0;

    for page_id in page_ids {
        let page = doc.get_dictionary(page_id)?;
        let Some(existing) = content_refs(doc, page)? else {
            debug!(?page_id, "page has no contents, skipped");
            continue;
        };

        let boxes = match mode {
            ScaleMode::Content => Vec::new(),
            ScaleMode::Page => {
                let media = inherited(doc, page, b"MediaBox")?
                    .ok_or_else(|| PdfError::Malformed("MediaBox not found".into()))?;
                let mut boxes = vec![("MediaBox", scale_box(&media, factor)?)];
                if let Some(crop) = inherited(doc, page, b"CropBox")? {
                    boxes.push(("CropBox", scale_box(&crop, factor)?));
                }
                boxes
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(prefix_id));
        contents.extend(existing);
        contents.push(Object::Reference(suffix_id));

        let page = doc.get_dictionary_mut(page_id)?;
        page.set("Contents", Object::Array(contents));
        for (key, value) in boxes {
            page.set(key, value);
        }
        scaled += 1;
    }

    Ok(scaled)
}

/// Scale an in-memory PDF and serialize the result.
pub fn scale_pdf_bytes(data: &[u8], percent: u32, mode: ScaleMode) -> Result<(Vec<u8>, usize)> {
    let mut doc = Document::load_mem(data)?;
    let pages = scale_document(&mut doc, scale_factor(percent), mode)?;
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok((out, pages))
}

/// What a PDF scaling run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub pages: usize,
    pub factor: f32,
    pub mode: ScaleMode,
}

/// Scale `source` and write `compressed_<name>` into `output_dir`.
pub fn scale_pdf_file(
    source: &Path,
    output_dir: &Path,
    percent: u32,
    mode: ScaleMode,
) -> Result<ScaleReport> {
    let data = std::fs::read(source)?;
    let (bytes, pages) = scale_pdf_bytes(&data, percent, mode)?;

    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    std::fs::create_dir_all(output_dir)?;
    let output = output_dir.join(naming::compressed_name(&file_name));
    std::fs::write(&output, bytes)?;
    info!(source = %source.display(), output = %output.display(), pages, "scaled PDF");

    Ok(ScaleReport {
        source: source.to_path_buf(),
        output,
        pages,
        factor: scale_factor(percent),
        mode,
    })
}
