//! # imgkit
//!
//! Small image utilities behind one binary: compose logo layers over a photo,
//! resize and compress images to a size ceiling, scale PDF pages, and strip
//! image backgrounds through an external segmentation program.
//!
//! # Architecture: Editor Core + File Tools
//!
//! The layer editor is a plain state machine. Input handlers (pointer, touch,
//! layer panel) mutate an [`editor::Editor`] and return [`editor::Action`]s
//! telling the host what to do next (re-render, change the cursor). Nothing in
//! the editor touches the filesystem or a window, so a GUI, a test, or the
//! [`scene`] loader can all drive it the same way.
//!
//! ```text
//! scene.toml  →  Scene::build  →  Editor  →  render  →  watermarked-image.png
//! photo.jpg   →  imaging::compress_file          →  processed_photo.jpg
//! report.pdf  →  pdf::scale_pdf_file             →  compressed_report.pdf
//! shoe.png    →  background::remove_background   →  transparent-image.png
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | Layer model, hit-testing, interaction controller, renderer, PNG export |
//! | [`scene`] | TOML scene files replayed through the editor |
//! | [`imaging`] | Resize/rotate/JPEG-compress with a size-limit search, behind `ImageBackend` |
//! | [`pdf`] | Wraps page content in a scale transform with `lopdf` |
//! | [`background`] | `BackgroundRemover` trait and the external-command implementation |
//! | [`config`] | `imgkit.toml` loading, merging onto stock defaults, validation |
//! | [`naming`] | Output file names shared by all commands |
//! | [`output`] | CLI output formatting: `format_*` functions plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Canvas Coordinates Everywhere
//!
//! Layers are stored in canvas pixels, not base-image pixels. The canvas is the
//! base image scaled to the container width, so export is a render of exactly
//! what the user sees minus the selection outline.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and JPEG/PNG encoding use the `image` crate, and PDF
//! editing uses `lopdf`. Background removal is the one job delegated to an
//! external program, configured in `[background]`.

pub mod background;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pdf;
pub mod scene;
