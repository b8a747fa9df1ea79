//! Logo/watermark layer editor.
//!
//! | Part | Role |
//! |---|---|
//! | [`layer`] | Ordered [`LayerStack`] of placed overlay images |
//! | [`hit`] | Point-in-rotated-rectangle tests |
//! | [`controller`] | [`Editor`]: pointer, touch and panel events → layer mutations |
//! | [`render`] | Deterministic rasterization of base + layers |
//! | [`export`] | PNG encoding with the selection highlight hidden |
//!
//! The editor is a retained list drawn in immediate mode: every change is
//! followed by a full redraw, there is no dirty-region tracking.

pub mod controller;
pub mod export;
pub mod hit;
pub mod layer;
pub mod render;

pub use controller::{Action, CanvasSize, Cursor, Editor, EditorSettings, ListRow};
pub use hit::{Point, point_in_layer, topmost_hit};
pub use layer::{Layer, LayerId, LayerPatch, LayerStack};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("no base image loaded")]
    NoBaseImage,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
