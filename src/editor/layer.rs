//! Ordered layer model.
//!
//! A [`LayerStack`] holds the overlay images placed above the base image.
//! Index 0 is drawn first (bottom); the last layer is topmost. The order only
//! changes through [`LayerStack::reorder`] and [`LayerStack::remove`].

use super::hit::Point;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

/// Opaque layer identifier, unique within the stack that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A placed overlay image.
///
/// `x`/`y` is the top-left corner of the *unrotated* box in canvas pixels.
/// `rotation` is in radians, clockwise on screen, about the box center.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub image: Arc<RgbaImage>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Source `width / height`, fixed when the layer is created.
    pub aspect_ratio: f64,
    pub rotation: f64,
}

impl Layer {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation.to_degrees()
    }

    fn apply(&mut self, patch: &LayerPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
    }
}

/// Partial update merged into a layer by [`LayerStack::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
}

impl LayerPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(radians: f64) -> Self {
        Self {
            rotation: Some(radians),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    issued: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh id. Ids are never reused, even after [`clear`](Self::clear).
    pub fn next_id(&mut self) -> LayerId {
        self.issued += 1;
        LayerId(format!("layer_{}", self.issued))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Append a layer on top of the stack.
    pub fn push(&mut self, layer: Layer) {
        debug_assert!(
            self.index_of(&layer.id).is_none(),
            "duplicate layer id {}",
            layer.id
        );
        self.layers.push(layer);
    }

    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| &l.id == id)
    }

    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| &l.id == id)
    }

    /// Layers in draw order, bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Layers top to bottom: hit-test order and the order a layer panel lists them.
    pub fn iter_top_down(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    /// Merge `patch` into the layer with `id`. Returns `false` if there is no such layer.
    pub fn update(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        Some(self.layers.remove(index))
    }

    /// Move `dragged` to the position `target` currently occupies.
    ///
    /// Splice semantics: the dragged layer is removed first, then inserted at
    /// the target's original index. Equal ids or an unknown id leave the
    /// stack untouched. Returns whether the order changed.
    pub fn reorder(&mut self, dragged: &LayerId, target: &LayerId) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.index_of(dragged), self.index_of(target)) else {
            return false;
        };
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        true
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
