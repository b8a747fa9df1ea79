//! Interaction controller: translates pointer, touch and panel events into
//! layer mutations.
//!
//! The controller never draws. Every input handler returns the [`Action`]s the
//! host should perform (redraw, change cursor), so the whole state machine can
//! be driven and tested without a window.

use super::hit::{Point, topmost_hit};
use super::layer::{Layer, LayerId, LayerPatch, LayerStack};
use super::{EditorError, export, render};
use crate::config::{ConfigError, EditorConfig, parse_hex_color};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use tracing::debug;

/// Slider maximum used when there is no canvas to derive one from.
const FALLBACK_MAX_LAYER_SIZE: f64 = 500.0;
const MIN_ROTATION_DEGREES: f64 = -180.0;
const MAX_ROTATION_DEGREES: f64 = 180.0;

/// Requests for the host, returned from input handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RenderNeeded,
    SetCursor(Cursor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Grabbing,
}

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct BaseImage {
    pub name: String,
    pub image: Arc<RgbaImage>,
}

impl BaseImage {
    pub fn aspect_ratio(&self) -> f64 {
        self.image.width() as f64 / self.image.height().max(1) as f64
    }
}

/// Bounds of one row in the layer panel, used by touch reordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub id: LayerId,
    pub top: f64,
    pub bottom: f64,
}

/// Resolved editor settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorSettings {
    pub selection_color: Rgba<u8>,
    /// New layers are at most this fraction of the canvas width.
    pub max_logo_fraction: f64,
    pub min_layer_size: f64,
    /// Size slider maximum as a fraction of the canvas width.
    pub max_layer_fraction: f64,
}

impl EditorSettings {
    pub fn from_config(config: &EditorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            selection_color: parse_hex_color(&config.selection_color)?,
            max_logo_fraction: config.max_logo_fraction,
            min_layer_size: config.min_layer_size,
            max_layer_fraction: config.max_layer_fraction,
        })
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            selection_color: Rgba([0x0e, 0xa5, 0xe9, 0xff]),
            max_logo_fraction: 0.4,
            min_layer_size: 20.0,
            max_layer_fraction: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    /// Moving the selected layer; `offset` is the grab point relative to its top-left.
    Dragging { offset: Point },
}

#[derive(Debug, Clone, PartialEq)]
struct ListTouch {
    id: LayerId,
    index: usize,
}

/// Layer editor state: base image, canvas, ordered layers, selection and
/// in-flight gestures.
#[derive(Debug, Clone)]
pub struct Editor {
    base: Option<BaseImage>,
    canvas: Option<CanvasSize>,
    layers: LayerStack,
    selected: Option<LayerId>,
    gesture: Gesture,
    list_touch: Option<ListTouch>,
    settings: EditorSettings,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            base: None,
            canvas: None,
            layers: LayerStack::new(),
            selected: None,
            gesture: Gesture::Idle,
            list_touch: None,
            settings,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(EditorSettings::from_config(config)?))
    }

    // --- Accessors ---

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn base(&self) -> Option<&BaseImage> {
        self.base.as_ref()
    }

    pub fn canvas(&self) -> Option<CanvasSize> {
        self.canvas
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn selected(&self) -> Option<&LayerId> {
        self.selected.as_ref()
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.as_ref().and_then(|id| self.layers.get(id))
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    /// Rotation of the selected layer in degrees (0 without a selection).
    pub fn rotation_degrees(&self) -> f64 {
        self.selected_layer()
            .map(Layer::rotation_degrees)
            .unwrap_or(0.0)
    }

    /// Upper bound of the size control for the current canvas.
    pub fn max_layer_size(&self) -> f64 {
        match self.canvas {
            Some(c) => c.width as f64 * self.settings.max_layer_fraction,
            None => FALLBACK_MAX_LAYER_SIZE,
        }
    }

    // --- Base image and canvas ---

    /// Replace the base image. Clears all layers and the selection, then sizes
    /// the canvas to `container_width` at the base image's aspect ratio.
    pub fn load_base(
        &mut self,
        name: impl Into<String>,
        image: RgbaImage,
        container_width: u32,
    ) -> Vec<Action> {
        let base = BaseImage {
            name: name.into(),
            image: Arc::new(image),
        };
        debug!(
            name = %base.name,
            width = base.image.width(),
            height = base.image.height(),
            "loaded base image"
        );
        self.base = Some(base);
        self.layers.clear();
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.list_touch = None;
        self.resize_canvas(container_width)
    }

    /// Recompute the canvas size for a new container width. Layers keep their
    /// canvas coordinates.
    pub fn resize_canvas(&mut self, container_width: u32) -> Vec<Action> {
        let Some(base) = &self.base else {
            return Vec::new();
        };
        let width = container_width.max(1);
        let height = ((width as f64 / base.aspect_ratio()) as u32).max(1);
        self.canvas = Some(CanvasSize { width, height });
        vec![Action::RenderNeeded]
    }

    // --- Layer management ---

    /// Add an overlay image centered on the canvas, at most
    /// `max_logo_fraction` of the canvas width, and select it.
    ///
    /// Returns `None` when no base image is loaded.
    pub fn add_layer(&mut self, name: impl Into<String>, image: RgbaImage) -> Option<LayerId> {
        let canvas = self.canvas?;
        self.base.as_ref()?;

        let aspect_ratio = image.width() as f64 / image.height().max(1) as f64;
        let max_width = canvas.width as f64 * self.settings.max_logo_fraction;
        let width = (image.width() as f64).min(max_width);
        let height = width / aspect_ratio;

        let id = self.layers.next_id();
        let layer = Layer {
            id: id.clone(),
            name: name.into(),
            image: Arc::new(image),
            x: (canvas.width as f64 - width) / 2.0,
            y: (canvas.height as f64 - height) / 2.0,
            width,
            height,
            aspect_ratio,
            rotation: 0.0,
        };
        debug!(id = %id, name = %layer.name, width, height, "added layer");
        self.layers.push(layer);
        self.selected = Some(id.clone());
        Some(id)
    }

    pub fn select(&mut self, id: Option<LayerId>) -> Vec<Action> {
        let id = id.filter(|id| self.layers.get(id).is_some());
        if self.selected == id {
            return Vec::new();
        }
        self.selected = id;
        vec![Action::RenderNeeded]
    }

    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> Vec<Action> {
        if self.layers.update(id, patch) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn delete_layer(&mut self, id: &LayerId) -> Vec<Action> {
        if self.layers.remove(id).is_none() {
            return Vec::new();
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            self.gesture = Gesture::Idle;
        }
        if self.list_touch.as_ref().is_some_and(|t| &t.id == id) {
            self.list_touch = None;
        }
        vec![Action::RenderNeeded]
    }

    /// Resize the selected layer, keeping its aspect ratio.
    pub fn set_size(&mut self, width: f64) -> Vec<Action> {
        let Some(id) = self.selected.clone() else {
            return Vec::new();
        };
        let Some(aspect) = self.layers.get(&id).map(|l| l.aspect_ratio) else {
            return Vec::new();
        };
        let min = self.settings.min_layer_size;
        let max = self.max_layer_size().max(min);
        let width = width.max(min).min(max);
        self.update_layer(&id, &LayerPatch::size(width, width / aspect))
    }

    /// Rotate the selected layer to an absolute angle in degrees.
    pub fn set_rotation_degrees(&mut self, degrees: f64) -> Vec<Action> {
        let Some(id) = self.selected.clone() else {
            return Vec::new();
        };
        let degrees = degrees.clamp(MIN_ROTATION_DEGREES, MAX_ROTATION_DEGREES);
        self.update_layer(&id, &LayerPatch::rotation(degrees.to_radians()))
    }

    // --- Canvas pointer interaction ---

    pub fn pointer_down(&mut self, pos: Point) -> Vec<Action> {
        let mut actions = self.begin_drag(pos);
        if self.is_dragging() {
            actions.push(Action::SetCursor(Cursor::Grabbing));
        }
        actions
    }

    pub fn pointer_move(&mut self, pos: Point) -> Vec<Action> {
        self.drag_to(pos)
    }

    pub fn pointer_up(&mut self) -> Vec<Action> {
        self.gesture = Gesture::Idle;
        vec![Action::SetCursor(Cursor::Default)]
    }

    /// Leaving the canvas ends a drag exactly like releasing the button.
    pub fn pointer_leave(&mut self) -> Vec<Action> {
        self.pointer_up()
    }

    /// Touch on the canvas. Multi-touch gestures are ignored.
    pub fn touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        match touches {
            [pos] => self.begin_drag(*pos),
            _ => Vec::new(),
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        match touches.first() {
            Some(pos) => self.drag_to(*pos),
            None => Vec::new(),
        }
    }

    pub fn touch_end(&mut self) -> Vec<Action> {
        self.gesture = Gesture::Idle;
        Vec::new()
    }

    fn begin_drag(&mut self, pos: Point) -> Vec<Action> {
        let hit = topmost_hit(&self.layers, pos).map(|l| (l.id.clone(), l.x, l.y));
        match hit {
            Some((id, x, y)) => {
                self.gesture = Gesture::Dragging {
                    offset: Point::new(pos.x - x, pos.y - y),
                };
                self.select(Some(id));
                vec![Action::RenderNeeded]
            }
            None => {
                self.gesture = Gesture::Idle;
                self.select(None)
            }
        }
    }

    fn drag_to(&mut self, pos: Point) -> Vec<Action> {
        let Gesture::Dragging { offset } = self.gesture else {
            return Vec::new();
        };
        let Some(id) = self.selected.clone() else {
            return Vec::new();
        };
        self.update_layer(&id, &LayerPatch::position(pos.x - offset.x, pos.y - offset.y))
    }

    // --- Layer panel reordering ---

    /// Drag-and-drop in the layer panel: move `dragged` to `target`'s slot.
    pub fn list_drop(&mut self, dragged: &LayerId, target: &LayerId) -> Vec<Action> {
        if self.layers.reorder(dragged, target) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn list_touch_start(&mut self, id: &LayerId) -> Vec<Action> {
        self.list_touch = self.layers.index_of(id).map(|index| ListTouch {
            id: id.clone(),
            index,
        });
        Vec::new()
    }

    /// Touch moved over the layer panel. The first row whose vertical bounds
    /// strictly contain `y` becomes the drop target.
    pub fn list_touch_move(&mut self, y: f64, rows: &[ListRow]) -> Vec<Action> {
        let Some(dragged) = self.list_touch.as_ref().map(|t| t.id.clone()) else {
            return Vec::new();
        };
        let Some(target) = rows.iter().find(|row| y > row.top && y < row.bottom) else {
            return Vec::new();
        };
        let actions = self.list_drop(&dragged, &target.id);
        if let (Some(touch), Some(index)) = (self.list_touch.as_mut(), self.layers.index_of(&dragged))
        {
            touch.index = index;
        }
        actions
    }

    pub fn list_touch_end(&mut self) -> Vec<Action> {
        self.list_touch = None;
        Vec::new()
    }

    /// Stack index of the layer being touch-dragged in the panel.
    pub fn list_touch_index(&self) -> Option<usize> {
        self.list_touch.as_ref().map(|t| t.index)
    }

    // --- Output ---

    /// Draw the current state, selection highlight included.
    pub fn render(&self) -> Option<RgbaImage> {
        render::render(self, render::RenderOptions::default())
    }

    /// PNG bytes of the composition without the selection highlight.
    pub fn export_png(&self) -> Result<Vec<u8>, EditorError> {
        export::export_png(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_base(w: u32, h: u32, container: u32) -> Editor {
        let mut editor = Editor::default();
        editor.load_base("base.jpg", RgbaImage::new(w, h), container);
        editor
    }

    fn logo(w: u32, h: u32) -> RgbaImage {
        RgbaImage::new(w, h)
    }

    #[test]
    fn load_base_sizes_canvas_from_container() {
        let editor = editor_with_base(1600, 900, 800);
        assert_eq!(
            editor.canvas(),
            Some(CanvasSize {
                width: 800,
                height: 450
            })
        );
    }

    #[test]
    fn load_base_resets_layers_and_selection() {
        let mut editor = editor_with_base(400, 400, 400);
        editor.add_layer("a.png", logo(10, 10));
        assert!(editor.selected().is_some());

        editor.load_base("other.jpg", RgbaImage::new(200, 100), 400);
        assert!(editor.layers().is_empty());
        assert!(editor.selected().is_none());
        assert_eq!(editor.canvas().unwrap().height, 200);
    }

    #[test]
    fn add_layer_without_base_is_rejected() {
        let mut editor = Editor::default();
        assert!(editor.add_layer("logo.png", logo(10, 10)).is_none());
        assert!(editor.layers().is_empty());
    }

    #[test]
    fn add_layer_caps_width_and_centers() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let id = editor.add_layer("wide.png", logo(800, 200)).unwrap();
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!(layer.width, 400.0);
        assert_eq!(layer.height, 100.0);
        assert_eq!(layer.x, 300.0);
        assert_eq!(layer.y, 200.0);
        assert_eq!(layer.aspect_ratio, 4.0);
        assert_eq!(editor.selected(), Some(&id));
    }

    #[test]
    fn add_layer_keeps_small_images_at_natural_size() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        let id = editor.add_layer("tiny.png", logo(50, 25)).unwrap();
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!((layer.width, layer.height), (50.0, 25.0));
    }

    #[test]
    fn pointer_drag_moves_selected_layer() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        let id = editor.add_layer("logo.png", logo(100, 100)).unwrap();
        editor.select(None);

        // Layer occupies 450..550 on both axes.
        let actions = editor.pointer_down(Point::new(460.0, 470.0));
        assert!(actions.contains(&Action::SetCursor(Cursor::Grabbing)));
        assert_eq!(editor.selected(), Some(&id));
        assert!(editor.is_dragging());

        editor.pointer_move(Point::new(110.0, 120.0));
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!((layer.x, layer.y), (100.0, 100.0));

        let actions = editor.pointer_up();
        assert_eq!(actions, vec![Action::SetCursor(Cursor::Default)]);
        assert!(!editor.is_dragging());

        editor.pointer_move(Point::new(0.0, 0.0));
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!((layer.x, layer.y), (100.0, 100.0));
    }

    #[test]
    fn pointer_down_on_empty_canvas_clears_selection() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        editor.add_layer("logo.png", logo(100, 100));
        editor.pointer_down(Point::new(5.0, 5.0));
        assert!(editor.selected().is_none());
        assert!(!editor.is_dragging());
    }

    #[test]
    fn pointer_down_picks_topmost_layer() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        let _bottom = editor.add_layer("bottom.png", logo(100, 100)).unwrap();
        let top = editor.add_layer("top.png", logo(100, 100)).unwrap();
        editor.pointer_down(Point::new(500.0, 500.0));
        assert_eq!(editor.selected(), Some(&top));
    }

    #[test]
    fn pointer_leave_ends_drag() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        editor.add_layer("logo.png", logo(100, 100));
        editor.pointer_down(Point::new(500.0, 500.0));
        editor.pointer_leave();
        assert!(!editor.is_dragging());
    }

    #[test]
    fn touch_start_ignores_multi_touch() {
        let mut editor = editor_with_base(1000, 1000, 1000);
        let id = editor.add_layer("logo.png", logo(100, 100)).unwrap();
        editor.select(None);

        let two = [Point::new(500.0, 500.0), Point::new(510.0, 510.0)];
        assert!(editor.touch_start(&two).is_empty());
        assert!(editor.selected().is_none());

        editor.touch_start(&[Point::new(500.0, 500.0)]);
        assert_eq!(editor.selected(), Some(&id));
        editor.touch_move(&[Point::new(600.0, 600.0)]);
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!((layer.x, layer.y), (550.0, 550.0));
        editor.touch_end();
        assert!(!editor.is_dragging());
    }

    #[test]
    fn set_size_preserves_aspect_and_clamps() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let id = editor.add_layer("logo.png", logo(200, 100)).unwrap();

        editor.set_size(300.0);
        let layer = editor.layers().get(&id).unwrap();
        assert_eq!((layer.width, layer.height), (300.0, 150.0));

        editor.set_size(5.0);
        assert_eq!(editor.layers().get(&id).unwrap().width, 20.0);

        editor.set_size(5000.0);
        assert_eq!(editor.layers().get(&id).unwrap().width, 800.0);
    }

    #[test]
    fn set_size_without_selection_is_noop() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let id = editor.add_layer("logo.png", logo(200, 100)).unwrap();
        editor.select(None);
        assert!(editor.set_size(300.0).is_empty());
        assert_eq!(editor.layers().get(&id).unwrap().width, 200.0);
    }

    #[test]
    fn rotation_round_trips_through_degrees() {
        let mut editor = editor_with_base(1000, 500, 1000);
        editor.add_layer("logo.png", logo(200, 100));
        editor.set_rotation_degrees(45.0);
        assert!((editor.rotation_degrees() - 45.0).abs() < 1e-9);
        editor.set_rotation_degrees(720.0);
        assert!((editor.rotation_degrees() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn delete_selected_clears_selection() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let a = editor.add_layer("a.png", logo(10, 10)).unwrap();
        let b = editor.add_layer("b.png", logo(10, 10)).unwrap();

        editor.delete_layer(&a);
        assert_eq!(editor.selected(), Some(&b));
        editor.delete_layer(&b);
        assert!(editor.selected().is_none());
        assert!(editor.layers().is_empty());
        assert!(editor.delete_layer(&b).is_empty());
    }

    #[test]
    fn list_drop_reorders() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let a = editor.add_layer("a.png", logo(10, 10)).unwrap();
        let _b = editor.add_layer("b.png", logo(10, 10)).unwrap();
        let c = editor.add_layer("c.png", logo(10, 10)).unwrap();

        assert_eq!(editor.list_drop(&a, &c), vec![Action::RenderNeeded]);
        let order: Vec<&str> = editor.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(order, ["b.png", "c.png", "a.png"]);
        assert!(editor.list_drop(&a, &a).is_empty());
    }

    #[test]
    fn list_touch_reorders_against_row_under_finger() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let a = editor.add_layer("a.png", logo(10, 10)).unwrap();
        let b = editor.add_layer("b.png", logo(10, 10)).unwrap();
        let c = editor.add_layer("c.png", logo(10, 10)).unwrap();

        // Panel lists top-down: c, b, a.
        let rows = vec![
            ListRow { id: c.clone(), top: 0.0, bottom: 40.0 },
            ListRow { id: b.clone(), top: 48.0, bottom: 88.0 },
            ListRow { id: a.clone(), top: 96.0, bottom: 136.0 },
        ];

        // A move without a touch drag in progress does nothing.
        assert!(editor.list_touch_move(20.0, &rows).is_empty());

        editor.list_touch_start(&a);
        assert_eq!(editor.list_touch_index(), Some(0));
        // In the gap between rows: no target.
        assert!(editor.list_touch_move(44.0, &rows).is_empty());

        editor.list_touch_move(20.0, &rows);
        let order: Vec<&str> = editor.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(order, ["b.png", "c.png", "a.png"]);
        assert_eq!(editor.list_touch_index(), Some(2));

        editor.list_touch_end();
        assert!(editor.list_touch_move(60.0, &rows).is_empty());
    }

    #[test]
    fn resize_canvas_keeps_layer_coordinates() {
        let mut editor = editor_with_base(1000, 500, 1000);
        let id = editor.add_layer("logo.png", logo(100, 100)).unwrap();
        let before = editor.layers().get(&id).unwrap().x;
        editor.resize_canvas(500);
        assert_eq!(editor.canvas().unwrap().height, 250);
        assert_eq!(editor.layers().get(&id).unwrap().x, before);
    }

    #[test]
    fn settings_from_config_parse_selection_color() {
        let settings = EditorSettings::from_config(&EditorConfig::default()).unwrap();
        assert_eq!(settings, EditorSettings::default());
    }
}
