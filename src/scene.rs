//! Scene files: a composition described in TOML.
//!
//! A scene names the base image and the overlay layers, bottom to top:
//!
//! ```toml
//! base = "photo.jpg"
//! canvas_width = 800           # optional, defaults to the base width
//!
//! [[layer]]
//! path = "logo.png"
//! name = "Logo"                # optional, defaults to the file name
//! x = 20.0                     # optional, x/y default to centered
//! y = 20.0
//! width = 120.0                # optional, clamped like the size control
//! rotation = -15.0             # optional, degrees
//! ```
//!
//! Loading replays the editor operations a user would perform, so a scene
//! obeys the same sizing and rotation limits as interactive editing.
//! Relative paths resolve against the scene file's directory.

use crate::editor::{Editor, EditorSettings, LayerPatch};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scene parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to load {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Invalid scene: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub base: PathBuf,
    #[serde(default)]
    pub canvas_width: Option<u32>,
    #[serde(rename = "layer", default)]
    pub layers: Vec<SceneLayer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneLayer {
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    /// Degrees.
    #[serde(default)]
    pub rotation: Option<f64>,
}

impl Scene {
    pub fn parse(content: &str) -> Result<Self, SceneError> {
        let scene: Scene = toml::from_str(content)?;
        if scene.canvas_width == Some(0) {
            return Err(SceneError::Invalid("canvas_width must be positive".into()));
        }
        Ok(scene)
    }

    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Build an editor holding this scene. Nothing is selected afterwards.
    pub fn build(&self, base_dir: &Path, settings: &EditorSettings) -> Result<Editor, SceneError> {
        let mut editor = Editor::new(*settings);

        let base_path = base_dir.join(&self.base);
        let base = load_rgba(&base_path)?;
        let canvas_width = self.canvas_width.unwrap_or(base.width());
        editor.load_base(display_name(&base_path), base, canvas_width);

        for entry in &self.layers {
            let path = base_dir.join(&entry.path);
            let image = load_rgba(&path)?;
            let name = entry.name.clone().unwrap_or_else(|| display_name(&path));
            let id = editor
                .add_layer(name, image)
                .ok_or_else(|| SceneError::Invalid("no base image loaded".into()))?;

            if let Some(width) = entry.width {
                editor.set_size(width);
            }
            if let Some(degrees) = entry.rotation {
                editor.set_rotation_degrees(degrees);
            }
            if let Some(position) = position(&editor, entry) {
                editor.update_layer(&id, &position);
            }
            debug!(id = %id, path = %path.display(), "placed scene layer");
        }

        editor.select(None);
        Ok(editor)
    }

    /// Load a scene file and build it, resolving paths against its directory.
    pub fn load(path: &Path, settings: &EditorSettings) -> Result<Editor, SceneError> {
        let scene = Self::from_file(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        scene.build(base_dir, settings)
    }
}

/// Target position for the just-added (selected) layer. Missing coordinates
/// center the layer at its final size.
fn position(editor: &Editor, entry: &SceneLayer) -> Option<LayerPatch> {
    if entry.x.is_none() && entry.y.is_none() && entry.width.is_none() {
        return None;
    }
    let layer = editor.selected_layer()?;
    let canvas = editor.canvas()?;
    Some(LayerPatch::position(
        entry.x.unwrap_or((canvas.width as f64 - layer.width) / 2.0),
        entry.y.unwrap_or((canvas.height as f64 - layer.height) / 2.0),
    ))
}

fn load_rgba(path: &Path) -> Result<image::RgbaImage, SceneError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| SceneError::Image {
            path: path.to_path_buf(),
            source,
        })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        RgbaImage::from_pixel(w, h, Rgba([200, 0, 0, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn parses_minimal_scene() {
        let scene = Scene::parse("base = \"photo.png\"\n").unwrap();
        assert_eq!(scene.base, PathBuf::from("photo.png"));
        assert!(scene.layers.is_empty());
        assert_eq!(scene.canvas_width, None);
    }

    #[test]
    fn parses_layer_tables() {
        let scene = Scene::parse(
            r#"
base = "photo.png"
canvas_width = 400

[[layer]]
path = "logo.png"
x = 10.0
rotation = 45.0

[[layer]]
path = "badge.png"
name = "Badge"
"#,
        )
        .unwrap();
        assert_eq!(scene.layers.len(), 2);
        assert_eq!(scene.layers[0].x, Some(10.0));
        assert_eq!(scene.layers[0].rotation, Some(45.0));
        assert_eq!(scene.layers[1].name.as_deref(), Some("Badge"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            Scene::parse("base = \"a.png\"\nopacity = 0.5\n"),
            Err(SceneError::Toml(_))
        ));
    }

    #[test]
    fn rejects_zero_canvas_width() {
        assert!(matches!(
            Scene::parse("base = \"a.png\"\ncanvas_width = 0\n"),
            Err(SceneError::Invalid(_))
        ));
    }

    #[test]
    fn build_defaults_canvas_to_base_width() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "photo.png", 200, 100);
        let scene = Scene::parse("base = \"photo.png\"\n").unwrap();

        let editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

        let canvas = editor.canvas().unwrap();
        assert_eq!((canvas.width, canvas.height), (200, 100));
        assert_eq!(editor.base().unwrap().name, "photo.png");
    }

    #[test]
    fn build_replays_layer_operations() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "photo.png", 400, 200);
        write_png(tmp.path(), "logo.png", 100, 50);
        let scene = Scene::parse(
            r#"
base = "photo.png"

[[layer]]
path = "logo.png"
x = 10.0
y = 20.0
width = 60.0
rotation = 90.0
"#,
        )
        .unwrap();

        let editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

        assert_eq!(editor.layers().len(), 1);
        let layer = editor.layers().iter().next().unwrap();
        assert_eq!(layer.name, "logo.png");
        assert_eq!((layer.x, layer.y), (10.0, 20.0));
        assert_eq!((layer.width, layer.height), (60.0, 30.0));
        assert!((layer.rotation_degrees() - 90.0).abs() < 1e-9);
        assert!(editor.selected().is_none());
    }

    #[test]
    fn build_clamps_like_the_size_control() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "photo.png", 100, 100);
        write_png(tmp.path(), "logo.png", 40, 40);
        let scene = Scene::parse(
            "base = \"photo.png\"\n[[layer]]\npath = \"logo.png\"\nwidth = 5000.0\nrotation = 720.0\n",
        )
        .unwrap();

        let editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

        let layer = editor.layers().iter().next().unwrap();
        // 80% of the 100px canvas.
        assert_eq!(layer.width, 80.0);
        assert!((layer.rotation_degrees() - 180.0).abs() < 1e-9);
        // Re-centered at the new size.
        assert_eq!((layer.x, layer.y), (10.0, 10.0));
    }

    #[test]
    fn build_keeps_stack_order() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "photo.png", 100, 100);
        write_png(tmp.path(), "a.png", 10, 10);
        write_png(tmp.path(), "b.png", 10, 10);
        let scene = Scene::parse(
            "base = \"photo.png\"\n[[layer]]\npath = \"a.png\"\n[[layer]]\npath = \"b.png\"\n",
        )
        .unwrap();

        let editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

        let names: Vec<_> = editor.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn missing_image_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let scene = Scene::parse("base = \"gone.png\"\n").unwrap();
        let err = scene.build(tmp.path(), &EditorSettings::default()).unwrap_err();
        assert!(matches!(err, SceneError::Image { .. }));
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn load_resolves_relative_to_scene_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("scenes");
        std::fs::create_dir_all(&dir).unwrap();
        write_png(&dir, "photo.png", 50, 50);
        let scene_path = dir.join("scene.toml");
        std::fs::write(&scene_path, "base = \"photo.png\"\ncanvas_width = 25\n").unwrap();

        let editor = Scene::load(&scene_path, &EditorSettings::default()).unwrap();

        assert_eq!(editor.canvas().unwrap().width, 25);
    }
}
