//! End-to-end composition: scene file → editor → exported PNG.

use image::{ImageFormat, Rgba, RgbaImage};
use imgkit::editor::{Action, EditorSettings, Point, export};
use imgkit::naming;
use imgkit::scene::Scene;
use std::path::Path;
use tempfile::TempDir;

const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: Rgba<u8>) {
    RgbaImage::from_pixel(w, h, color)
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn scene_exports_composited_png() {
    let tmp = TempDir::new().unwrap();
    write_png(tmp.path(), "photo.png", 200, 100, GREY);
    write_png(tmp.path(), "logo.png", 40, 20, RED);
    let scene_path = tmp.path().join("scene.toml");
    std::fs::write(
        &scene_path,
        "base = \"photo.png\"\n\n[[layer]]\npath = \"logo.png\"\nx = 10.0\ny = 10.0\n",
    )
    .unwrap();

    let editor = Scene::load(&scene_path, &EditorSettings::default()).unwrap();
    let out = tmp.path().join("out").join(naming::COMPOSE_FILE_NAME);
    export::save_png(&editor, &out).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (200, 100));
    assert_eq!(*img.get_pixel(30, 20), RED);
    assert_eq!(*img.get_pixel(100, 80), GREY);
}

#[test]
fn export_has_no_selection_outline() {
    let tmp = TempDir::new().unwrap();
    write_png(tmp.path(), "photo.png", 100, 100, GREY);
    write_png(tmp.path(), "logo.png", 20, 20, RED);
    let scene = Scene::parse("base = \"photo.png\"\n[[layer]]\npath = \"logo.png\"\n").unwrap();
    let mut editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

    let id = editor.layers().ids()[0].clone();
    editor.select(Some(id));
    let exported = image::load_from_memory(&editor.export_png().unwrap())
        .unwrap()
        .to_rgba8();

    // The layer spans 40..60; just outside its edge stays base-colored.
    assert_eq!(*exported.get_pixel(39, 50), GREY);
    assert_eq!(*exported.get_pixel(50, 50), RED);
}

#[test]
fn dragging_a_scene_layer_moves_it_in_the_export() {
    let tmp = TempDir::new().unwrap();
    write_png(tmp.path(), "photo.png", 100, 100, GREY);
    write_png(tmp.path(), "logo.png", 20, 20, RED);
    let scene = Scene::parse(
        "base = \"photo.png\"\n[[layer]]\npath = \"logo.png\"\nx = 0.0\ny = 0.0\n",
    )
    .unwrap();
    let mut editor = scene.build(tmp.path(), &EditorSettings::default()).unwrap();

    let actions = editor.pointer_down(Point::new(10.0, 10.0));
    assert!(actions.contains(&Action::RenderNeeded));
    editor.pointer_move(Point::new(60.0, 60.0));
    editor.pointer_up();

    let img = editor.render().unwrap();
    assert_eq!(*img.get_pixel(5, 5), GREY);
    assert_eq!(*img.get_pixel(55, 55), RED);
}
