use std::rc::Rc;

use flow_orbit::{
    data_structures::{
        model::TextureKind,
        scene_graph::{ImportedScene, MaterialSlot, RawMaterial, RawMesh, SceneNode},
    },
    resources::importer::import_scene,
};

use crate::common::test_utils::{CountingDecoder, RecordingStore};

mod common;

/// A single triangle whose first vertex sits at `x`, used to identify meshes.
fn triangle(x: f32, material_index: Option<usize>) -> RawMesh {
    RawMesh {
        name: format!("triangle_{}", x),
        positions: vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 0.0]],
        normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
        tex_coords: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]],
        faces: vec![vec![0, 1, 2]],
        material_index,
        ..Default::default()
    }
}

fn first_x(model: &flow_orbit::data_structures::model::Model) -> Vec<f32> {
    model
        .meshes
        .iter()
        .map(|m| m.vertices()[0].position[0])
        .collect()
}

#[test]
fn shared_texture_path_is_decoded_once() {
    let scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0, 1])),
        meshes: vec![triangle(0.0, Some(0)), triangle(1.0, Some(1))],
        materials: vec![
            RawMaterial::new("a").with_texture(MaterialSlot::Diffuse, "wood.png"),
            RawMaterial::new("b").with_texture(MaterialSlot::Diffuse, "wood.png"),
        ],
        ..Default::default()
    };
    let mut decoder = CountingDecoder::new();
    let mut store = RecordingStore::new();

    let model = import_scene(&scene, "assets", &mut decoder, &mut store);

    assert_eq!(model.meshes.len(), 2);
    assert_eq!(decoder.decode_count(), 1);
    assert_eq!(store.created.len(), 1);
    let a = model.meshes[0].texture(TextureKind::Diffuse).unwrap();
    let b = model.meshes[1].texture(TextureKind::Diffuse).unwrap();
    assert!(Rc::ptr_eq(a, b));
    assert_eq!(a.id, b.id);
    assert_eq!(model.loaded_textures().count(), 1);
}

#[test]
fn slots_are_remapped_to_texture_kinds() {
    let material = RawMaterial::new("remap")
        .with_texture(MaterialSlot::Height, "normal.png")
        .with_texture(MaterialSlot::Ambient, "height.png")
        .with_texture(MaterialSlot::Specular, "spec.png")
        .with_texture(MaterialSlot::Diffuse, "diffuse.png")
        .with_texture(MaterialSlot::Emissive, "ignored.png");
    let scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0])),
        meshes: vec![triangle(0.0, Some(0))],
        materials: vec![material],
        ..Default::default()
    };
    let mut decoder = CountingDecoder::new();
    let mut store = RecordingStore::new();

    let model = import_scene(&scene, "assets", &mut decoder, &mut store);

    let textures: Vec<(TextureKind, &str)> = model.meshes[0]
        .textures()
        .iter()
        .map(|t| (t.kind, t.path.as_str()))
        .collect();
    assert_eq!(
        textures,
        vec![
            (TextureKind::Diffuse, "diffuse.png"),
            (TextureKind::Specular, "spec.png"),
            (TextureKind::Normal, "normal.png"),
            (TextureKind::Height, "height.png"),
        ]
    );
    assert!(!decoder.requests.contains(&"ignored.png".to_string()));
}

#[test]
fn nodes_are_visited_depth_first_in_order() {
    let root = SceneNode::new("root")
        .with_meshes(vec![0])
        .with_child(
            SceneNode::new("a")
                .with_meshes(vec![1])
                .with_child(SceneNode::new("a1").with_meshes(vec![2])),
        )
        .with_child(SceneNode::new("b").with_meshes(vec![3, 4]));
    let scene = ImportedScene {
        root: Some(root),
        meshes: (0..5).map(|i| triangle(i as f32, None)).collect(),
        ..Default::default()
    };

    let model = import_scene(
        &scene,
        "assets",
        &mut CountingDecoder::new(),
        &mut RecordingStore::new(),
    );

    assert_eq!(first_x(&model), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn incomplete_or_rootless_scene_gives_empty_model() {
    let mut scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0])),
        meshes: vec![triangle(0.0, None)],
        incomplete: true,
        ..Default::default()
    };
    let mut decoder = CountingDecoder::new();
    let mut store = RecordingStore::new();
    assert!(import_scene(&scene, "assets", &mut decoder, &mut store).is_empty());

    scene.incomplete = false;
    scene.root = None;
    assert!(import_scene(&scene, "assets", &mut decoder, &mut store).is_empty());

    let empty = ImportedScene::default();
    assert!(import_scene(&empty, "assets", &mut decoder, &mut store).is_empty());
    assert_eq!(decoder.decode_count(), 0);
}

#[test]
fn failed_decode_uses_placeholder() {
    let scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0, 1])),
        meshes: vec![triangle(0.0, Some(0)), triangle(1.0, Some(0))],
        materials: vec![RawMaterial::new("broken").with_texture(MaterialSlot::Diffuse, "missing.png")],
        ..Default::default()
    };
    let mut decoder = CountingDecoder::failing_on("missing.png");
    let mut store = RecordingStore::new();

    let model = import_scene(&scene, "assets", &mut decoder, &mut store);

    assert_eq!(model.meshes.len(), 2);
    assert_eq!(store.placeholders(), 1);
    // The failure is remembered like any other texture
    assert_eq!(decoder.decode_count(), 1);
    let texture = model.meshes[1].texture(TextureKind::Diffuse).unwrap();
    assert_eq!(texture.path, "missing.png");
}

#[test]
fn bad_mesh_references_are_skipped() {
    let scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0, 7, 1])),
        meshes: vec![triangle(0.0, Some(3)), triangle(1.0, None)],
        ..Default::default()
    };
    let model = import_scene(
        &scene,
        "assets",
        &mut CountingDecoder::new(),
        &mut RecordingStore::new(),
    );
    assert_eq!(first_x(&model), vec![0.0, 1.0]);
    assert!(model.meshes[0].textures().is_empty());
}

#[test]
fn embedded_images_are_decoded_from_memory() {
    let scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0])),
        meshes: vec![triangle(0.0, Some(0))],
        materials: vec![RawMaterial::new("glb").with_texture(MaterialSlot::Diffuse, "*0")],
        embedded_images: vec![vec![1, 2, 3]],
        ..Default::default()
    };
    let mut decoder = CountingDecoder::new();
    let model = import_scene(&scene, "assets", &mut decoder, &mut RecordingStore::new());

    assert_eq!(decoder.requests, vec!["*0".to_string()]);
    assert!(model.meshes[0].texture(TextureKind::Diffuse).is_some());
}
