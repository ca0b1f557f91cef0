use std::{
    collections::hash_map::Entry,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    data_structures::{
        model::{Mesh, Model, Texture, TextureKind},
        scene_graph::{ImportedScene, MaterialSlot, RawMaterial, SceneNode},
    },
    resources::{
        mesh::raw_geometry,
        texture::{DecodedImage, ImageDecoder, ImageSource, TextureStore},
    },
};

/// Material slots pulled for every mesh, in this order.
///
/// Normal maps are read from the height slot and height maps from the ambient
/// slot. That is the convention of the OBJ exports this viewer is used with
/// (`map_Bump` holds the normal map, `map_Ka` the height map).
pub const TEXTURE_SLOTS: [(MaterialSlot, TextureKind); 4] = [
    (MaterialSlot::Diffuse, TextureKind::Diffuse),
    (MaterialSlot::Specular, TextureKind::Specular),
    (MaterialSlot::Height, TextureKind::Normal),
    (MaterialSlot::Ambient, TextureKind::Height),
];

/**
 * Builds a [`Model`] from an imported scene.
 *
 * Nodes are visited depth first, each node's meshes before its children.
 * Texture paths are resolved against `directory` and every distinct path is
 * decoded once per model. An unusable scene yields an empty model.
 */
pub fn import_scene(
    scene: &ImportedScene,
    directory: impl Into<PathBuf>,
    decoder: &mut dyn ImageDecoder,
    store: &mut dyn TextureStore,
) -> Model {
    let mut model = Model::empty(directory);
    let root = match (&scene.root, scene.incomplete) {
        (Some(root), false) => root,
        _ => {
            log::error!(
                "Scene in {} is incomplete or has no root node, the model stays empty.",
                model.directory.display()
            );
            return model;
        }
    };

    let mut stack: Vec<&SceneNode> = vec![root];
    while let Some(node) = stack.pop() {
        for &mesh_idx in &node.meshes {
            match process_mesh(scene, mesh_idx, &mut model, decoder, store) {
                Ok(mesh) => model.meshes.push(mesh),
                Err(e) => log::warn!(
                    "Mesh {} of node '{}' could not be loaded: {:#}",
                    mesh_idx,
                    node.name,
                    e
                ),
            }
        }
        // Reversed so the first child is popped next
        stack.extend(node.children.iter().rev());
    }

    log::info!(
        "Loaded {} mesh(es) and {} texture(s) from {}",
        model.meshes.len(),
        model.textures_loaded.len(),
        model.directory.display()
    );
    model
}

fn process_mesh(
    scene: &ImportedScene,
    mesh_idx: usize,
    model: &mut Model,
    decoder: &mut dyn ImageDecoder,
    store: &mut dyn TextureStore,
) -> anyhow::Result<Mesh> {
    let raw = scene
        .meshes
        .get(mesh_idx)
        .ok_or_else(|| anyhow::anyhow!("the scene only has {} meshes", scene.meshes.len()))?;
    let (vertices, indices) = raw_geometry(raw);

    let mut textures = Vec::new();
    match raw.material_index.map(|idx| (idx, scene.materials.get(idx))) {
        Some((_, Some(material))) => {
            for (slot, kind) in TEXTURE_SLOTS {
                textures.extend(load_material_textures(
                    scene, material, slot, kind, model, decoder, store,
                ));
            }
        }
        Some((idx, None)) => log::warn!(
            "Mesh '{}' references missing material {}, it stays untextured.",
            raw.name,
            idx
        ),
        None => (),
    }

    Mesh::new(vertices, indices, textures)
}

/// Textures of one slot, reusing those the model already loaded.
fn load_material_textures(
    scene: &ImportedScene,
    material: &RawMaterial,
    slot: MaterialSlot,
    kind: TextureKind,
    model: &mut Model,
    decoder: &mut dyn ImageDecoder,
    store: &mut dyn TextureStore,
) -> Vec<Rc<Texture>> {
    (0..material.texture_count(slot))
        .filter_map(|i| material.texture(slot, i))
        .map(|path| match model.textures_loaded.entry(path.to_string()) {
            Entry::Occupied(loaded) => Rc::clone(loaded.get()),
            Entry::Vacant(vacant) => {
                let id = match decode(scene, &model.directory, path, decoder) {
                    Ok(image) => store.create(Some(&image), kind, path),
                    Err(e) => {
                        log::warn!("Texture failed to load at path {}: {:#}", path, e);
                        store.create(None, kind, path)
                    }
                };
                let texture = Rc::new(Texture {
                    id,
                    kind,
                    path: path.to_string(),
                });
                Rc::clone(vacant.insert(texture))
            }
        })
        .collect()
}

fn decode(
    scene: &ImportedScene,
    directory: &Path,
    path: &str,
    decoder: &mut dyn ImageDecoder,
) -> anyhow::Result<DecodedImage> {
    match scene.embedded_image(path) {
        Some(bytes) => decoder.decode(ImageSource::Embedded { label: path, bytes }),
        None => decoder.decode(ImageSource::File(&directory.join(path))),
    }
}
