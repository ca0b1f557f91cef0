//! Loading meshes and textures from external files and generating meshes
//! procedurally.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::Model,
        scene_graph::{ImportFlags, ImportedScene},
    },
    resources::{
        gltf_scene::load_gltf_scene,
        importer::import_scene,
        obj_scene::load_obj_scene,
        texture::{ImageDecoder, TextureStore},
    },
};

pub mod gltf_scene;
pub mod importer;
pub mod mesh;
pub mod obj_scene;
pub mod texture;

pub fn load_string(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Parses an asset file, picking the importer by file extension.
pub fn load_scene(path: &Path, flags: &ImportFlags) -> anyhow::Result<ImportedScene> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("obj") => load_obj_scene(path, flags),
        Some("gltf") | Some("glb") => load_gltf_scene(path, flags),
        _ => anyhow::bail!("unsupported model format: {}", path.display()),
    }
}

/**
 * Loads a model from disk.
 *
 * Never fails: a file that can't be read or parsed is logged and results in an
 * empty model, which draws nothing.
 */
pub fn load_model(
    path: &Path,
    decoder: &mut dyn ImageDecoder,
    store: &mut dyn TextureStore,
) -> Model {
    let directory = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    match load_scene(path, &ImportFlags::default()) {
        Ok(scene) => import_scene(&scene, directory, decoder, store),
        Err(e) => {
            log::error!("Model {} could not be imported: {:#}", path.display(), e);
            Model::empty(directory)
        }
    }
}
