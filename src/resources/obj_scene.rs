use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::scene_graph::{
        ImportFlags, ImportedScene, MaterialSlot, RawMaterial, RawMesh, SceneNode,
    },
    resources::load_string,
};

/// Reads an OBJ file and the MTL libraries next to it.
pub fn load_obj_scene(path: &Path, flags: &ImportFlags) -> anyhow::Result<ImportedScene> {
    let obj_text = load_string(path)?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    parse_obj(&obj_text, |mtl| load_string(&directory.join(mtl)), flags)
}

/**
 * Parses OBJ text with `tobj`.
 *
 * `load_mtl` resolves the material libraries the file references. A library that
 * can't be read only costs the textures, the geometry is still imported. Every
 * OBJ object becomes a child of a synthetic root node.
 */
pub fn parse_obj<F>(obj_text: &str, load_mtl: F, flags: &ImportFlags) -> anyhow::Result<ImportedScene>
where
    F: Fn(&Path) -> anyhow::Result<String>,
{
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: flags.triangulate,
            single_index: true,
            ..Default::default()
        },
        |p| match load_mtl(p) {
            Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
            Err(e) => {
                log::warn!("Material library {} not found: {:#}", p.display(), e);
                Err(tobj::LoadError::OpenFileFailed)
            }
        },
    )?;

    let materials = match obj_materials {
        Ok(materials) => materials.into_iter().map(to_raw_material).collect(),
        Err(e) => {
            log::warn!("Ignoring materials of OBJ file: {}", e);
            Vec::new()
        }
    };

    let mut root = SceneNode::new("root");
    let mut meshes = Vec::with_capacity(models.len());
    for model in models {
        root.children
            .push(SceneNode::new(model.name.clone()).with_meshes(vec![meshes.len()]));
        meshes.push(to_raw_mesh(model));
    }

    let mut scene = ImportedScene {
        root: Some(root),
        meshes,
        materials,
        ..Default::default()
    };
    scene.postprocess(flags);
    Ok(scene)
}

fn to_raw_mesh(model: tobj::Model) -> RawMesh {
    let m = model.mesh;
    let positions: Vec<[f32; 3]> = m
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = (m.normals.len() == m.positions.len() && !m.normals.is_empty()).then(|| {
        m.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    });
    let tex_coords = if m.texcoords.is_empty() {
        Vec::new()
    } else {
        vec![m.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect()]
    };

    // Triangulated meshes come without arities
    let faces = if m.face_arities.is_empty() {
        m.indices.chunks(3).map(<[u32]>::to_vec).collect()
    } else {
        let mut start = 0;
        m.face_arities
            .iter()
            .map(|&arity| {
                let end = (start + arity as usize).min(m.indices.len());
                let face = m.indices[start..end].to_vec();
                start = end;
                face
            })
            .collect()
    };

    RawMesh {
        name: model.name,
        positions,
        normals,
        tex_coords,
        tangents: None,
        bitangents: None,
        faces,
        material_index: m.material_id,
    }
}

fn to_raw_material(m: tobj::Material) -> RawMaterial {
    let mut material = RawMaterial::new(m.name);
    let slots = [
        (MaterialSlot::Diffuse, m.diffuse_texture),
        (MaterialSlot::Specular, m.specular_texture),
        (MaterialSlot::Height, m.normal_texture),
        (MaterialSlot::Ambient, m.ambient_texture),
        (MaterialSlot::Shininess, m.shininess_texture),
        (MaterialSlot::Opacity, m.dissolve_texture),
    ];
    for (slot, path) in slots {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            material.add_texture(slot, path);
        }
    }
    material
}
