use std::path::Path;

use anyhow::bail;
use cgmath::Vector3;

use crate::{
    data_structures::scene_graph::{
        ImportFlags, ImportedScene, MaterialSlot, RawMaterial, RawMesh, SceneNode,
    },
    resources::{
        load_binary,
        mesh::{fan_to_triangles, strip_to_triangles},
    },
};

/// Node hierarchies deeper than this are cut off.
const MAX_NODE_DEPTH: usize = 256;

/// Reads a `.gltf` or `.glb` file; external buffers are resolved next to it.
pub fn load_gltf_scene(path: &Path, flags: &ImportFlags) -> anyhow::Result<ImportedScene> {
    let bytes = load_binary(path)?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    parse_gltf(&bytes, |uri| load_binary(&directory.join(uri)), flags)
}

/**
 * Converts a glTF document into an imported scene.
 *
 * Every primitive becomes its own raw mesh. The default scene (or the first one)
 * is placed under a synthetic root; a document without scenes is flagged
 * incomplete. Images stored in buffer views are addressed as `*<image index>`.
 */
pub fn parse_gltf<F>(bytes: &[u8], mut load_uri: F, flags: &ImportFlags) -> anyhow::Result<ImportedScene>
where
    F: FnMut(&str) -> anyhow::Result<Vec<u8>>,
{
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                buffer_data.push(gltf.blob.as_deref().map(<[u8]>::to_vec).unwrap_or_default());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                bail!("buffer {} uses a data URI which is not supported", buffer.index());
            }
            gltf::buffer::Source::Uri(uri) => buffer_data.push(load_uri(uri)?),
        }
    }

    let embedded_images = gltf
        .images()
        .map(|image| match image.source() {
            gltf::image::Source::View { view, .. } => buffer_data
                .get(view.buffer().index())
                .and_then(|data| data.get(view.offset()..view.offset() + view.length()))
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            gltf::image::Source::Uri { .. } => Vec::new(),
        })
        .collect();

    let materials = gltf.materials().map(to_raw_material).collect();

    let mut meshes = Vec::new();
    let mut primitives_of_mesh: Vec<Vec<usize>> = Vec::new();
    for mesh in gltf.meshes() {
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            if let Some(raw) = read_primitive(&mesh, &primitive, &buffer_data, flags) {
                indices.push(meshes.len());
                meshes.push(raw);
            }
        }
        primitives_of_mesh.push(indices);
    }

    let root = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .map(|scene| SceneNode {
            name: scene.name().unwrap_or("root").to_string(),
            meshes: Vec::new(),
            children: scene
                .nodes()
                .map(|node| to_scene_node(node, &primitives_of_mesh, 0))
                .collect(),
        });

    let mut scene = ImportedScene {
        incomplete: root.is_none(),
        root,
        meshes,
        materials,
        embedded_images,
    };
    scene.postprocess(flags);
    Ok(scene)
}

fn to_scene_node(node: gltf::Node, primitives_of_mesh: &[Vec<usize>], depth: usize) -> SceneNode {
    let mut scene_node = SceneNode::new(node.name().unwrap_or("node"));
    if let Some(mesh) = node.mesh() {
        scene_node.meshes = primitives_of_mesh
            .get(mesh.index())
            .cloned()
            .unwrap_or_default();
    }
    if depth >= MAX_NODE_DEPTH {
        log::warn!(
            "Node '{}' is nested deeper than {} levels, its children are ignored.",
            scene_node.name,
            MAX_NODE_DEPTH
        );
        return scene_node;
    }
    scene_node.children = node
        .children()
        .map(|child| to_scene_node(child, primitives_of_mesh, depth + 1))
        .collect();
    scene_node
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffer_data: &[Vec<u8>],
    flags: &ImportFlags,
) -> Option<RawMesh> {
    let name = mesh.name().unwrap_or("unknown_mesh").to_string();
    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive {} of mesh '{}' has no positions.", primitive.index(), name);
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    // Stored bottom-left like OBJ so that `flip_uvs` treats both formats alike
    let tex_coords: Vec<Vec<[f32; 2]>> = (0..)
        .map_while(|set| reader.read_tex_coords(set))
        .map(|channel| channel.into_f32().map(|[u, v]| [u, 1.0 - v]).collect())
        .collect();

    let (tangents, bitangents) = match reader.read_tangents() {
        Some(tangent_attribute) => {
            let (tangents, bitangents): (Vec<[f32; 3]>, Vec<[f32; 3]>) = tangent_attribute
                .enumerate()
                .map(|(i, [x, y, z, w])| {
                    // glTF stores the bitangent sign in w
                    let tangent = Vector3::new(x, y, z);
                    let normal: Vector3<f32> = normals
                        .as_ref()
                        .and_then(|n| n.get(i))
                        .copied()
                        .unwrap_or_default()
                        .into();
                    (Into::<[f32; 3]>::into(tangent), Into::<[f32; 3]>::into(normal.cross(tangent) * w))
                })
                .unzip();
            (Some(tangents), Some(bitangents))
        }
        None => (None, None),
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = match (primitive.mode(), flags.triangulate) {
        (gltf::mesh::Mode::Triangles, _) => indices.chunks(3).map(<[u32]>::to_vec).collect(),
        (gltf::mesh::Mode::TriangleStrip, true) => strip_to_triangles(&indices),
        (gltf::mesh::Mode::TriangleFan, true) => fan_to_triangles(&indices),
        (gltf::mesh::Mode::TriangleStrip | gltf::mesh::Mode::TriangleFan, false) => vec![indices],
        (mode, _) => {
            log::warn!(
                "Skipping primitive {} of mesh '{}': {:?} primitives aren't drawn.",
                primitive.index(),
                name,
                mode
            );
            return None;
        }
    };

    Some(RawMesh {
        name,
        positions,
        normals,
        tex_coords,
        tangents,
        bitangents,
        faces,
        material_index: primitive.material().index(),
    })
}

fn image_path(image: gltf::Image) -> String {
    match image.source() {
        gltf::image::Source::View { .. } => format!("*{}", image.index()),
        gltf::image::Source::Uri { uri, .. } => uri.to_string(),
    }
}

fn to_raw_material(material: gltf::Material) -> RawMaterial {
    let mut raw = RawMaterial::new(material.name().unwrap_or("material"));
    let pbr = material.pbr_metallic_roughness();
    if let Some(info) = pbr.base_color_texture() {
        raw.add_texture(MaterialSlot::Diffuse, image_path(info.texture().source()));
    }
    if let Some(normal) = material.normal_texture() {
        raw.add_texture(MaterialSlot::Normals, image_path(normal.texture().source()));
    }
    if let Some(occlusion) = material.occlusion_texture() {
        raw.add_texture(MaterialSlot::Lightmap, image_path(occlusion.texture().source()));
    }
    if let Some(info) = material.emissive_texture() {
        raw.add_texture(MaterialSlot::Emissive, image_path(info.texture().source()));
    }
    raw
}
