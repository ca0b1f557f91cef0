//! Imported scene graphs.
//!
//! Asset loaders (OBJ, glTF) translate their files into an [`ImportedScene`]:
//! a tree of [`SceneNode`]s referencing [`RawMesh`]es by index plus a material
//! table. The tree is only read afterwards; see
//! [`crate::resources::importer::import_scene`] for the walk that turns it
//! into a [`crate::data_structures::model::Model`].

use std::collections::HashMap;

use crate::resources::mesh::{calculate_smooth_normals, calculate_tangent_space};

/// Texture slot of a material as the asset file declares it.
///
/// These are the importer's categories, not the renderer's. The mapping to
/// [`crate::data_structures::model::TextureKind`] happens in the importer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
    Height,
    Normals,
    Shininess,
    Opacity,
    Lightmap,
}

/// Texture paths per slot, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct RawMaterial {
    pub name: String,
    slots: HashMap<MaterialSlot, Vec<String>>,
}

impl RawMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: HashMap::new(),
        }
    }

    pub fn add_texture(&mut self, slot: MaterialSlot, path: impl Into<String>) {
        self.slots.entry(slot).or_default().push(path.into());
    }

    pub fn with_texture(mut self, slot: MaterialSlot, path: impl Into<String>) -> Self {
        self.add_texture(slot, path);
        self
    }

    pub fn texture_count(&self, slot: MaterialSlot) -> usize {
        self.slots.get(&slot).map_or(0, Vec::len)
    }

    pub fn texture(&self, slot: MaterialSlot, index: usize) -> Option<&str> {
        self.slots
            .get(&slot)
            .and_then(|paths| paths.get(index))
            .map(String::as_str)
    }
}

/// Mesh data exactly as the importer produced it, before validation.
///
/// `tex_coords` holds one entry per UV channel; only channel 0 is used later.
/// `faces` are expected to be triangles once the scene has been triangulated.
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    pub faces: Vec<Vec<u32>>,
    pub material_index: Option<usize>,
}

impl RawMesh {
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// The first UV channel, if the mesh has one.
    pub fn first_tex_coords(&self) -> Option<&[[f32; 2]]> {
        self.tex_coords.first().map(Vec::as_slice)
    }
}

/// One node of the imported hierarchy.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    /// Indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Post-processing applied after a file was parsed.
#[derive(Copy, Clone, Debug)]
pub struct ImportFlags {
    /// Split polygons, strips and fans into triangle lists.
    pub triangulate: bool,
    /// Generate per-vertex normals for meshes that have none.
    pub gen_smooth_normals: bool,
    /// Mirror the v coordinate (`v = 1 - v`).
    pub flip_uvs: bool,
    /// Derive tangents and bitangents from the first UV channel.
    pub calc_tangent_space: bool,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            triangulate: true,
            gen_smooth_normals: true,
            flip_uvs: true,
            calc_tangent_space: true,
        }
    }
}

/// A parsed asset file.
#[derive(Clone, Debug, Default)]
pub struct ImportedScene {
    pub root: Option<SceneNode>,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
    /// Set when the loader could not produce a usable scene.
    pub incomplete: bool,
    /// Images stored inside the asset itself, addressed as `*<index>`.
    pub embedded_images: Vec<Vec<u8>>,
}

impl ImportedScene {
    /// Scenes without a root or flagged incomplete produce no meshes.
    pub fn is_usable(&self) -> bool {
        self.root.is_some() && !self.incomplete
    }

    /// Returns the bytes of an embedded image referenced as `*<index>`.
    pub fn embedded_image(&self, path: &str) -> Option<&[u8]> {
        let index: usize = path.strip_prefix('*')?.parse().ok()?;
        self.embedded_images.get(index).map(Vec::as_slice)
    }

    pub fn postprocess(&mut self, flags: &ImportFlags) {
        for mesh in &mut self.meshes {
            if flags.gen_smooth_normals && !mesh.has_normals() {
                mesh.normals = Some(calculate_smooth_normals(&mesh.positions, &mesh.faces));
            }
            if flags.flip_uvs {
                for channel in &mut mesh.tex_coords {
                    for uv in channel.iter_mut() {
                        uv[1] = 1.0 - uv[1];
                    }
                }
            }
            if flags.calc_tangent_space && mesh.tangents.is_none() {
                if let Some(uvs) = mesh.first_tex_coords() {
                    let (tangents, bitangents) =
                        calculate_tangent_space(&mesh.positions, uvs, &mesh.faces);
                    mesh.tangents = Some(tangents);
                    mesh.bitangents = Some(bitangents);
                }
            }
        }
    }
}
