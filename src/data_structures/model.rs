//! CPU-side model data: vertices, meshes, texture references and models.
//!
//! Everything in here is plain data produced by the loaders in
//! [`crate::resources`]. GPU buffers are created from it in [`crate::render`].

use std::{collections::HashMap, fmt, path::PathBuf, rc::Rc};

use anyhow::ensure;

/// Describes how a `#[repr(C)]` type is laid out inside a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One sample point of a mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Semantic role of a texture bound to a mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    /// Sampler name prefix the shaders expect, e.g. `texture_diffuse`.
    pub fn sampler_name(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    /// Colour data is stored in sRGB, everything else is linear.
    pub fn is_srgb(&self) -> bool {
        matches!(self, TextureKind::Diffuse | TextureKind::Specular)
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sampler_name())
    }
}

/// Opaque handle of a texture owned by a [`crate::resources::texture::TextureStore`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A texture used by one or more meshes of a model.
///
/// `path` is the string the material referenced and doubles as the
/// deduplication key while the owning model is loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub kind: TextureKind,
    pub path: String,
}

/// Triangle mesh: vertices, counter-clockwise index triples and textures.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    textures: Vec<Rc<Texture>>,
}

impl Mesh {
    /// Fails if the indices don't form whole triangles or point past the vertices.
    pub fn new(
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<Rc<Texture>>,
    ) -> anyhow::Result<Self> {
        ensure!(
            indices.len() % 3 == 0,
            "index count {} is not a multiple of 3",
            indices.len()
        );
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            anyhow::bail!(
                "index {} out of range for {} vertices",
                bad,
                vertices.len()
            );
        }
        Ok(Self {
            vertices,
            indices,
            textures,
        })
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// First texture of the given kind, if any.
    pub fn texture(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        self.textures.iter().find(|t| t.kind == kind)
    }
}

/// A set of meshes loaded together.
///
/// `textures_loaded` maps source paths to the texture created for them and is
/// only written while the model is being imported.
#[derive(Debug, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub(crate) textures_loaded: HashMap<String, Rc<Texture>>,
    pub directory: PathBuf,
}

impl Model {
    /// A model without meshes; drawing it is a no-op.
    pub fn empty(directory: impl Into<PathBuf>) -> Self {
        Self {
            meshes: Vec::new(),
            textures_loaded: HashMap::new(),
            directory: directory.into(),
        }
    }

    pub fn from_meshes(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Every unique texture this model loaded.
    pub fn loaded_textures(&self) -> impl Iterator<Item = &Rc<Texture>> {
        self.textures_loaded.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_partial_triangles() {
        let vertices = vec![ModelVertex::default(); 3];
        assert!(Mesh::new(vertices, vec![0, 1], Vec::new()).is_err());
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let vertices = vec![ModelVertex::default(); 3];
        assert!(Mesh::new(vertices, vec![0, 1, 3], Vec::new()).is_err());
    }

    #[test]
    fn vertex_layout_matches_struct_size() {
        assert_eq!(
            ModelVertex::desc().array_stride as usize,
            std::mem::size_of::<[f32; 14]>()
        );
    }
}
