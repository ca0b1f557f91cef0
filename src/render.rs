//! GPU side of the scene and the draw calls.
//!
//! # Key types
//!
//! - [`GpuModel`] holds vertex/index buffers and a material bind group per mesh
//! - [`SceneObject`] is a model placed in the world with a [`DrawMode`]
//! - [`Scene`] is the ordered list of objects drawn every frame
//! - [`DrawModel`] extends `wgpu::RenderPass` with model draw calls

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Model, TextureKind},
    },
    pipelines::Pipelines,
    resources::texture::GpuTextures,
};

/// How a [`SceneObject`] is rasterised.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Filled,
    Wireframe,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    has_diffuse: u32,
    // Uniform buffers are 16 byte aligned
    _padding: [u32; 3],
}

/// Buffers of one mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material_bind_group: wgpu::BindGroup,
}

#[derive(Debug, Default)]
pub struct GpuModel {
    pub meshes: Vec<GpuMesh>,
}

impl GpuModel {
    /**
     * Uploads every non-empty mesh of `model`.
     *
     * The mesh's first diffuse texture is bound if it has one; otherwise the
     * store's white texture is bound and the shader uses the instance colour.
     */
    pub fn new(
        device: &wgpu::Device,
        model: &Model,
        textures: &GpuTextures,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let meshes = model
            .meshes
            .iter()
            .enumerate()
            .filter(|(_, mesh)| !mesh.indices().is_empty())
            .map(|(i, mesh)| {
                let diffuse = mesh
                    .texture(TextureKind::Diffuse)
                    .and_then(|texture| textures.get(texture.id));
                let texture = diffuse.unwrap_or_else(|| textures.white());
                let uniform = MaterialUniform {
                    has_diffuse: diffuse.is_some() as u32,
                    _padding: [0; 3],
                };
                let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Material Buffer {}", model.directory.display(), i)),
                    contents: bytemuck::cast_slice(&[uniform]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: material_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: material_buffer.as_entire_binding(),
                        },
                    ],
                    label: Some("material_bind_group"),
                });

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer {}", model.directory.display(), i)),
                    contents: bytemuck::cast_slice(mesh.vertices()),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer {}", model.directory.display(), i)),
                    contents: bytemuck::cast_slice(mesh.indices()),
                    usage: wgpu::BufferUsages::INDEX,
                });

                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    num_elements: mesh.indices().len() as u32,
                    material_bind_group,
                }
            })
            .collect();
        Self { meshes }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// A model placed in the world.
#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    pub model: GpuModel,
    pub instance: Instance,
    pub mode: DrawMode,
    instance_buffer: wgpu::Buffer,
}

impl SceneObject {
    pub fn new(
        device: &wgpu::Device,
        name: impl Into<String>,
        model: GpuModel,
        instance: Instance,
        mode: DrawMode,
    ) -> Self {
        let name = name.into();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", name)),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            name,
            model,
            instance,
            mode,
            instance_buffer,
        }
    }
}

/// Objects drawn each frame, in insertion order.
#[derive(Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Records one instanced draw per mesh of every object.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        pipelines: &Pipelines,
        camera_bind_group: &wgpu::BindGroup,
    ) {
        for object in &self.objects {
            if object.model.is_empty() {
                continue;
            }
            render_pass.set_pipeline(pipelines.for_mode(object.mode));
            render_pass.set_vertex_buffer(1, object.instance_buffer.slice(..));
            render_pass.draw_model_instanced(&object.model, 0..1, camera_bind_group);
        }
    }
}

pub trait DrawModel {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &GpuMesh,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
    );

    fn draw_model_instanced(
        &mut self,
        model: &GpuModel,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &GpuMesh,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, &mesh.material_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &GpuModel,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            self.draw_mesh_instanced(mesh, instances.clone(), camera_bind_group);
        }
    }
}
