//! Render pipelines.
//!
//! There is one shader for every model; the pipelines only differ in their
//! polygon mode.

pub mod basic;

use crate::render::DrawMode;

/// Filled pipeline and, if the device can rasterise lines, a wireframe one.
#[derive(Debug)]
pub struct Pipelines {
    pub fill: wgpu::RenderPipeline,
    pub wireframe: Option<wgpu::RenderPipeline>,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let fill = basic::mk_basic_pipeline(
            device,
            config,
            camera_bind_group_layout,
            material_bind_group_layout,
            wgpu::PolygonMode::Fill,
        );
        let wireframe = if device.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            Some(basic::mk_basic_pipeline(
                device,
                config,
                camera_bind_group_layout,
                material_bind_group_layout,
                wgpu::PolygonMode::Line,
            ))
        } else {
            log::warn!(
                "The GPU does not support line polygon mode, wireframe objects are drawn filled."
            );
            None
        };
        Self { fill, wireframe }
    }

    /// Pipeline for the mode, falling back to the filled one.
    pub fn for_mode(&self, mode: DrawMode) -> &wgpu::RenderPipeline {
        match mode {
            DrawMode::Wireframe => self.wireframe.as_ref().unwrap_or(&self.fill),
            DrawMode::Filled => &self.fill,
        }
    }
}
