use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::Config,
    data_structures::{instance::Instance, model::Model, texture::GpuTexture},
    pipelines::Pipelines,
    render::{DrawMode, GpuModel, SceneObject},
    resources::{
        self,
        texture::{GpuTextures, ImageFileDecoder, material_layout},
    },
};

/// Window, GPU handles and everything shared by all draws.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: GpuTexture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub pipelines: Pipelines,
    pub textures: GpuTextures,
    pub material_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    pub asset_dir: PathBuf,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &Config) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        // Wireframe objects need line rasterisation, which is optional
        let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features,
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("cannot open the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colours and relies on an sRGB surface for the conversion
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = Camera::at(settings.camera_position).with_mode(settings.movement_mode);
        let projection = Projection::new(config.width, config.height, settings.projection);
        let camera = CameraResources::new(&device, camera, &projection);

        let depth_texture = GpuTexture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let material_layout = material_layout(&device);
        let pipelines = Pipelines::new(
            &device,
            &config,
            &camera.bind_group_layout,
            &material_layout,
        );
        let textures = GpuTextures::new(&device, &queue);

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            pipelines,
            textures,
            material_layout,
            clear_colour: settings.clear_colour,
            asset_dir: settings.asset_dir.clone(),
        })
    }

    /// Imports a model file below the asset directory; failures give an empty model.
    pub fn load_model(&mut self, relative: &str) -> Model {
        let path = self.asset_dir.join(relative);
        resources::load_model(&path, &mut ImageFileDecoder, &mut self.textures)
    }

    pub fn upload(&self, model: &Model) -> GpuModel {
        GpuModel::new(&self.device, model, &self.textures, &self.material_layout)
    }

    /// Uploads `model` and places it with `instance`.
    pub fn place(
        &self,
        name: &str,
        model: &Model,
        instance: Instance,
        mode: DrawMode,
    ) -> SceneObject {
        SceneObject::new(&self.device, name, self.upload(model), instance, mode)
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            GpuTexture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }
}
