use std::path::Path;

use anyhow::Context as _;
use image::DynamicImage;

use crate::{
    data_structures::{
        model::{TextureId, TextureKind},
        texture::GpuTexture,
    },
    resources::load_binary,
};

/// Pixel layout of a decoded image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Tightly packed 8 bit pixels, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Maps 1, 3 and 4 channel images to red, RGB and RGBA.
    ///
    /// Other channel counts (luma + alpha) are converted to RGBA so every image
    /// ends up with a defined format.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (format, pixels) = match img.color().channel_count() {
            1 => (PixelFormat::Red, img.into_luma8().into_raw()),
            3 => (PixelFormat::Rgb, img.into_rgb8().into_raw()),
            4 => (PixelFormat::Rgba, img.into_rgba8().into_raw()),
            n => {
                log::debug!("Converting {}-channel image to RGBA.", n);
                (PixelFormat::Rgba, img.into_rgba8().into_raw())
            }
        };
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// Pixels expanded to RGBA8, the layout the GPU upload of colour textures uses.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.pixels.clone(),
            PixelFormat::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            PixelFormat::Red => self
                .pixels
                .iter()
                .flat_map(|&r| [r, 0, 0, 255])
                .collect(),
        }
    }
}

/// Where an image's bytes come from.
#[derive(Copy, Clone, Debug)]
pub enum ImageSource<'a> {
    File(&'a Path),
    Embedded { label: &'a str, bytes: &'a [u8] },
}

/// Turns image files into pixels.
pub trait ImageDecoder {
    fn decode(&mut self, source: ImageSource<'_>) -> anyhow::Result<DecodedImage>;
}

/// Decodes with the `image` crate, guessing the format from the content.
#[derive(Debug, Default)]
pub struct ImageFileDecoder;

impl ImageDecoder for ImageFileDecoder {
    fn decode(&mut self, source: ImageSource<'_>) -> anyhow::Result<DecodedImage> {
        let img = match source {
            ImageSource::File(path) => {
                let bytes = load_binary(path)?;
                image::load_from_memory(&bytes)
                    .with_context(|| format!("cannot decode {}", path.display()))?
            }
            ImageSource::Embedded { label, bytes } => image::load_from_memory(bytes)
                .with_context(|| format!("cannot decode embedded image {label}"))?,
        };
        Ok(DecodedImage::from_dynamic(img))
    }
}

/// Owner of texture handles.
///
/// `image` is `None` when decoding failed; the store still has to hand out a
/// usable id for a placeholder.
pub trait TextureStore {
    fn create(&mut self, image: Option<&DecodedImage>, kind: TextureKind, label: &str) -> TextureId;
}

/// Textures living on the GPU, addressed by [`TextureId`].
#[derive(Debug)]
pub struct GpuTextures {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: Vec<GpuTexture>,
    white: GpuTexture,
}

impl GpuTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = GpuTexture::create_placeholder(device, queue, "white placeholder");
        Self {
            // Device and Queue are reference counted, cloning only copies the handle
            device: device.clone(),
            queue: queue.clone(),
            textures: Vec::new(),
            white,
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(id.0 as usize)
    }

    /// 1x1 white texture bound when a mesh has no diffuse map.
    pub fn white(&self) -> &GpuTexture {
        &self.white
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureStore for GpuTextures {
    fn create(&mut self, image: Option<&DecodedImage>, kind: TextureKind, label: &str) -> TextureId {
        let texture = match image {
            Some(image) => {
                GpuTexture::from_decoded(&self.device, &self.queue, image, label, kind.is_srgb())
            }
            None => GpuTexture::create_placeholder(&self.device, &self.queue, label),
        };
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }
}

/// Bind group layout of a mesh material: diffuse texture, sampler and flags.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let image = DecodedImage {
            width: 1,
            height: 1,
            format: PixelFormat::Rgb,
            pixels: vec![1, 2, 3],
        };
        assert_eq!(image.to_rgba(), vec![1, 2, 3, 255]);
    }
}
