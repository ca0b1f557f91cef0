use std::collections::HashSet;

use flow_orbit::{
    data_structures::model::{TextureId, TextureKind},
    resources::texture::{DecodedImage, ImageDecoder, ImageSource, PixelFormat, TextureStore},
};

/// Decoder that hands out a 1x1 image for every request and remembers what it
/// was asked for. Sources listed in `failing` produce an error instead.
#[derive(Default)]
pub struct CountingDecoder {
    pub requests: Vec<String>,
    pub failing: HashSet<String>,
}

impl CountingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            failing: [name.to_string()].into(),
            ..Default::default()
        }
    }

    pub fn decode_count(&self) -> usize {
        self.requests.len()
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(&mut self, source: ImageSource<'_>) -> anyhow::Result<DecodedImage> {
        let name = match source {
            ImageSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ImageSource::Embedded { label, .. } => label.to_string(),
        };
        self.requests.push(name.clone());
        if self.failing.contains(&name) {
            anyhow::bail!("cannot decode {}", name);
        }
        Ok(DecodedImage {
            width: 1,
            height: 1,
            format: PixelFormat::Rgba,
            pixels: vec![255, 255, 255, 255],
        })
    }
}

/// Store that only records what it was asked to create.
#[derive(Default)]
pub struct RecordingStore {
    pub created: Vec<Created>,
}

#[derive(Debug)]
pub struct Created {
    pub kind: TextureKind,
    pub label: String,
    pub placeholder: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholders(&self) -> usize {
        self.created.iter().filter(|c| c.placeholder).count()
    }
}

impl TextureStore for RecordingStore {
    fn create(&mut self, image: Option<&DecodedImage>, kind: TextureKind, label: &str) -> TextureId {
        self.created.push(Created {
            kind,
            label: label.to_string(),
            placeholder: image.is_none(),
        });
        TextureId(self.created.len() as u32 - 1)
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
