//! Startup settings of the viewer window.

use std::path::PathBuf;

use cgmath::Point3;

use crate::camera::{MovementMode, ProjectionKind};

#[derive(Clone, Debug)]
pub struct Config {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
    /// Directory relative asset paths are resolved against.
    pub asset_dir: PathBuf,
    pub camera_position: Point3<f32>,
    pub movement_mode: MovementMode,
    pub projection: ProjectionKind,
    /// Hide the cursor and keep it inside the window.
    pub grab_cursor: bool,
}

impl Config {
    pub fn asset(&self, relative: &str) -> PathBuf {
        self.asset_dir.join(relative)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "flow-orbit".to_string(),
            width: 800,
            height: 600,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
            asset_dir: PathBuf::from("assets"),
            camera_position: Point3::new(0.0, 1.0, 3.0),
            movement_mode: MovementMode::Orbital,
            projection: ProjectionKind::Perspective,
            grab_cursor: true,
        }
    }
}
