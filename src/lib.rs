//! flow-orbit
//!
//! A small interactive 3-D model viewer. Meshes are imported from OBJ/glTF
//! files or tessellated from a surface `z = f(x, y)`, placed in a scene and
//! drawn every frame from an orbiting (or free-flying) camera driven by
//! keyboard and mouse.
//!
//! High-level modules
//! - `camera`: camera state, view/projection matrices and the GPU uniform
//! - `input`: controller turning window events into camera changes
//! - `config`: startup settings (window, clear colour, asset directory)
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: vertices, meshes, models, instances, imported scenes
//! - `flow`: the winit application and per-frame loop
//! - `pipelines`: filled and wireframe render pipelines
//! - `resources`: model import, surface tessellation and image decoding
//! - `render`: GPU models, the scene and draw calls
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::event::WindowEvent;
