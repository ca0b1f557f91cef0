//! Renderer data structures: models, textures, scene graphs, and instances.
//!
//! - `model` contains vertices, meshes, texture references and models
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-object transformation and colour
//! - `scene_graph` is the importer-neutral scene an asset file is parsed into

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
