//! softlight: a CPU software rendering pipeline
//!
//! Transforms, rasterizes and shades triangle meshes into plain color and
//! depth buffers, with forward and deferred Blinn-Phong paths.

pub mod config;
pub mod rasterizer;
pub mod scene;
