//! CPU software rasterizer
//!
//! Features:
//! - Model/view/projection transforms over a leaf-to-root transform chain
//! - Barycentric triangle fill with a strict less-than depth test
//! - Blinn-Phong shading per pixel or per vertex
//! - Alpha blending for transparent objects
//! - Deferred shading through a five-buffer G-buffer
//! - Row-band parallel rasterization on the rayon pool

mod math;
mod types;
mod error;
mod camera;
mod transform;
mod clip;
mod raster;
mod shading;
mod blend;
mod framebuffer;
mod gbuffer;
mod render;

pub use math::*;
pub use types::*;
pub use error::*;
pub use camera::*;
pub use transform::*;
pub use clip::*;
pub use raster::*;
pub use shading::*;
pub use blend::*;
pub use framebuffer::*;
pub use gbuffer::*;
pub use render::*;
