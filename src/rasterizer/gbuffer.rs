//! Deferred shading G-buffer
//!
//! The geometry pass stores one surface per pixel (the nearest one) and the
//! shading pass lights every covered pixel exactly once afterwards.
//!
//! Layout, five parallel arrays the size of the framebuffer:
//! - diffuse: RGBA after texture modulation
//! - specular: RGB, shininess in alpha
//! - normal / position: world space
//! - depth: projected z, +inf where nothing was drawn

use rayon::prelude::*;

use super::framebuffer::{buffer_image, FrameBuffer};
use super::math::Vec3;
use super::raster::PixelRect;
use super::shading::{shade_pixel, LightingEnv, SpecularModel, SurfaceSample};
use super::types::Color;

/// Cleared value of the diffuse and specular buffers
pub const SURFACE_CLEAR: Color = Color::with_alpha(1.0, 1.0, 1.0, 0.0);

#[derive(Debug, Clone)]
pub struct GBuffer {
    width: usize,
    height: usize,
    diffuse: Vec<Color>,
    specular: Vec<Color>,
    normal: Vec<Vec3>,
    position: Vec<Vec3>,
    depth: Vec<f32>,
}

impl GBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            diffuse: vec![SURFACE_CLEAR; n],
            specular: vec![SURFACE_CLEAR; n],
            normal: vec![Vec3::ZERO; n],
            position: vec![Vec3::ZERO; n],
            depth: vec![f32::INFINITY; n],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self) {
        self.diffuse.fill(SURFACE_CLEAR);
        self.specular.fill(SURFACE_CLEAR);
        self.normal.fill(Vec3::ZERO);
        self.position.fill(Vec3::ZERO);
        self.depth.fill(f32::INFINITY);
    }

    pub fn depths(&self) -> &[f32] {
        &self.depth
    }

    /// Stored surface at a buffer index, `None` if nothing covered it
    pub fn surface(&self, i: usize) -> Option<SurfaceSample> {
        if !(self.depth[i] < f32::INFINITY) {
            return None;
        }
        let spec = self.specular[i];
        Some(SurfaceSample {
            position: self.position[i],
            normal: self.normal[i],
            diffuse: self.diffuse[i],
            specular: Color::new(spec.r, spec.g, spec.b),
            shininess: spec.a,
        })
    }

    /// Split into bands of `rows` scanlines, like [`FrameBuffer::tiles_mut`]
    pub fn tiles_mut(&mut self, rows: usize) -> Vec<GBufferTile<'_>> {
        let width = self.width;
        let rows = rows.min(self.height).max(1);
        let chunk = (rows * width).max(1);

        self.diffuse
            .chunks_mut(chunk)
            .zip(self.specular.chunks_mut(chunk))
            .zip(self.normal.chunks_mut(chunk))
            .zip(self.position.chunks_mut(chunk))
            .zip(self.depth.chunks_mut(chunk))
            .enumerate()
            .map(|(i, ((((diffuse, specular), normal), position), depth))| {
                let y0 = i * rows;
                let y1 = y0 + depth.len() / width.max(1);
                GBufferTile {
                    rect: PixelRect::new(0..width, y0..y1),
                    width,
                    diffuse,
                    specular,
                    normal,
                    position,
                    depth,
                }
            })
            .collect()
    }

    /// Shading pass: light every covered pixel into `frame`
    ///
    /// Uncovered pixels get `clear`. The G-buffer depth is copied into the
    /// frame's depth buffer so both paths expose the same depth image.
    pub fn shade_into(
        &self,
        frame: &mut FrameBuffer,
        env: &LightingEnv,
        model: SpecularModel,
        clear: Color,
        parallel: bool,
    ) {
        let shade_one = |(i, out): (usize, &mut Color)| {
            *out = match self.surface(i) {
                Some(s) => shade_pixel(env, &s, model),
                None => clear,
            };
        };

        if parallel {
            frame.colors_mut().par_iter_mut().enumerate().for_each(shade_one);
        } else {
            frame.colors_mut().iter_mut().enumerate().for_each(shade_one);
        }
        frame.depths_mut().copy_from_slice(&self.depth);
    }

    // ========================================================================
    // Debug visualizations
    // ========================================================================

    pub fn diffuse_image(&self) -> image::RgbaImage {
        buffer_image(self.width, self.height, |i| self.diffuse[i].to_bytes())
    }

    /// Specular color with alpha forced opaque (alpha holds shininess)
    pub fn specular_image(&self) -> image::RgbaImage {
        buffer_image(self.width, self.height, |i| self.specular[i].alpha(1.0).to_bytes())
    }

    pub fn normal_image(&self) -> image::RgbaImage {
        buffer_image(self.width, self.height, |i| encode_vector(self.normal[i]).to_bytes())
    }

    pub fn position_image(&self) -> image::RgbaImage {
        buffer_image(self.width, self.height, |i| encode_vector(self.position[i]).to_bytes())
    }

    pub fn depth_image(&self) -> image::RgbaImage {
        buffer_image(self.width, self.height, |i| Color::grey(1.0 - self.depth[i]).to_bytes())
    }
}

/// (v + 1) / 2 per channel
fn encode_vector(v: Vec3) -> Color {
    Color::new((v.x + 1.0) / 2.0, (v.y + 1.0) / 2.0, (v.z + 1.0) / 2.0)
}

/// Exclusive view of a horizontal band of the G-buffer
pub struct GBufferTile<'a> {
    pub rect: PixelRect,
    width: usize,
    diffuse: &'a mut [Color],
    specular: &'a mut [Color],
    normal: &'a mut [Vec3],
    position: &'a mut [Vec3],
    depth: &'a mut [f32],
}

impl<'a> GBufferTile<'a> {
    /// Depth-tested geometry write; returns whether the pixel was written
    pub fn write(&mut self, x: usize, y: usize, z: f32, s: &SurfaceSample) -> bool {
        let idx = x + (y - self.rect.y.start) * self.width;
        if !(z < self.depth[idx]) {
            return false;
        }
        self.depth[idx] = z;
        self.diffuse[idx] = s.diffuse;
        self.specular[idx] = s.specular.alpha(s.shininess);
        self.normal[idx] = s.normal;
        self.position[idx] = s.position;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::Light;

    fn surface() -> SurfaceSample {
        SurfaceSample {
            position: Vec3::new(0.0, 0.0, -5.0),
            normal: Vec3::FORWARD,
            diffuse: Color::new(0.2, 0.6, 0.4),
            specular: Color::new(0.5, 0.5, 0.5),
            shininess: 0.25,
        }
    }

    #[test]
    fn test_clear_defaults() {
        let g = GBuffer::new(3, 2);
        assert!(g.depths().iter().all(|d| *d == f32::INFINITY));
        assert_eq!(g.surface(0), None);
        assert_eq!(g.diffuse_image().get_pixel(0, 0).0, [255, 255, 255, 0]);
    }

    #[test]
    fn test_write_packs_shininess_in_specular_alpha() {
        let mut g = GBuffer::new(2, 2);
        for mut tile in g.tiles_mut(1) {
            if tile.rect.y.contains(&1) {
                assert!(tile.write(1, 1, 0.5, &surface()));
                assert!(!tile.write(1, 1, 0.5, &surface()));
            }
        }
        let s = g.surface(3).unwrap();
        assert_eq!(s.shininess, 0.25);
        assert_eq!(s.specular, Color::new(0.5, 0.5, 0.5));
        assert_eq!(s.diffuse, surface().diffuse);
        assert_eq!(g.specular_image().get_pixel(1, 0).0[3], 255);
    }

    #[test]
    fn test_oversized_band_covers_the_whole_buffer() {
        let mut g = GBuffer::new(3, 4);
        let tiles = g.tiles_mut(usize::MAX);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].rect, PixelRect::new(0..3, 0..4));
    }

    #[test]
    fn test_shading_pass_matches_direct_shading() {
        let lights = [Light::directional(Vec3::new(0.3, -0.2, -1.0), Color::WHITE, 1.0)];
        let env = LightingEnv {
            lights: &lights,
            ambient: Color::new(0.1, 0.1, 0.1),
            camera_position: Vec3::ZERO,
        };
        let mut g = GBuffer::new(2, 1);
        for mut tile in g.tiles_mut(4) {
            tile.write(0, 0, 0.5, &surface());
        }

        for parallel in [false, true] {
            let mut fb = FrameBuffer::new(2, 1);
            g.shade_into(&mut fb, &env, SpecularModel::BlinnHalfVector, Color::BLUE, parallel);
            assert_eq!(fb.pixel(0, 0), shade_pixel(&env, &surface(), SpecularModel::BlinnHalfVector));
            assert_eq!(fb.pixel(1, 0), Color::BLUE);
            assert_eq!(fb.depth_at(0, 0), 0.5);
        }
    }

    #[test]
    fn test_vector_encoding() {
        assert_eq!(encode_vector(Vec3::new(-1.0, 0.0, 1.0)), Color::new(0.0, 0.5, 1.0));
    }
}
