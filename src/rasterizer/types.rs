//! Core types for the rasterizer

use std::ops::{Add, AddAssign, Mul};
use std::path::Path;
use std::sync::Arc;

use serde::{Serialize, Deserialize};

use super::error::RasterError;
use super::math::{Vec2, Vec3};

/// RGBA color, one f32 per channel
///
/// Channels are conventionally in [0,1] but never clamped while shading;
/// clamping happens only when converting to bytes for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const CLEAR: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// From 8-bit channels
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    /// Same color with a different alpha
    pub fn alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Grey level with opaque alpha (used for buffer visualizations)
    pub fn grey(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Convert to [u8; 4], clamping each channel to [0,1]
    pub fn to_bytes(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Linear interpolation across a triangle with barycentric weights
    pub fn weighted(c: [Color; 3], w: [f32; 3]) -> Color {
        c[0] * w[0] + c[1] * w[1] + c[2] * w[2]
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, o: Color) -> Color {
        Color::with_alpha(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, o: Color) {
        *self = *self + o;
    }
}

/// Component-wise product (all four channels)
impl Mul for Color {
    type Output = Color;
    fn mul(self, o: Color) -> Color {
        Color::with_alpha(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color {
        Color::with_alpha(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// Simple texture (array of colors, row 0 is the bottom row, v = 0)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    /// Load texture from an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let img = image::open(path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(&img, name))
    }

    fn from_image(img: &image::DynamicImage, name: String) -> Self {
        // Flip so that v = 0 lands on the bottom row
        let rgba = image::imageops::flip_vertical(&img.to_rgba8());
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Color> = rgba.pixels().map(|p| Color::from_bytes(p.0)).collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture with `cell`-pixel squares
    pub fn checkerboard(width: usize, height: usize, cell: usize, color1: Color, color2: Color) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Get pixel at x,y coordinates, wrapping out-of-range coordinates
    pub fn get_pixel_wrapped(&self, x: i64, y: i64) -> Color {
        let tx = x.rem_euclid(self.width as i64) as usize;
        let ty = y.rem_euclid(self.height as i64) as usize;
        self.pixels[ty * self.width + tx]
    }

    /// Bilinear sample at UV coordinates in [0,1]², repeating outside
    ///
    /// Texel centers sit at half-integer positions, so u = 0.5/width hits
    /// the first texel exactly.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::WHITE;
        }

        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.get_pixel_wrapped(x0, y0);
        let c10 = self.get_pixel_wrapped(x0 + 1, y0);
        let c01 = self.get_pixel_wrapped(x0, y0 + 1);
        let c11 = self.get_pixel_wrapped(x0 + 1, y0 + 1);

        let bottom = c00 * (1.0 - tx) + c10 * tx;
        let top = c01 * (1.0 - tx) + c11 * tx;
        bottom * (1.0 - ty) + top * ty
    }
}

/// Immutable per-frame mesh snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Either one per vertex or empty (then every UV is (0,0))
    #[serde(default)]
    pub uvs: Vec<Vec2>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// UV of a vertex, (0,0) for meshes without UVs
    pub fn uv(&self, i: usize) -> Vec2 {
        self.uvs.get(i).copied().unwrap_or(Vec2::ZERO)
    }

    /// Triangle `t` as three vertex indices
    pub fn triangle(&self, t: usize) -> [usize; 3] {
        let i = t * 3;
        [
            self.indices[i] as usize,
            self.indices[i + 1] as usize,
            self.indices[i + 2] as usize,
        ]
    }

    /// Check the invariants the pipeline indexes by
    pub fn validate(&self) -> Result<(), RasterError> {
        let n = self.vertices.len();
        if self.normals.len() != n {
            return Err(RasterError::InvalidMesh(format!(
                "{} normals for {} vertices",
                self.normals.len(),
                n
            )));
        }
        if !self.uvs.is_empty() && self.uvs.len() != n {
            return Err(RasterError::InvalidMesh(format!(
                "{} uvs for {} vertices",
                self.uvs.len(),
                n
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RasterError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(RasterError::IndexOutOfRange {
                index: bad as usize,
                len: n,
                what: "mesh vertices",
            });
        }
        Ok(())
    }
}

/// Surface material
#[derive(Debug, Clone)]
pub struct Material {
    pub diffuse: Color,
    pub specular: Color,
    /// Specular exponent scale (>= 0)
    pub shininess: f32,
    pub texture: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            shininess: 0.01,
            texture: None,
        }
    }
}

impl Material {
    pub fn new(diffuse: Color, specular: Color, shininess: f32) -> Self {
        Self { diffuse, specular, shininess, texture: None }
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Diffuse color at a UV, modulated by the texture when there is one
    pub fn diffuse_at(&self, uv: Vec2) -> Color {
        match &self.texture {
            Some(tex) => self.diffuse * tex.sample_bilinear(uv.x, uv.y),
            None => self.diffuse,
        }
    }
}

/// Kind of light source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Infinitely far light shining along `forward`
    Directional { forward: Vec3 },
    /// Omni light with a hard cutoff at `range`
    Point { position: Vec3, range: f32 },
}

/// A light source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn directional(forward: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { forward: forward.normalize() },
            color,
            intensity,
        }
    }

    pub fn point(position: Vec3, range: f32, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { position, range },
            color,
            intensity,
        }
    }

    /// Color times intensity
    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quad_mesh() -> Mesh {
        Mesh {
            vertices: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::UP],
            normals: vec![Vec3::FORWARD; 3],
            uvs: vec![],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_color_to_bytes_clamps() {
        let c = Color::with_alpha(2.0, -1.0, 0.5, 1.0);
        assert_eq!(c.to_bytes(), [255, 0, 128, 255]);
    }

    #[test]
    fn test_bilinear_texel_center_is_exact() {
        let tex = Texture::checkerboard(2, 2, 1, Color::WHITE, Color::BLACK);
        let c = tex.sample_bilinear(0.25, 0.25);
        assert_eq!(c, Color::WHITE);
        let c = tex.sample_bilinear(0.75, 0.25);
        assert_eq!(c, Color::BLACK);
    }

    #[test]
    fn test_bilinear_blends_between_texels() {
        let tex = Texture::checkerboard(2, 2, 1, Color::WHITE, Color::BLACK);
        let c = tex.sample_bilinear(0.5, 0.25);
        assert_abs_diff_eq!(c.r, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_material_without_texture_uses_flat_diffuse() {
        let m = Material::new(Color::RED, Color::WHITE, 0.5);
        assert_eq!(m.diffuse_at(Vec2::new(0.3, 0.7)), Color::RED);
    }

    #[test]
    fn test_mesh_validate() {
        assert!(quad_mesh().validate().is_ok());

        let mut bad = quad_mesh();
        bad.indices[2] = 7;
        assert!(matches!(
            bad.validate(),
            Err(RasterError::IndexOutOfRange { index: 7, len: 3, .. })
        ));

        let mut bad = quad_mesh();
        bad.normals.pop();
        assert!(matches!(bad.validate(), Err(RasterError::InvalidMesh(_))));

        let mut bad = quad_mesh();
        bad.indices.push(0);
        assert!(matches!(bad.validate(), Err(RasterError::InvalidMesh(_))));
    }
}
