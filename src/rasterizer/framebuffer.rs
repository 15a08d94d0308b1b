//! Color and depth buffers
//!
//! Both buffers are flat, row-major and indexed as `x + y * width`, with
//! row 0 the bottom scanline. The renderer hands out disjoint row bands
//! ([`FrameTile`]) so triangles can be rasterized into several bands at
//! once without any synchronization on the depth compare-and-write.

use image::{Rgba, RgbaImage};

use super::raster::PixelRect;
use super::types::Color;

/// Software framebuffer: RGBA color plus depth
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![Color::CLEAR; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate for a new resolution; a no-op if the size is unchanged
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        *self = Self::new(width, height);
    }

    /// Fill color with `color` and reset depth to +inf
    pub fn clear(&mut self, color: Color) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.color[self.index(x, y)]
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Read-only view of the color buffer
    pub fn colors(&self) -> &[Color] {
        &self.color
    }

    /// Read-only view of the depth buffer
    pub fn depths(&self) -> &[f32] {
        &self.depth
    }

    pub(crate) fn colors_mut(&mut self) -> &mut [Color] {
        &mut self.color
    }

    pub(crate) fn depths_mut(&mut self) -> &mut [f32] {
        &mut self.depth
    }

    /// Write without a depth test (points and lines)
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.color[idx] = color;
        }
    }

    /// Split into bands of `rows` scanlines, bottom band first
    pub fn tiles_mut(&mut self, rows: usize) -> Vec<FrameTile<'_>> {
        let width = self.width;
        let rows = rows.min(self.height).max(1);
        let chunk = (rows * width).max(1);

        self.color
            .chunks_mut(chunk)
            .zip(self.depth.chunks_mut(chunk))
            .enumerate()
            .map(|(i, (color, depth))| {
                let y0 = i * rows;
                let y1 = y0 + color.len() / width.max(1);
                FrameTile {
                    rect: PixelRect::new(0..width, y0..y1),
                    width,
                    color,
                    depth,
                }
            })
            .collect()
    }

    /// Final color image, top row first
    pub fn to_image(&self) -> RgbaImage {
        buffer_image(self.width, self.height, |i| self.color[i].to_bytes())
    }

    /// Depth as `1 - depth` grayscale; uncovered pixels come out black
    pub fn depth_image(&self) -> RgbaImage {
        buffer_image(self.width, self.height, |i| Color::grey(1.0 - self.depth[i]).to_bytes())
    }
}

/// Exclusive view of a horizontal band of the framebuffer
pub struct FrameTile<'a> {
    /// Pixels covered by this band, in framebuffer coordinates
    pub rect: PixelRect,
    width: usize,
    color: &'a mut [Color],
    depth: &'a mut [f32],
}

impl<'a> FrameTile<'a> {
    #[inline]
    fn local(&self, x: usize, y: usize) -> usize {
        x + (y - self.rect.y.start) * self.width
    }

    /// Current color at framebuffer coordinates (x, y)
    #[inline]
    pub fn color(&self, x: usize, y: usize) -> Color {
        self.color[self.local(x, y)]
    }

    /// Strict less-than: equal depth does not pass
    #[inline]
    pub fn depth_passes(&self, x: usize, y: usize, z: f32) -> bool {
        z < self.depth[self.local(x, y)]
    }

    /// Unconditional color and depth write
    #[inline]
    pub fn write(&mut self, x: usize, y: usize, z: f32, color: Color) {
        let idx = self.local(x, y);
        self.depth[idx] = z;
        self.color[idx] = color;
    }
}

/// Encode a bottom-up row-major buffer as an image, flipping rows
pub(crate) fn buffer_image<F>(width: usize, height: usize, texel: F) -> RgbaImage
where
    F: Fn(usize) -> [u8; 4],
{
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let row = height - 1 - y as usize;
        Rgba(texel(x as usize + row * width))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Depth-tested write through a single band covering the whole buffer
    fn write_depth(fb: &mut FrameBuffer, x: usize, y: usize, z: f32, color: Color) -> bool {
        let height = fb.height();
        let mut tiles = fb.tiles_mut(height);
        let tile = &mut tiles[0];
        if tile.depth_passes(x, y, z) {
            tile.write(x, y, z, color);
            true
        } else {
            false
        }
    }

    #[test]
    fn test_clear_resets_depth() {
        let mut fb = FrameBuffer::new(4, 3);
        write_depth(&mut fb, 1, 1, 0.5, Color::RED);
        fb.clear(Color::BLUE);
        assert_eq!(fb.pixel(1, 1), Color::BLUE);
        assert_eq!(fb.depth_at(1, 1), f32::INFINITY);
        assert_eq!(fb.colors().len(), 12);
    }

    #[test]
    fn test_depth_tie_does_not_overwrite() {
        let mut fb = FrameBuffer::new(2, 2);
        assert!(write_depth(&mut fb, 0, 0, 0.3, Color::RED));
        assert!(!write_depth(&mut fb, 0, 0, 0.3, Color::GREEN));
        assert_eq!(fb.pixel(0, 0), Color::RED);
        assert!(write_depth(&mut fb, 0, 0, 0.2, Color::GREEN));
        assert_eq!(fb.pixel(0, 0), Color::GREEN);
    }

    #[test]
    fn test_out_of_bounds_writes_are_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set_pixel(2, 0, Color::RED);
        fb.set_pixel(0, 5, Color::RED);
        assert!(fb.colors().iter().all(|&c| c == Color::CLEAR));
    }

    #[test]
    fn test_tiles_partition_the_rows() {
        let mut fb = FrameBuffer::new(5, 7);
        let tiles = fb.tiles_mut(3);
        let spans: Vec<_> = tiles.iter().map(|t| t.rect.y.clone()).collect();
        assert_eq!(spans, vec![0..3, 3..6, 6..7]);
        assert!(tiles.iter().all(|t| t.rect.x == (0..5)));
    }

    #[test]
    fn test_oversized_band_covers_the_whole_buffer() {
        let mut fb = FrameBuffer::new(5, 7);
        let tiles = fb.tiles_mut(usize::MAX);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].rect, PixelRect::new(0..5, 0..7));
    }

    #[test]
    fn test_tile_writes_land_in_the_buffer() {
        let mut fb = FrameBuffer::new(4, 4);
        for mut tile in fb.tiles_mut(2) {
            let y = tile.rect.y.start + 1;
            if tile.depth_passes(2, y, 0.1) {
                tile.write(2, y, 0.1, Color::GREEN);
            }
        }
        assert_eq!(fb.pixel(2, 1), Color::GREEN);
        assert_eq!(fb.pixel(2, 3), Color::GREEN);
        assert_eq!(fb.depth_at(2, 3), 0.1);
        assert_eq!(fb.pixel(2, 2), Color::CLEAR);
    }

    #[test]
    fn test_image_rows_are_flipped() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear(Color::BLACK);
        fb.set_pixel(0, 0, Color::RED);
        let img = fb.to_image();
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_depth_image_encoding() {
        let mut fb = FrameBuffer::new(1, 1);
        write_depth(&mut fb, 0, 0, 0.25, Color::WHITE);
        let img = fb.depth_image();
        assert_eq!(img.get_pixel(0, 0).0[0], 191);
    }

    #[test]
    fn test_resize_reallocates() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.resize(3, 5);
        assert_eq!((fb.width(), fb.height()), (3, 5));
        assert_eq!(fb.depths().len(), 15);
    }
}
