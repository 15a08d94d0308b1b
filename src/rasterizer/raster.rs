//! Triangle, line and point rasterization
//!
//! Scan conversion only: these functions decide *which* pixels a primitive
//! covers and with what barycentric weights. What happens at a covered
//! pixel (depth test, shading, G-buffer write) is the caller's closure.

use std::ops::Range;

use super::error::RasterError;
use super::math::{Vec2, Vec4};

/// Below this screen-space area (in pixels², times two) a triangle is
/// treated as degenerate.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Integer pixel box, half-open on both axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRect {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl PixelRect {
    pub fn new(x: Range<usize>, y: Range<usize>) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

/// Screen-space triangle prepared for barycentric evaluation
#[derive(Debug, Clone, Copy)]
pub struct TriangleSetup {
    /// Vertices in (pixel x, pixel y, projected z, clip w)
    pub v: [Vec4; 3],
    denom: f32,
}

impl TriangleSetup {
    /// Precompute the barycentric denominator; zero-area triangles fail
    pub fn new(v: [Vec4; 3]) -> Result<Self, RasterError> {
        let [v1, v2, v3] = v;
        let denom = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
        if !denom.is_finite() || denom.abs() < DEGENERATE_EPSILON {
            return Err(RasterError::DegenerateGeometry);
        }
        Ok(Self { v, denom })
    }

    /// Barycentric weights of sample point (px, py)
    #[inline]
    pub fn weights(&self, px: f32, py: f32) -> [f32; 3] {
        let [v1, v2, v3] = self.v;
        let w1 = ((v2.y - v3.y) * (px - v3.x) + (v3.x - v2.x) * (py - v3.y)) / self.denom;
        let w2 = ((v3.y - v1.y) * (px - v3.x) + (v1.x - v3.x) * (py - v3.y)) / self.denom;
        [w1, w2, 1.0 - w1 - w2]
    }

    /// Linearly interpolated projected depth
    #[inline]
    pub fn depth(&self, w: [f32; 3]) -> f32 {
        w[0] * self.v[0].z + w[1] * self.v[1].z + w[2] * self.v[2].z
    }

    /// floor(min)..=ceil(max) of the vertices, clamped to `clip`
    pub fn bounds(&self, clip: &PixelRect) -> PixelRect {
        let xs = self.v.map(|p| p.x);
        let ys = self.v.map(|p| p.y);
        let min_x = xs[0].min(xs[1]).min(xs[2]).floor();
        let max_x = xs[0].max(xs[1]).max(xs[2]).ceil();
        let min_y = ys[0].min(ys[1]).min(ys[2]).floor();
        let max_y = ys[0].max(ys[1]).max(ys[2]).ceil();

        PixelRect::new(
            clamp_span(min_x, max_x, &clip.x),
            clamp_span(min_y, max_y, &clip.y),
        )
    }
}

/// Inclusive float span [lo, hi] intersected with a half-open pixel range
fn clamp_span(lo: f32, hi: f32, clip: &Range<usize>) -> Range<usize> {
    if hi < clip.start as f32 || lo >= clip.end as f32 {
        return clip.start..clip.start;
    }
    let start = (lo.max(clip.start as f32) as usize).max(clip.start);
    let end = ((hi + 1.0).min(clip.end as f32) as usize).min(clip.end);
    start..end.max(start)
}

/// Walk every pixel of the triangle inside `clip`
///
/// Pixels on an edge (a weight of exactly zero) count as inside, so pixels
/// on a shared edge are visited by both triangles. `fragment` receives the
/// pixel coordinates, the weights and the interpolated depth; it returns
/// whether it wrote anything, and the total is returned.
pub fn fill_triangle<F>(tri: &TriangleSetup, clip: &PixelRect, mut fragment: F) -> usize
where
    F: FnMut(usize, usize, [f32; 3], f32) -> bool,
{
    let bounds = tri.bounds(clip);
    let mut written = 0;

    for y in bounds.y.clone() {
        for x in bounds.x.clone() {
            let w = tri.weights(x as f32, y as f32);
            if w[0] >= 0.0 && w[1] >= 0.0 && w[2] >= 0.0 && fragment(x, y, w, tri.depth(w)) {
                written += 1;
            }
        }
    }

    written
}

/// Liang-Barsky clip of the segment a-b to `[0, width] x [0, height]`.
/// `None` when nothing of it is left (or an endpoint is not finite).
pub fn clip_line(a: Vec2, b: Vec2, width: usize, height: usize) -> Option<(Vec2, Vec2)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (w, h) = (width as f32, height as f32);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [(-dx, a.x), (dx, w - a.x), (-dy, a.y), (dy, h - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        Vec2::new(a.x + t0 * dx, a.y + t0 * dy),
        Vec2::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

/// Bresenham line from (x0, y0) to (x1, y1), clipped to `width` x `height`.
/// Callers with float endpoints go through [`clip_line`] first so the walk
/// stays on screen.
pub fn draw_line<F>(x0: i64, y0: i64, x1: i64, y1: i64, width: usize, height: usize, mut plot: F)
where
    F: FnMut(usize, usize),
{
    let (w, h) = (width as i64, height as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = x0;
    let mut y = y0;

    loop {
        if x >= 0 && x < w && y >= 0 && y < h {
            plot(x as usize, y as usize);
        }

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw the screen-space segment a-b: clip in float, then snap both ends to
/// pixels (x = width lands on the last column)
pub fn draw_segment<F>(a: Vec2, b: Vec2, width: usize, height: usize, plot: F)
where
    F: FnMut(usize, usize),
{
    if width == 0 || height == 0 {
        return;
    }
    let Some((a, b)) = clip_line(a, b, width, height) else {
        return;
    };
    let snap = |v: f32, size: usize| (v.floor() as i64).clamp(0, size as i64 - 1);
    draw_line(
        snap(a.x, width),
        snap(a.y, height),
        snap(b.x, width),
        snap(b.y, height),
        width,
        height,
        plot,
    );
}

/// Pixel for a screen-space point, clamped so x = width lands on the last
/// column instead of past it
pub fn point_pixel(x: f32, y: f32, width: usize, height: usize) -> Option<(usize, usize)> {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let px = (x.max(0.0) as usize).min(width - 1);
    let py = (y.max(0.0) as usize).min(height - 1);
    Some((px, py))
}
