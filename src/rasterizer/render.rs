//! Frame rendering
//!
//! [`Renderer`] owns the color/depth buffers and the G-buffer and runs one
//! frame of the selected [`RenderPath`] over a [`Scene`].
//!
//! Triangle paths work in two stages. `prepare` transforms every object,
//! rejects triangles (behind the eye, off screen, back-facing, degenerate)
//! and collects the survivors in draw order. The fill stage then splits the
//! target buffer into row bands and rasterizes every prepared triangle into
//! every band, so each band is written by exactly one worker and the result
//! does not depend on how many bands run at once.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::config::RenderConfig;
use crate::scene::{Scene, SceneObject};

use super::camera::Camera;
use super::clip::{behind_camera, in_view_volume, is_back_facing, to_screen, triangle_visible};
use super::error::RasterError;
use super::framebuffer::{FrameBuffer, FrameTile};
use super::gbuffer::{GBuffer, GBufferTile};
use super::math::{Vec2, Vec3, Vec4};
use super::raster::{draw_segment, fill_triangle, point_pixel, TriangleSetup};
use super::shading::{shade_pixel, shade_vertex, LightingEnv, SurfaceSample};
use super::transform::{
    model_to_view, model_to_world, project_vertices, transform_directions, transform_points,
    ObjectMatrices,
};
use super::types::{Color, Material};

/// Which pipeline variant draws the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderPath {
    /// Every visible vertex as one pixel
    PointCloud,
    /// Triangle edges
    Wireframe,
    /// Fixed corner colors blended across each triangle
    Unlit,
    /// Lighting evaluated per vertex and interpolated
    VertexLit,
    /// Lighting evaluated per pixel while rasterizing
    Forward,
    /// G-buffer geometry pass, then one shading pass over the screen
    Deferred,
}

impl RenderPath {
    pub const ALL: [RenderPath; 6] = [
        RenderPath::PointCloud,
        RenderPath::Wireframe,
        RenderPath::Unlit,
        RenderPath::VertexLit,
        RenderPath::Forward,
        RenderPath::Deferred,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderPath::PointCloud => "point cloud",
            RenderPath::Wireframe => "wireframe",
            RenderPath::Unlit => "unlit",
            RenderPath::VertexLit => "vertex lit",
            RenderPath::Forward => "forward",
            RenderPath::Deferred => "deferred",
        }
    }

    /// Whether back-face culling applies to this path
    pub fn culls(self) -> bool {
        matches!(self, RenderPath::Forward | RenderPath::Deferred)
    }
}

/// Counters for one rendered frame
///
/// The point-cloud path counts `offscreen` per vertex instead of per
/// triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Objects drawn (invalid meshes are not counted)
    pub objects: usize,
    /// Triangles submitted
    pub triangles: usize,
    pub offscreen: usize,
    pub backfacing: usize,
    pub behind_camera: usize,
    pub degenerate: usize,
    /// Pixels written
    pub fragments: usize,
    pub elapsed: Duration,
}

/// Object vertices in world and clip space
struct ObjectGeometry {
    world: Vec<Vec3>,
    normals: Vec<Vec3>,
    clip: Vec<Vec4>,
}

/// Transform an object's mesh, or `None` (with a warning) if it is invalid
fn object_geometry(object: &SceneObject, camera: &Camera) -> Result<Option<ObjectGeometry>, RasterError> {
    if let Err(e) = object.mesh.validate() {
        warn!("skipping object '{}': {}", object.name, e);
        return Ok(None);
    }
    let m = ObjectMatrices::new(&object.chain, camera)?;
    Ok(Some(ObjectGeometry {
        world: transform_points(&object.mesh.vertices, &m.model_to_world),
        normals: transform_directions(&object.mesh.normals, &m.model_to_world),
        clip: project_vertices(&object.mesh.vertices, &m.model_to_view, &m.projection),
    }))
}

/// View-space depth of an object's origin (more negative is farther)
fn view_depth(object: &SceneObject, camera: &Camera) -> f32 {
    let m = model_to_view(&model_to_world(&object.chain), &camera.world_to_camera);
    m.multiply_point3x4(Vec3::ZERO).z
}

#[inline]
fn lerp3(v: [Vec3; 3], w: [f32; 3]) -> Vec3 {
    v[0] * w[0] + v[1] * w[1] + v[2] * w[2]
}

/// A triangle that passed every reject test, ready to fill
struct PreparedTriangle<'a> {
    setup: TriangleSetup,
    world: [Vec3; 3],
    normals: [Vec3; 3],
    uvs: [Vec2; 3],
    /// Corner colors (unlit and vertex-lit paths)
    colors: [Color; 3],
    material: &'a Material,
    transparent: bool,
}

impl<'a> PreparedTriangle<'a> {
    /// Interpolated surface at barycentric weights `w`
    fn surface(&self, w: [f32; 3]) -> SurfaceSample {
        let uv = self.uvs[0] * w[0] + self.uvs[1] * w[1] + self.uvs[2] * w[2];
        SurfaceSample {
            position: lerp3(self.world, w),
            normal: lerp3(self.normals, w),
            diffuse: self.material.diffuse_at(uv),
            specular: self.material.specular,
            shininess: self.material.shininess,
        }
    }
}

/// Software renderer: buffers plus configuration
pub struct Renderer {
    config: RenderConfig,
    frame: FrameBuffer,
    gbuffer: GBuffer,
}

impl Renderer {
    /// Allocate buffers for a validated config
    pub fn new(config: RenderConfig) -> Result<Self, RasterError> {
        config.validate()?;
        Ok(Self {
            frame: FrameBuffer::new(config.width, config.height),
            gbuffer: GBuffer::new(config.width, config.height),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Last rendered frame
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// G-buffer of the last deferred frame
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn path(&self) -> RenderPath {
        self.config.path
    }

    pub fn set_path(&mut self, path: RenderPath) {
        self.config.path = path;
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.config.parallel = parallel;
    }

    /// Change the resolution, reallocating every buffer
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), RasterError> {
        let config = RenderConfig { width, height, ..self.config.clone() };
        config.validate()?;
        self.config = config;
        self.frame.resize(width, height);
        self.gbuffer.resize(width, height);
        Ok(())
    }

    /// Render one frame of `scene` with the configured path
    ///
    /// Fails only on an invalid camera; bad meshes and degenerate triangles
    /// are dropped and counted.
    pub fn render(&mut self, scene: &Scene) -> Result<FrameStats, RasterError> {
        let start = Instant::now();
        scene.camera.validate()?;

        let mut stats = FrameStats::default();
        let order = self.draw_order(scene);
        let env = LightingEnv {
            lights: &scene.lights,
            ambient: scene.ambient,
            camera_position: scene.camera.position,
        };

        self.frame.clear(scene.clear_color);

        match self.config.path {
            RenderPath::PointCloud => self.draw_points(scene, &order, &mut stats)?,
            RenderPath::Wireframe => self.draw_wireframe(scene, &order, &mut stats)?,
            RenderPath::Unlit | RenderPath::VertexLit | RenderPath::Forward => {
                let tris = self.prepare(scene, &order, &env, &mut stats)?;
                stats.fragments = self.fill_frame(&tris, &env);
            }
            RenderPath::Deferred => {
                let transparent = order.iter().filter(|o| o.transparent).count();
                if transparent > 0 {
                    debug!("deferred path draws {} transparent objects as opaque", transparent);
                }
                let tris = self.prepare(scene, &order, &env, &mut stats)?;
                stats.fragments = self.fill_gbuffer(&tris);
                self.gbuffer.shade_into(
                    &mut self.frame,
                    &env,
                    self.config.pixel_specular,
                    scene.clear_color,
                    self.config.parallel,
                );
            }
        }

        stats.elapsed = start.elapsed();
        debug!(
            "{} frame: {} objects, {} triangles ({} offscreen, {} back-facing, {} behind camera, {} degenerate), {} fragments in {:?}",
            self.config.path.name(),
            stats.objects,
            stats.triangles,
            stats.offscreen,
            stats.backfacing,
            stats.behind_camera,
            stats.degenerate,
            stats.fragments,
            stats.elapsed,
        );
        Ok(stats)
    }

    /// Forward draws opaque objects first and then transparent ones
    /// far-to-near; everything else keeps submission order.
    fn draw_order<'s>(&self, scene: &'s Scene) -> Vec<&'s SceneObject> {
        if self.config.path != RenderPath::Forward || !self.config.sort_transparent {
            return scene.objects.iter().collect();
        }

        let (mut order, mut transparent): (Vec<_>, Vec<_>) =
            scene.objects.iter().partition(|o| !o.transparent);
        transparent.sort_by(|a, b| {
            view_depth(a, &scene.camera).total_cmp(&view_depth(b, &scene.camera))
        });
        order.extend(transparent);
        order
    }

    // ========================================================================
    // Point cloud and wireframe (serial, no depth test)
    // ========================================================================

    fn draw_points(
        &mut self,
        scene: &Scene,
        order: &[&SceneObject],
        stats: &mut FrameStats,
    ) -> Result<(), RasterError> {
        let (width, height) = (self.config.width, self.config.height);
        let color = self.config.point_color;

        for object in order {
            let Some(geo) = object_geometry(object, &scene.camera)? else {
                continue;
            };
            stats.objects += 1;

            for &v in &geo.clip {
                if !(v.w > 0.0) || !in_view_volume(v) {
                    stats.offscreen += 1;
                    continue;
                }
                let s = to_screen(v, width, height);
                if let Some((x, y)) = point_pixel(s.x, s.y, width, height) {
                    self.frame.set_pixel(x, y, color);
                    stats.fragments += 1;
                }
            }
        }
        Ok(())
    }

    fn draw_wireframe(
        &mut self,
        scene: &Scene,
        order: &[&SceneObject],
        stats: &mut FrameStats,
    ) -> Result<(), RasterError> {
        let (width, height) = (self.config.width, self.config.height);
        let color = self.config.wire_color;
        let frame = &mut self.frame;

        for object in order {
            let Some(geo) = object_geometry(object, &scene.camera)? else {
                continue;
            };
            stats.objects += 1;

            for t in 0..object.mesh.triangle_count() {
                let idx = object.mesh.triangle(t);
                let clip = idx.map(|i| geo.clip[i]);
                stats.triangles += 1;
                if behind_camera(clip) {
                    stats.behind_camera += 1;
                    continue;
                }
                if !triangle_visible(clip) {
                    stats.offscreen += 1;
                    continue;
                }

                let s = clip.map(|v| to_screen(v, width, height));
                for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                    draw_segment(
                        Vec2::new(s[a].x, s[a].y),
                        Vec2::new(s[b].x, s[b].y),
                        width,
                        height,
                        |x, y| {
                            frame.set_pixel(x, y, color);
                            stats.fragments += 1;
                        },
                    );
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Triangle paths
    // ========================================================================

    fn prepare<'s>(
        &self,
        scene: &'s Scene,
        order: &[&'s SceneObject],
        env: &LightingEnv,
        stats: &mut FrameStats,
    ) -> Result<Vec<PreparedTriangle<'s>>, RasterError> {
        let path = self.config.path;
        let cull = self.config.backface_cull && path.culls();
        let (width, height) = (self.config.width, self.config.height);
        let mut tris = Vec::new();

        for &object in order {
            let Some(geo) = object_geometry(object, &scene.camera)? else {
                continue;
            };
            stats.objects += 1;

            let material = &object.material;
            let vertex_colors = if path == RenderPath::VertexLit {
                shade_vertex(
                    env,
                    &geo.world,
                    &geo.normals,
                    material.diffuse,
                    material.specular,
                    material.shininess,
                    self.config.vertex_specular,
                )
            } else {
                Vec::new()
            };

            for t in 0..object.mesh.triangle_count() {
                let idx = object.mesh.triangle(t);
                let clip = idx.map(|i| geo.clip[i]);
                stats.triangles += 1;

                if behind_camera(clip) {
                    stats.behind_camera += 1;
                    continue;
                }
                if !triangle_visible(clip) {
                    stats.offscreen += 1;
                    continue;
                }
                if cull && is_back_facing(clip, scene.camera.position) {
                    stats.backfacing += 1;
                    continue;
                }

                let setup = match TriangleSetup::new(clip.map(|v| to_screen(v, width, height))) {
                    Ok(setup) => setup,
                    Err(e) => {
                        trace!("dropping triangle {} of '{}': {}", t, object.name, e);
                        stats.degenerate += 1;
                        continue;
                    }
                };

                let colors = match path {
                    RenderPath::Unlit => self.config.unlit_colors,
                    RenderPath::VertexLit => idx.map(|i| vertex_colors[i]),
                    _ => [Color::WHITE; 3],
                };

                tris.push(PreparedTriangle {
                    setup,
                    world: idx.map(|i| geo.world[i]),
                    normals: idx.map(|i| geo.normals[i]),
                    uvs: idx.map(|i| object.mesh.uv(i)),
                    colors,
                    material,
                    transparent: object.transparent,
                });
            }
        }

        Ok(tris)
    }

    /// Depth-tested fill straight into the framebuffer
    fn fill_frame(&mut self, tris: &[PreparedTriangle], env: &LightingEnv) -> usize {
        let path = self.config.path;
        let blend = self.config.blend;
        let model = self.config.pixel_specular;

        let fill_tile = |mut tile: FrameTile| -> usize {
            let band = tile.rect.clone();
            let mut written = 0;
            for tri in tris {
                written += fill_triangle(&tri.setup, &band, |x, y, w, z| {
                    if !tile.depth_passes(x, y, z) {
                        return false;
                    }
                    let color = match path {
                        RenderPath::Forward => {
                            let src = shade_pixel(env, &tri.surface(w), model);
                            if tri.transparent {
                                blend.blend(src, tile.color(x, y))
                            } else {
                                src
                            }
                        }
                        _ => Color::weighted(tri.colors, w),
                    };
                    tile.write(x, y, z, color);
                    true
                });
            }
            written
        };

        let tiles = self.frame.tiles_mut(self.config.tile_rows);
        if self.config.parallel {
            tiles.into_par_iter().map(fill_tile).sum()
        } else {
            tiles.into_iter().map(fill_tile).sum()
        }
    }

    /// Geometry pass of the deferred path
    fn fill_gbuffer(&mut self, tris: &[PreparedTriangle]) -> usize {
        self.gbuffer.clear();

        let fill_tile = |mut tile: GBufferTile| -> usize {
            let band = tile.rect.clone();
            let mut written = 0;
            for tri in tris {
                written += fill_triangle(&tri.setup, &band, |x, y, w, z| {
                    tile.write(x, y, z, &tri.surface(w))
                });
            }
            written
        };

        let tiles = self.gbuffer.tiles_mut(self.config.tile_rows);
        if self.config.parallel {
            tiles.into_par_iter().map(fill_tile).sum()
        } else {
            tiles.into_iter().map(fill_tile).sum()
        }
    }
}
