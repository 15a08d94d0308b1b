//! Scene files
//!
//! RON descriptions that resolve into a runtime [`Scene`]. Meshes are either
//! built-in primitives or inline arrays; textures are procedural or loaded
//! from image files relative to the scene file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::{primitives, Scene, SceneObject};
use crate::rasterizer::{
    Camera, Color, Light, Material, Mesh, Quat, RasterError, Texture, TransformNode, Vec3,
};

/// Error type for scene loading
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Texture error: {0}")]
    Image(#[from] image::ImageError),
    #[error("object '{name}': {source}")]
    Object { name: String, source: RasterError },
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Where an object's mesh comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeshSource {
    Cube { size: f32 },
    Plane { size: f32 },
    Triangle,
    Inline(Mesh),
}

impl MeshSource {
    pub fn build(&self) -> Mesh {
        match self {
            MeshSource::Cube { size } => primitives::cube(*size),
            MeshSource::Plane { size } => primitives::plane(*size),
            MeshSource::Triangle => primitives::triangle(),
            MeshSource::Inline(mesh) => mesh.clone(),
        }
    }
}

/// Where a diffuse texture comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    Checkerboard { size: usize, cell: usize, a: Color, b: Color },
    /// Image path, relative to the scene file
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
    pub texture: Option<TextureSource>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        let m = Material::default();
        Self {
            diffuse: m.diffuse,
            specular: m.specular,
            shininess: m.shininess,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    pub mesh: MeshSource,
    /// Leaf-to-root
    #[serde(default)]
    pub chain: Vec<TransformNode>,
    #[serde(default)]
    pub material: MaterialDesc,
    #[serde(default)]
    pub transparent: bool,
}

/// Camera placement; the aspect ratio comes from the render resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::UP,
            fov: 60.0,
            near: 0.3,
            far: 100.0,
        }
    }
}

impl CameraDesc {
    pub fn build(&self, aspect: f32) -> Result<Camera, RasterError> {
        Camera::look_at(self.position, self.target, self.up, self.fov, aspect, self.near, self.far)
    }
}

/// Serialized scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDesc {
    pub objects: Vec<ObjectDesc>,
    #[serde(default)]
    pub camera: CameraDesc,
    #[serde(default)]
    pub lights: Vec<Light>,
    #[serde(default = "default_ambient")]
    pub ambient: Color,
    #[serde(default = "default_clear")]
    pub clear_color: Color,
}

fn default_ambient() -> Color {
    Color::new(0.1, 0.1, 0.1)
}

fn default_clear() -> Color {
    Color::BLACK
}

impl SceneDesc {
    /// Build the runtime scene: meshes, textures and camera
    ///
    /// Texture files that don't exist are skipped with a warning and the
    /// material falls back to its flat diffuse color; files that exist but
    /// fail to decode are an error.
    pub fn resolve(&self, aspect: f32, base_dir: &Path) -> Result<Scene, SceneError> {
        let camera = self.camera.build(aspect)?;
        let mut textures: HashMap<PathBuf, Arc<Texture>> = HashMap::new();
        let mut scene = Scene::new(camera);
        scene.lights = self.lights.clone();
        scene.ambient = self.ambient;
        scene.clear_color = self.clear_color;

        for desc in &self.objects {
            let mesh = desc.mesh.build();
            mesh.validate().map_err(|source| SceneError::Object {
                name: desc.name.clone(),
                source,
            })?;

            let mut material = Material::new(
                desc.material.diffuse,
                desc.material.specular,
                desc.material.shininess,
            );
            if let Some(source) = &desc.material.texture {
                if let Some(tex) = load_texture(source, base_dir, &mut textures)? {
                    material = material.with_texture(tex);
                }
            }

            scene.add(
                SceneObject::new(desc.name.clone(), mesh)
                    .with_chain(desc.chain.clone())
                    .with_material(material)
                    .transparent(desc.transparent),
            );
        }

        Ok(scene)
    }
}

fn load_texture(
    source: &TextureSource,
    base_dir: &Path,
    cache: &mut HashMap<PathBuf, Arc<Texture>>,
) -> Result<Option<Arc<Texture>>, SceneError> {
    match source {
        TextureSource::Checkerboard { size, cell, a, b } => {
            Ok(Some(Arc::new(Texture::checkerboard(*size, *size, *cell, *a, *b))))
        }
        TextureSource::File(rel) => {
            let path = base_dir.join(rel);
            if let Some(tex) = cache.get(&path) {
                return Ok(Some(tex.clone()));
            }
            if !path.exists() {
                warn!("texture {} not found, using flat diffuse", path.display());
                return Ok(None);
            }
            let tex = Arc::new(Texture::from_file(&path)?);
            cache.insert(path, tex.clone());
            Ok(Some(tex))
        }
    }
}

/// Load a scene description from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneDesc, SceneError> {
    let contents = fs::read_to_string(path)?;
    load_scene_from_str(&contents)
}

/// Load a scene file and resolve it, textures relative to the file
pub fn load_and_resolve<P: AsRef<Path>>(path: P, aspect: f32) -> Result<Scene, SceneError> {
    let path = path.as_ref();
    let desc = load_scene(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    desc.resolve(aspect, base_dir)
}

/// Load a scene description from a RON string
pub fn load_scene_from_str(s: &str) -> Result<SceneDesc, SceneError> {
    Ok(ron::from_str(s)?)
}

/// Save a scene description to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &SceneDesc, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Textured cube over a ground plane, with a transparent quad in front
///
/// The camera sits at the origin looking down -Z.
pub fn demo_scene() -> SceneDesc {
    let checker = TextureSource::Checkerboard {
        size: 64,
        cell: 8,
        a: Color::new(0.9, 0.9, 0.85),
        b: Color::new(0.25, 0.3, 0.45),
    };

    SceneDesc {
        objects: vec![
            ObjectDesc {
                name: "cube".to_string(),
                mesh: MeshSource::Cube { size: 1.2 },
                chain: vec![TransformNode::new(
                    Vec3::new(0.0, 0.0, -4.0),
                    Quat::from_euler(Vec3::new(20.0, 35.0, 0.0)),
                    Vec3::ONE,
                )],
                material: MaterialDesc {
                    diffuse: Color::WHITE,
                    specular: Color::new(0.6, 0.6, 0.6),
                    shininess: 0.2,
                    texture: Some(checker),
                },
                transparent: false,
            },
            ObjectDesc {
                name: "ground".to_string(),
                mesh: MeshSource::Plane { size: 6.0 },
                chain: vec![TransformNode::at(Vec3::new(0.0, -1.0, -5.0))],
                material: MaterialDesc {
                    diffuse: Color::new(0.35, 0.55, 0.35),
                    specular: Color::BLACK,
                    ..MaterialDesc::default()
                },
                transparent: false,
            },
            ObjectDesc {
                name: "glass".to_string(),
                mesh: MeshSource::Plane { size: 1.0 },
                chain: vec![TransformNode::new(
                    Vec3::new(0.7, 0.1, -2.6),
                    Quat::from_euler(Vec3::new(90.0, 0.0, 0.0)),
                    Vec3::ONE,
                )],
                material: MaterialDesc {
                    diffuse: Color::with_alpha(0.9, 0.2, 0.2, 0.5),
                    specular: Color::WHITE,
                    shininess: 0.5,
                    texture: None,
                },
                transparent: true,
            },
        ],
        camera: CameraDesc::default(),
        lights: vec![
            Light::directional(Vec3::new(-0.4, -1.0, -0.6), Color::new(1.0, 0.95, 0.9), 0.8),
            Light::point(Vec3::new(1.5, 1.0, -3.0), 6.0, Color::new(0.4, 0.6, 1.0), 1.5),
        ],
        ambient: default_ambient(),
        clear_color: Color::new(0.05, 0.05, 0.08),
    }
}
