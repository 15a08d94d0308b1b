//! Scene input for the renderer
//!
//! A [`Scene`] is the per-frame snapshot the renderer consumes: objects with
//! their transform chains and materials, one camera, lights, ambient and
//! clear colors. Scene files ([`SceneDesc`]) are resolved into it.

mod file;
pub mod primitives;

pub use file::*;

use crate::rasterizer::{Camera, Color, Light, Material, Mesh, Quat, TransformNode, Vec3};

/// One drawable object
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Mesh,
    /// Leaf-to-root transform chain
    pub chain: Vec<TransformNode>,
    pub material: Material,
    pub transparent: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            chain: Vec::new(),
            material: Material::default(),
            transparent: false,
        }
    }

    pub fn with_chain(mut self, chain: Vec<TransformNode>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
}

/// Everything one frame renders
#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub ambient: Color,
    pub clear_color: Color,
}

impl Scene {
    /// Empty scene: no lights, black ambient, black background
    pub fn new(camera: Camera) -> Self {
        Self {
            objects: Vec::new(),
            camera,
            lights: Vec::new(),
            ambient: Color::BLACK,
            clear_color: Color::BLACK,
        }
    }

    pub fn add(&mut self, object: SceneObject) -> &mut Self {
        self.objects.push(object);
        self
    }

    /// Root node of an object's chain, if it has one
    pub fn root_mut(&mut self, object: usize) -> Option<&mut TransformNode> {
        self.objects.get_mut(object).and_then(|o| o.chain.last_mut())
    }

    /// Set an object's root rotation to `base` turned about world Y
    pub fn spin_root(&mut self, object: usize, base: Quat, degrees: f32) -> bool {
        match self.root_mut(object) {
            Some(root) => {
                root.rotation = Quat::from_axis_angle(Vec3::UP, degrees) * base;
                true
            }
            None => false,
        }
    }
}
