//! Model/view/projection matrices and vertex transformation

use serde::{Serialize, Deserialize};

use super::camera::Camera;
use super::error::RasterError;
use super::math::{Mat4, Quat, Vec3, Vec4};

/// One node of a transform hierarchy: local translation, rotation, scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformNode {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformNode {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::trs(self.position, self.rotation, self.scale)
    }
}

/// Compose a leaf-to-root chain into one model-to-world matrix
///
/// Each ancestor pre-multiplies the running product, so the root's TRS
/// ends up leftmost. An empty chain is the identity.
pub fn model_to_world(chain: &[TransformNode]) -> Mat4 {
    chain
        .iter()
        .fold(Mat4::IDENTITY, |acc, node| node.matrix() * acc)
}

/// World-to-camera times model-to-world
pub fn model_to_view(model_to_world: &Mat4, world_to_camera: &Mat4) -> Mat4 {
    *world_to_camera * *model_to_world
}

/// OpenGL-style perspective matrix for a camera
///
/// Maps view-space z in [-near, -far] to clip z in [-1, 1] after the
/// divide by w = -z.
pub fn perspective_projection(camera: &Camera) -> Result<Mat4, RasterError> {
    camera.validate()?;

    let half = (camera.fov_y_degrees.to_radians() / 2.0).tan();
    let (n, f) = (camera.near, camera.far);

    let mut p = Mat4::ZERO;
    p.m[0][0] = 1.0 / (camera.aspect * half);
    p.m[1][1] = 1.0 / half;
    p.m[2][2] = (n + f) / (n - f);
    p.m[2][3] = 2.0 * f * n / (n - f);
    p.m[3][2] = -1.0;
    Ok(p)
}

/// Transform points with the full matrix, dividing by the resulting w
pub fn transform_points(points: &[Vec3], mat: &Mat4) -> Vec<Vec3> {
    points.iter().map(|&p| mat.multiply_point(p)).collect()
}

/// Transform directions (normals) with the upper-left 3x3 only
pub fn transform_directions(dirs: &[Vec3], mat: &Mat4) -> Vec<Vec3> {
    dirs.iter().map(|&d| mat.multiply_vector(d)).collect()
}

/// Project model-space vertices into clip space
///
/// Each result holds (x/w, y/w, z/w, w): the divided coordinates plus the
/// original clip-space w.
pub fn project_vertices(vertices: &[Vec3], model_to_view: &Mat4, projection: &Mat4) -> Vec<Vec4> {
    let model_to_clip = *projection * *model_to_view;
    vertices
        .iter()
        .map(|&v| {
            let h = model_to_clip * v.extend(1.0);
            Vec4::new(h.x / h.w, h.y / h.w, h.z / h.w, h.w)
        })
        .collect()
}

/// All per-object matrices for one frame
#[derive(Debug, Clone, Copy)]
pub struct ObjectMatrices {
    pub model_to_world: Mat4,
    pub model_to_view: Mat4,
    pub projection: Mat4,
}

impl ObjectMatrices {
    pub fn new(chain: &[TransformNode], camera: &Camera) -> Result<Self, RasterError> {
        let model_to_world = model_to_world(chain);
        Ok(Self {
            model_to_world,
            model_to_view: model_to_view(&model_to_world, &camera.world_to_camera),
            projection: perspective_projection(camera)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(1.0, 2.0, 6.0), Vec3::ZERO, Vec3::UP, 60.0, 1.5, 0.3, 50.0).unwrap()
    }

    fn assert_mat_eq(a: &Mat4, b: &Mat4) {
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(a.m[i][j], b.m[i][j], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert_eq!(model_to_world(&[]), Mat4::IDENTITY);
    }

    #[test]
    fn test_single_node_is_its_trs() {
        let node = TransformNode::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_euler(Vec3::new(10.0, 20.0, 30.0)),
            Vec3::new(2.0, 1.0, 0.5),
        );
        assert_eq!(model_to_world(&[node]), node.matrix());
    }

    #[test]
    fn test_chain_applies_parent_after_child() {
        let child = TransformNode::at(Vec3::new(1.0, 0.0, 0.0));
        let parent = TransformNode::new(
            Vec3::new(0.0, 10.0, 0.0),
            Quat::IDENTITY,
            Vec3::new(2.0, 2.0, 2.0),
        );
        let m = model_to_world(&[child, parent]);
        assert_mat_eq(&m, &(parent.matrix() * child.matrix()));
        let p = m.multiply_point3x4(Vec3::ZERO);
        assert_abs_diff_eq!(p.x, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_entries() {
        let cam = camera();
        let p = perspective_projection(&cam).unwrap();
        let t = (30.0f32).to_radians().tan();
        assert_abs_diff_eq!(p.m[0][0], 1.0 / (1.5 * t), epsilon = 1e-5);
        assert_abs_diff_eq!(p.m[1][1], 1.0 / t, epsilon = 1e-5);
        assert_abs_diff_eq!(p.m[2][2], 50.3 / -49.7, epsilon = 1e-5);
        assert_abs_diff_eq!(p.m[2][3], 2.0 * 50.0 * 0.3 / -49.7, epsilon = 1e-5);
        assert_eq!(p.m[3][2], -1.0);
        assert_eq!(p.m[3][3], 0.0);
        assert_eq!(p.m[0][1], 0.0);
    }

    #[test]
    fn test_projection_maps_near_and_far_planes() {
        let cam = camera();
        let p = perspective_projection(&cam).unwrap();
        let near = project_vertices(&[Vec3::new(0.0, 0.0, -0.3)], &Mat4::IDENTITY, &p)[0];
        let far = project_vertices(&[Vec3::new(0.0, 0.0, -50.0)], &Mat4::IDENTITY, &p)[0];
        assert_abs_diff_eq!(near.z, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(far.z, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(far.w, 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_projection_rejects_bad_camera() {
        let mut cam = camera();
        cam.near = 60.0;
        assert!(matches!(perspective_projection(&cam), Err(RasterError::Domain(_))));
    }

    #[test]
    fn test_project_then_unproject_round_trips() {
        let cam = camera();
        let model = [TransformNode::new(
            Vec3::new(0.5, -0.5, 0.0),
            Quat::from_euler(Vec3::new(0.0, 35.0, 0.0)),
            Vec3::ONE,
        )];
        let m = ObjectMatrices::new(&model, &cam).unwrap();
        let inverse = (m.projection * m.model_to_view).inverse().unwrap();

        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.3, 0.2, -0.4),
            Vec3::new(-1.0, 0.5, 1.0),
        ];
        for (p, proj) in points.iter().zip(project_vertices(&points, &m.model_to_view, &m.projection)) {
            let clip = Vec4::new(proj.x * proj.w, proj.y * proj.w, proj.z * proj.w, proj.w);
            let back = inverse * clip;
            assert_abs_diff_eq!(back.x / back.w, p.x, epsilon = 1e-3);
            assert_abs_diff_eq!(back.y / back.w, p.y, epsilon = 1e-3);
            assert_abs_diff_eq!(back.z / back.w, p.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_directions_skip_translation_and_divide() {
        let m = Mat4::translation(Vec3::new(3.0, 3.0, 3.0));
        let n = transform_directions(&[Vec3::UP], &m);
        assert_eq!(n[0], Vec3::UP);
        let p = transform_points(&[Vec3::UP], &m);
        assert_eq!(p[0], Vec3::new(3.0, 4.0, 3.0));
    }
}
