//! Camera intrinsics and world-to-camera transform

use super::error::RasterError;
use super::math::{Mat4, Vec3};

/// Rendering camera
///
/// View space is right-handed with the camera looking down -Z, which is
/// what the projection matrix in `transform::perspective_projection`
/// expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub world_to_camera: Mat4,
    pub position: Vec3,
}

impl Camera {
    /// Build a validated camera
    pub fn new(
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
        world_to_camera: Mat4,
        position: Vec3,
    ) -> Result<Self, RasterError> {
        let cam = Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            world_to_camera,
            position,
        };
        cam.validate()?;
        Ok(cam)
    }

    /// Camera at `eye` looking at `target`
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, RasterError> {
        let forward = (target - eye).normalize();
        let side = forward.cross(up).normalize();
        if forward == Vec3::ZERO || side == Vec3::ZERO {
            return Err(RasterError::Domain(format!(
                "look_at needs distinct eye/target and an up vector not parallel to the view ({:?} -> {:?}, up {:?})",
                eye, target, up
            )));
        }
        let true_up = side.cross(forward);

        let world_to_camera = Mat4 {
            m: [
                [side.x, side.y, side.z, -side.dot(eye)],
                [true_up.x, true_up.y, true_up.z, -true_up.dot(eye)],
                [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };

        Self::new(fov_y_degrees, aspect, near, far, world_to_camera, eye)
    }

    /// Reject parameters that would produce NaNs in the projection
    pub fn validate(&self) -> Result<(), RasterError> {
        if !(self.near > 0.0) {
            return Err(RasterError::Domain(format!("near plane must be > 0, got {}", self.near)));
        }
        if !(self.near < self.far) {
            return Err(RasterError::Domain(format!(
                "near plane ({}) must be closer than far plane ({})",
                self.near, self.far
            )));
        }
        if !(self.aspect > 0.0) || !self.aspect.is_finite() {
            return Err(RasterError::Domain(format!("aspect ratio must be > 0, got {}", self.aspect)));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(RasterError::Domain(format!(
                "vertical field of view must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let cam = Camera::look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::UP,
            60.0,
            1.0,
            0.1,
            100.0,
        )
        .unwrap();
        let p = cam.world_to_camera.multiply_point3x4(Vec3::ZERO);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, -5.0, epsilon = 1e-6);

        let right = cam.world_to_camera.multiply_point3x4(Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(right.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_near_not_less_than_far() {
        let err = Camera::new(60.0, 1.0, 10.0, 10.0, Mat4::IDENTITY, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, RasterError::Domain(_)));
        assert!(Camera::new(60.0, 1.0, 20.0, 10.0, Mat4::IDENTITY, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_rejects_non_positive_aspect() {
        assert!(Camera::new(60.0, 0.0, 0.1, 10.0, Mat4::IDENTITY, Vec3::ZERO).is_err());
        assert!(Camera::new(60.0, -1.5, 0.1, 10.0, Mat4::IDENTITY, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_rejects_parallel_up() {
        let r = Camera::look_at(Vec3::ZERO, Vec3::UP, Vec3::UP, 60.0, 1.0, 0.1, 10.0);
        assert!(r.is_err());
    }
}
