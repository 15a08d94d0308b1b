//! View-volume rejection, back-face culling and the NDC-to-pixel mapping

use super::math::{Vec3, Vec4};

/// True if a projected vertex lies inside the canonical x/y range [-1,1]
pub fn in_view_volume(v: Vec4) -> bool {
    (-1.0..=1.0).contains(&v.x) && (-1.0..=1.0).contains(&v.y)
}

/// Cheap reject: keep the triangle if any vertex is inside the volume
///
/// Not a real clip. A straddling triangle rasterizes in full and relies on
/// the bounding-box clamp.
pub fn triangle_visible(v: [Vec4; 3]) -> bool {
    v.iter().any(|&p| in_view_volume(p))
}

/// True if any vertex sits at or behind the eye (clip w <= 0)
pub fn behind_camera(v: [Vec4; 3]) -> bool {
    v.iter().any(|p| !(p.w > 0.0))
}

/// Back-face test on projected vertices
///
/// The projected-space normal `(v2-v1) x (v3-v1)` is compared with the
/// vector from the camera's world position to the projected centroid;
/// the triangle faces away when their dot product is positive.
pub fn is_back_facing(v: [Vec4; 3], camera_position: Vec3) -> bool {
    let (p1, p2, p3) = (v[0].xyz(), v[1].xyz(), v[2].xyz());
    let normal = (p2 - p1).cross(p3 - p1);
    let centre = (p1 + p2 + p3) / 3.0;
    normal.dot(centre - camera_position) > 0.0
}

/// Map a projected vertex to pixel space, keeping z and w
///
/// x/y in [-1,1] become [0,width] x [0,height]; row 0 is the bottom.
pub fn to_screen(v: Vec4, width: usize, height: usize) -> Vec4 {
    Vec4::new(
        (v.x + 1.0) / 2.0 * width as f32,
        (v.y + 1.0) / 2.0 * height as f32,
        v.z,
        v.w,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_volume_edges_are_inside() {
        assert!(in_view_volume(Vec4::new(1.0, -1.0, 0.5, 1.0)));
        assert!(!in_view_volume(Vec4::new(1.01, 0.0, 0.5, 1.0)));
    }

    #[test]
    fn test_triangle_visible_needs_one_inside_vertex() {
        let out = Vec4::new(3.0, 3.0, 0.0, 1.0);
        let inside = Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(!triangle_visible([out, out, out]));
        assert!(triangle_visible([out, inside, out]));
    }

    #[test]
    fn test_back_facing_depends_on_winding() {
        // Projected depth is positive in front of the far half of the frustum
        let a = Vec4::new(0.0, 0.0, 0.5, 2.0);
        let b = Vec4::new(0.0, 0.5, 0.5, 2.0);
        let c = Vec4::new(0.5, 0.0, 0.5, 2.0);
        assert!(!is_back_facing([a, b, c], Vec3::ZERO));
        assert!(is_back_facing([a, c, b], Vec3::ZERO));
    }

    #[test]
    fn test_to_screen() {
        let s = to_screen(Vec4::new(-1.0, 1.0, 0.25, 3.0), 100, 50);
        assert_eq!(s, Vec4::new(0.0, 50.0, 0.25, 3.0));
    }

    #[test]
    fn test_behind_camera() {
        let ok = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let behind = Vec4::new(0.0, 0.0, 0.0, -1.0);
        assert!(!behind_camera([ok, ok, ok]));
        assert!(behind_camera([ok, behind, ok]));
    }
}
