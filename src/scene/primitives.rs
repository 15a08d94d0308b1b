//! Built-in meshes
//!
//! Faces are wound clockwise when seen from the side their normal points
//! to, which is the winding the back-face test keeps.

use crate::rasterizer::{Mesh, Vec2, Vec3};

/// One quad: outward normal `n`, in-plane axes `u` and `v` with u x v = n
fn push_quad(mesh: &mut Mesh, center: Vec3, n: Vec3, u: Vec3, v: Vec3) {
    let base = mesh.vertices.len() as u32;
    for (s, t) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        mesh.vertices.push(center + u * (s - 0.5) + v * (t - 0.5));
        mesh.normals.push(n);
        mesh.uvs.push(Vec2::new(s, t));
    }
    mesh.indices.extend_from_slice(&[base, base + 3, base + 2, base, base + 2, base + 1]);
}

/// Axis-aligned cube centred on the origin
pub fn cube(size: f32) -> Mesh {
    let h = size / 2.0;
    let x = Vec3::new(1.0, 0.0, 0.0);
    let y = Vec3::UP;
    let z = Vec3::FORWARD;

    let mut mesh = Mesh::default();
    // (normal, u, v) per face
    let faces = [
        (x, -z, y),
        (-x, z, y),
        (y, x, -z),
        (-y, x, z),
        (z, x, y),
        (-z, -x, y),
    ];
    for (n, u, v) in faces {
        push_quad(&mut mesh, n * h, n, u * size, v * size);
    }
    mesh
}

/// Square in the XZ plane facing +Y
pub fn plane(size: f32) -> Mesh {
    let mut mesh = Mesh::default();
    push_quad(
        &mut mesh,
        Vec3::ZERO,
        Vec3::UP,
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -size),
    );
    mesh
}

/// Single triangle in the XY plane facing +Z
pub fn triangle() -> Mesh {
    Mesh {
        vertices: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        normals: vec![Vec3::FORWARD; 3],
        uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(0.5, 1.0), Vec2::new(1.0, 0.0)],
        indices: vec![0, 1, 2],
    }
}
