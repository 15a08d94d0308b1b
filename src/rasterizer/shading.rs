//! Blinn-Phong lighting
//!
//! Two entry points share the per-light setup:
//! - [`shade_pixel`] for the forward and deferred paths
//! - [`shade_vertex`] for the Gouraud-style vertex-lit path
//!
//! They differ only in the specular term, which is chosen per call site
//! through [`SpecularModel`].

use serde::{Serialize, Deserialize};

use super::math::Vec3;
use super::types::{Color, Light, LightKind};

/// Specular highlight formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecularModel {
    /// `pow(max(0, N·normalize(L + V)), shininess * 128)`
    BlinnHalfVector,
    /// `pow(max(0, reflect(-L, N)·V), shininess)`
    PhongReflect,
}

/// Scene-wide lighting inputs for one frame
#[derive(Debug, Clone, Copy)]
pub struct LightingEnv<'a> {
    pub lights: &'a [Light],
    pub ambient: Color,
    pub camera_position: Vec3,
}

/// Material terms at one surface sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub position: Vec3,
    pub normal: Vec3,
    /// Diffuse color after texture modulation
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
}

/// Light vector, radiance and attenuation of one light at a point
struct Incident {
    /// Unnormalized for point lights (points from the surface to the light)
    direction: Vec3,
    color: Color,
    attenuation: f32,
}

fn incident(light: &Light, position: Vec3) -> Incident {
    match light.kind {
        LightKind::Directional { forward } => Incident {
            direction: -forward,
            color: light.radiance(),
            attenuation: 1.0,
        },
        LightKind::Point { position: light_pos, range } => {
            let to_light = light_pos - position;
            let distance = to_light.len();
            // Hard cutoff at the range, no falloff curve
            let color = if distance < range { light.radiance() } else { Color::BLACK };
            Incident {
                direction: to_light,
                color,
                attenuation: if distance > 0.0 { 1.0 / distance } else { 0.0 },
            }
        }
    }
}

fn specular_factor(
    model: SpecularModel,
    normal_dir: Vec3,
    light_dir: Vec3,
    view_dir: Vec3,
    shininess: f32,
) -> f32 {
    match model {
        SpecularModel::BlinnHalfVector => {
            let half = (light_dir + view_dir).normalize();
            normal_dir.dot(half).max(0.0).powf(shininess * 128.0)
        }
        SpecularModel::PhongReflect => {
            let reflected = (-light_dir).reflect(normal_dir);
            reflected.dot(view_dir).max(0.0).powf(shininess)
        }
    }
}

/// Sum of ambient, diffuse and specular terms over every light
///
/// The returned alpha is the diffuse alpha, independent of the lighting.
pub fn shade(env: &LightingEnv, s: &SurfaceSample, model: SpecularModel) -> Color {
    let normal_dir = s.normal.normalize();
    let view_dir = (env.camera_position - s.position).normalize();

    let mut diffuse_sum = Color::CLEAR;
    let mut specular_sum = Color::CLEAR;

    for light in env.lights {
        let inc = incident(light, s.position);
        let n_dot_l = normal_dir.dot(inc.direction);

        diffuse_sum += inc.color * s.diffuse * (inc.attenuation * n_dot_l.max(0.0));

        // Light on the wrong side: no highlight
        if n_dot_l >= 0.0 {
            let f = specular_factor(model, normal_dir, inc.direction, view_dir, s.shininess);
            specular_sum += inc.color * s.specular * (inc.attenuation * f);
        }
    }

    let ambient = env.ambient * s.diffuse;
    (ambient + diffuse_sum + specular_sum).alpha(s.diffuse.a)
}

/// Per-pixel shading used by the forward and deferred paths
pub fn shade_pixel(env: &LightingEnv, s: &SurfaceSample, model: SpecularModel) -> Color {
    shade(env, s, model)
}

/// Per-vertex shading: world-space vertices and normals to vertex colors
pub fn shade_vertex(
    env: &LightingEnv,
    world_vertices: &[Vec3],
    world_normals: &[Vec3],
    diffuse: Color,
    specular: Color,
    shininess: f32,
    model: SpecularModel,
) -> Vec<Color> {
    world_vertices
        .iter()
        .zip(world_normals)
        .map(|(&position, &normal)| {
            let s = SurfaceSample { position, normal, diffuse, specular, shininess };
            shade(env, &s, model)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(normal: Vec3) -> SurfaceSample {
        SurfaceSample {
            position: Vec3::ZERO,
            normal,
            diffuse: Color::new(0.8, 0.4, 0.2),
            specular: Color::BLACK,
            shininess: 0.5,
        }
    }

    fn env(lights: &[Light]) -> LightingEnv<'_> {
        LightingEnv {
            lights,
            ambient: Color::BLACK,
            camera_position: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    #[test]
    fn test_directional_facing_light_gives_full_diffuse() {
        let lights = [Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::new(1.0, 0.5, 1.0), 1.0)];
        let c = shade_pixel(&env(&lights), &sample(Vec3::FORWARD), SpecularModel::BlinnHalfVector);
        assert_abs_diff_eq!(c.r, 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(c.g, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(c.b, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_directional_facing_away_is_black() {
        let lights = [Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::WHITE, 1.0)];
        let mut s = sample(-Vec3::FORWARD);
        s.specular = Color::WHITE;
        let c = shade_pixel(&env(&lights), &s, SpecularModel::BlinnHalfVector);
        assert_eq!((c.r, c.g, c.b), (0.0, 0.0, 0.0));
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_ambient_only() {
        let mut e = env(&[]);
        e.ambient = Color::new(0.5, 0.5, 0.5);
        let c = shade_pixel(&e, &sample(Vec3::FORWARD), SpecularModel::BlinnHalfVector);
        assert_abs_diff_eq!(c.r, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(c.b, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_point_light_range_is_a_hard_cutoff() {
        let inside = [Light::point(Vec3::new(0.0, 0.0, 2.0), 2.5, Color::WHITE, 1.0)];
        let c = shade_pixel(&env(&inside), &sample(Vec3::FORWARD), SpecularModel::BlinnHalfVector);
        // attenuation 1/2 times N·L of the unnormalized vector (length 2)
        assert_abs_diff_eq!(c.r, 0.8, epsilon = 1e-6);

        let outside = [Light::point(Vec3::new(0.0, 0.0, 2.0), 1.9, Color::WHITE, 1.0)];
        let c = shade_pixel(&env(&outside), &sample(Vec3::FORWARD), SpecularModel::BlinnHalfVector);
        assert_eq!(c.r, 0.0);
    }

    #[test]
    fn test_blinn_highlight_peaks_on_the_half_vector() {
        let lights = [Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::WHITE, 1.0)];
        let mut s = sample(Vec3::FORWARD);
        s.diffuse = Color::BLACK;
        s.specular = Color::WHITE;
        let c = shade_pixel(&env(&lights), &s, SpecularModel::BlinnHalfVector);
        assert_abs_diff_eq!(c.r, 1.0, epsilon = 1e-5);

        let p = shade_pixel(&env(&lights), &s, SpecularModel::PhongReflect);
        assert_abs_diff_eq!(p.r, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_specular_models_differ_off_axis() {
        let lights = [Light::directional(Vec3::new(0.0, -0.5, -1.0), Color::WHITE, 1.0)];
        let mut s = sample(Vec3::FORWARD);
        s.diffuse = Color::BLACK;
        s.specular = Color::WHITE;
        let blinn = shade_pixel(&env(&lights), &s, SpecularModel::BlinnHalfVector);
        let phong = shade_pixel(&env(&lights), &s, SpecularModel::PhongReflect);
        assert!(blinn.r > 0.0 && phong.r > 0.0);
        assert!((blinn.r - phong.r).abs() > 1e-3);
    }

    #[test]
    fn test_shade_vertex_one_color_per_vertex() {
        let lights = [Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::WHITE, 1.0)];
        let colors = shade_vertex(
            &env(&lights),
            &[Vec3::ZERO, Vec3::UP],
            &[Vec3::FORWARD, -Vec3::FORWARD],
            Color::WHITE,
            Color::BLACK,
            1.0,
            SpecularModel::PhongReflect,
        );
        assert_eq!(colors.len(), 2);
        assert_abs_diff_eq!(colors[0].r, 1.0, epsilon = 1e-6);
        assert_eq!(colors[1].r, 0.0);
    }
}
