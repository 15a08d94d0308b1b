//! softlight viewer
//!
//! Renders a scene with the software rasterizer every frame and presents the
//! color buffer (or a G-buffer view) in a window.
//!
//! Keys:
//! - 1..6: point cloud, wireframe, unlit, vertex lit, forward, deferred
//! - G: cycle buffer views
//! - P: toggle parallel rasterization
//! - Space: pause the spin
//! - Esc: quit

use std::path::Path;

use clap::{Arg, Command};
use macroquad::prelude::*;

use softlight::config::RenderConfig;
use softlight::rasterizer::{Quat, RenderPath, Renderer};
use softlight::scene::{demo_scene, load_and_resolve, Scene};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Spin speed of the first object, degrees per second
const SPIN_SPEED: f32 = 30.0;

/// Which buffer is shown
#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Color,
    Depth,
    Diffuse,
    Specular,
    Normal,
    Position,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Color => View::Depth,
            View::Depth => View::Diffuse,
            View::Diffuse => View::Specular,
            View::Specular => View::Normal,
            View::Normal => View::Position,
            View::Position => View::Color,
        }
    }

    fn name(self) -> &'static str {
        match self {
            View::Color => "color",
            View::Depth => "depth",
            View::Diffuse => "g-buffer diffuse",
            View::Specular => "g-buffer specular",
            View::Normal => "g-buffer normal",
            View::Position => "g-buffer position",
        }
    }

    fn image(self, renderer: &Renderer) -> ::image::RgbaImage {
        let g = renderer.gbuffer();
        match self {
            View::Color => renderer.frame().to_image(),
            View::Depth => renderer.frame().depth_image(),
            View::Diffuse => g.diffuse_image(),
            View::Specular => g.specular_image(),
            View::Normal => g.normal_image(),
            View::Position => g.position_image(),
        }
    }
}

const PATH_KEYS: [(KeyCode, RenderPath); 6] = [
    (KeyCode::Key1, RenderPath::PointCloud),
    (KeyCode::Key2, RenderPath::Wireframe),
    (KeyCode::Key3, RenderPath::Unlit),
    (KeyCode::Key4, RenderPath::VertexLit),
    (KeyCode::Key5, RenderPath::Forward),
    (KeyCode::Key6, RenderPath::Deferred),
];

/// Config and scene from the command line, demo scene by default
fn load_inputs() -> anyhow::Result<(RenderConfig, Scene)> {
    use anyhow::Context;

    let matches = Command::new("softlight")
        .version(VERSION)
        .about("Interactive viewer for the software rasterizer")
        .arg(Arg::new("scene").value_name("SCENE").help("Scene file (RON)"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Render config file (RON)"),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(file) => RenderConfig::load(file).with_context(|| format!("failed to load config {}", file))?,
        None => RenderConfig::default(),
    };
    let scene = match matches.get_one::<String>("scene") {
        Some(file) => load_and_resolve(file, config.aspect()).with_context(|| format!("failed to load scene {}", file))?,
        None => demo_scene()
            .resolve(config.aspect(), Path::new("."))
            .context("failed to build demo scene")?,
    };
    Ok((config, scene))
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softlight v{}", VERSION),
        window_width: 600,
        window_height: 640,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, mut scene) = match load_inputs() {
        Ok(inputs) => inputs,
        Err(e) => {
            log::error!("{:#}", e);
            return;
        }
    };
    let mut renderer = match Renderer::new(config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("invalid render config: {}", e);
            return;
        }
    };

    let base = scene
        .objects
        .first()
        .and_then(|o| o.chain.last())
        .map(|n| n.rotation)
        .unwrap_or(Quat::IDENTITY);
    let mut angle = 0.0f32;
    let mut paused = false;
    let mut view = View::Color;

    log::info!("=== softlight v{} ===", VERSION);
    log::info!("{} objects, {} lights", scene.objects.len(), scene.lights.len());

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        for (key, path) in PATH_KEYS {
            if is_key_pressed(key) {
                renderer.set_path(path);
                log::info!("render path: {}", path.name());
            }
        }
        if is_key_pressed(KeyCode::G) {
            view = view.next();
        }
        if is_key_pressed(KeyCode::P) {
            let parallel = !renderer.config().parallel;
            renderer.set_parallel(parallel);
            log::info!("parallel rasterization: {}", parallel);
        }
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }

        if !paused {
            angle = (angle + get_frame_time() * SPIN_SPEED) % 360.0;
            scene.spin_root(0, base, angle);
        }

        let stats = match renderer.render(&scene) {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("frame failed: {}", e);
                break;
            }
        };

        // Convert framebuffer to texture and draw it scaled to fit
        let image = view.image(&renderer);
        let (fb_w, fb_h) = (image.width(), image.height());
        let texture = Texture2D::from_rgba8(fb_w as u16, fb_h as u16, image.as_raw());
        texture.set_filter(FilterMode::Nearest);

        clear_background(Color::from_rgba(30, 30, 35, 255));

        let status_h = 40.0;
        let avail_w = screen_width();
        let avail_h = screen_height() - status_h;
        let scale = (avail_w / fb_w as f32).min(avail_h / fb_h as f32);
        let (draw_w, draw_h) = (fb_w as f32 * scale, fb_h as f32 * scale);

        draw_texture_ex(
            &texture,
            (avail_w - draw_w) / 2.0,
            status_h + (avail_h - draw_h) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!(
                "{} | {} | {} | {:.1} ms | {} FPS | {} tris, {} culled",
                renderer.path().name(),
                view.name(),
                if renderer.config().parallel { "parallel" } else { "serial" },
                stats.elapsed.as_secs_f64() * 1000.0,
                get_fps(),
                stats.triangles,
                stats.backfacing,
            ),
            10.0,
            26.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}
