//! Headless frame exporter
//!
//! Renders a scene for a number of frames, spinning the first object's root
//! node, then writes the last frame as PNG. The deferred path also writes
//! every G-buffer view.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use softlight::config::RenderConfig;
use softlight::rasterizer::{Quat, RenderPath, Renderer};
use softlight::scene::{demo_scene, load_and_resolve, save_scene};

const DEFAULT_OUTPUT_DIR: &str = "frames";

fn parse_path(name: &str) -> Result<RenderPath> {
    Ok(match name {
        "point-cloud" => RenderPath::PointCloud,
        "wireframe" => RenderPath::Wireframe,
        "unlit" => RenderPath::Unlit,
        "vertex-lit" => RenderPath::VertexLit,
        "forward" => RenderPath::Forward,
        "deferred" => RenderPath::Deferred,
        other => bail!("unknown render path '{}'", other),
    })
}

fn save_png(image: &image::RgbaImage, dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    image
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("render_frames")
        .about("Renders a scene with the software rasterizer and writes PNG images")
        .arg(
            Arg::new("scene")
                .short('s')
                .long("scene")
                .value_name("FILE")
                .help("Scene file (RON); the built-in demo scene if omitted"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Render config file (RON)"),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .value_name("PATH")
                .help("Render path")
                .value_parser(["point-cloud", "wireframe", "unlit", "vertex-lit", "forward", "deferred"]),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to render")
                .value_parser(clap::value_parser!(u32).range(1..))
                .default_value("1"),
        )
        .arg(
            Arg::new("spin")
                .long("spin")
                .value_name("DEGREES")
                .help("Rotation of the first object per frame")
                .value_parser(clap::value_parser!(f32))
                .default_value("3"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .value_name("WxH")
                .help("Override the resolution, e.g. 800x600"),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .help("Rasterize on the calling thread only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory")
                .default_value(DEFAULT_OUTPUT_DIR),
        )
        .arg(
            Arg::new("write-demo")
                .long("write-demo")
                .value_name("FILE")
                .help("Write the demo scene as RON and exit"),
        )
        .get_matches();

    if let Some(file) = matches.get_one::<String>("write-demo") {
        save_scene(&demo_scene(), file).with_context(|| format!("failed to write {}", file))?;
        info!("wrote demo scene to {}", file);
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(file) => RenderConfig::load(file).with_context(|| format!("failed to load config {}", file))?,
        None => RenderConfig::default(),
    };
    if let Some(name) = matches.get_one::<String>("path") {
        config.path = parse_path(name)?;
    }
    if let Some(size) = matches.get_one::<String>("size") {
        let (w, h) = size
            .split_once('x')
            .with_context(|| format!("size '{}' is not WxH", size))?;
        config.width = w.parse().with_context(|| format!("bad width in '{}'", size))?;
        config.height = h.parse().with_context(|| format!("bad height in '{}'", size))?;
    }
    if matches.get_flag("serial") {
        config.parallel = false;
    }

    let mut scene = match matches.get_one::<String>("scene") {
        Some(file) => load_and_resolve(file, config.aspect()).with_context(|| format!("failed to load scene {}", file))?,
        None => demo_scene()
            .resolve(config.aspect(), Path::new("."))
            .context("failed to build demo scene")?,
    };

    let frames = *matches.get_one::<u32>("frames").unwrap_or(&1);
    let spin = *matches.get_one::<f32>("spin").unwrap_or(&0.0);
    let output = PathBuf::from(matches.get_one::<String>("output").map(String::as_str).unwrap_or(DEFAULT_OUTPUT_DIR));
    fs::create_dir_all(&output).with_context(|| format!("failed to create {}", output.display()))?;

    let path = config.path;
    let mut renderer = Renderer::new(config).context("invalid render config")?;
    info!(
        "rendering {} frames of {} objects at {}x{} ({})",
        frames,
        scene.objects.len(),
        renderer.config().width,
        renderer.config().height,
        path.name()
    );

    let base = scene
        .objects
        .first()
        .and_then(|o| o.chain.last())
        .map(|n| n.rotation)
        .unwrap_or(Quat::IDENTITY);

    let bar = ProgressBar::new(frames as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} frames {msg}")
            .context("bad progress template")?
            .progress_chars("##-"),
    );

    let mut total = std::time::Duration::ZERO;
    for frame in 0..frames {
        scene.spin_root(0, base, spin * frame as f32);
        let stats = renderer.render(&scene).context("frame failed")?;
        total += stats.elapsed;
        bar.set_message(format!("{:.1} ms", stats.elapsed.as_secs_f64() * 1000.0));
        bar.inc(1);
    }
    bar.finish_with_message(format!(
        "avg {:.2} ms/frame",
        total.as_secs_f64() * 1000.0 / frames as f64
    ));

    save_png(&renderer.frame().to_image(), &output, "color.png")?;
    if path != RenderPath::PointCloud && path != RenderPath::Wireframe {
        save_png(&renderer.frame().depth_image(), &output, "depth.png")?;
    }
    if path == RenderPath::Deferred {
        let g = renderer.gbuffer();
        save_png(&g.diffuse_image(), &output, "gbuffer_diffuse.png")?;
        save_png(&g.specular_image(), &output, "gbuffer_specular.png")?;
        save_png(&g.normal_image(), &output, "gbuffer_normal.png")?;
        save_png(&g.position_image(), &output, "gbuffer_position.png")?;
        save_png(&g.depth_image(), &output, "gbuffer_depth.png")?;
    }

    Ok(())
}
