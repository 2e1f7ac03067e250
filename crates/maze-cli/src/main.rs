//! maze CLI - render octree-indexed maze scenes to PNG
//!
//! Loads a JSON scene, indexes its surfaces and renders frames with the
//! sparse-sample and flood-fill renderer.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::{info, LevelFilter};
use maze_math::degrees_to_radians;
use maze_raytrace::Octree;
use maze_render::{frame_factor, FrameBuffer, FrameRenderer, Player, Scene};

mod cli;
mod config;

use cli::{Cli, Commands, RenderArgs};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level.into())?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render(args) => render(&args, config)?,
        Commands::Info { scene } => show_info(&scene, config)?,
    }

    Ok(())
}

/// Log the maze crates at `level`; everything else only warns.
fn init_logger(level: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Warn)
        // Prefix match: also covers maze_raytrace and maze_render
        .filter_module("maze", level)
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

fn render(args: &RenderArgs, config: Config) -> Result<()> {
    if !(args.fps > 0.0) {
        bail!("fps must be positive, got {}", args.fps);
    }

    let scene = Scene::load(&args.scene)?;
    let Some(&pose) = scene.poses.get(args.player) else {
        bail!(
            "scene has {} players, no player {}",
            scene.poses.len(),
            args.player
        );
    };
    let octree = Octree::build(scene.surfaces, config.octree)?;

    let settings = args.apply(config.render);
    let (width, height) = (settings.width, settings.height);
    let mut renderer = FrameRenderer::new(settings)?;
    let mut frame = FrameBuffer::new(width, height);

    let mut player = Player::new(pose);
    player.rot_velocity = degrees_to_radians(args.turn);
    let budget = Duration::from_secs_f64(1.0 / args.fps);

    let started = Instant::now();
    for i in 0..args.frames {
        let stats = renderer.render_frame(&octree, &player.pose, &mut frame)?;
        if i + 1 < args.frames {
            player.step(&octree, frame_factor(stats.elapsed, budget));
        }
    }
    let elapsed = started.elapsed();
    if args.frames > 0 {
        info!(
            "rendered {} frames in {:.2?} ({:.1} fps)",
            args.frames,
            elapsed,
            f64::from(args.frames) / elapsed.as_secs_f64()
        );
    }

    save_png(&frame, &args.output)?;
    println!("Wrote {}x{} frame to {}", width, height, args.output.display());
    Ok(())
}

fn save_png(frame: &FrameBuffer, output: &Path) -> Result<()> {
    let (width, height) = (frame.width() as u32, frame.height() as u32);
    let image = image::RgbaImage::from_raw(width, height, frame.to_rgba())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", width, height))?;
    image.save(output)?;
    Ok(())
}

fn show_info(path: &Path, config: Config) -> Result<()> {
    let scene = Scene::load(path)?;
    let poses = scene.poses.clone();
    let surfaces = scene.surfaces.len();
    let octree = Octree::build(scene.surfaces, config.octree)?;
    let stats = octree.stats();

    println!("Scene: {}", path.display());
    println!("  Surfaces: {}", surfaces);
    println!("  Players: {}", poses.len());
    for (i, pose) in poses.iter().enumerate() {
        println!(
            "    [{}] ({:.2}, {:.2}, {:.2}) heading {:.1} deg, pitch {:.1} deg",
            i,
            pose.position.x,
            pose.position.y,
            pose.position.z,
            pose.heading.to_degrees(),
            pose.pitch.to_degrees()
        );
    }

    println!("Octree:");
    println!("  Nodes: {}", stats.nodes);
    println!("  Leaves: {}", stats.leaves);
    println!("  Depth: {}", stats.max_depth);
    println!("  Largest leaf: {} surfaces", stats.max_leaf_surfaces);
    if stats.leaves > 0 {
        println!(
            "  Mean surfaces per leaf: {:.2}",
            stats.leaf_surface_refs as f64 / stats.leaves as f64
        );
    }

    Ok(())
}
