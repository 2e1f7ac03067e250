use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use maze_render::{RenderSettings, SegmentLayout};

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Layouts selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Layout {
    Columns,
    Rows,
}

impl From<Layout> for SegmentLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Columns => SegmentLayout::Columns,
            Layout::Rows => SegmentLayout::Rows,
        }
    }
}

#[derive(Parser)]
#[command(name = "maze")]
#[command(about = "Octree ray tracer for quad-surface mazes", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// TOML file with [render] and [octree] tables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render frames of a scene and write the last one as PNG
    Render(RenderArgs),
    /// Print scene and octree statistics
    Info {
        /// Scene JSON file
        scene: PathBuf,
    },
}

#[derive(Args)]
pub struct RenderArgs {
    /// Scene JSON file
    pub scene: PathBuf,

    /// Output PNG file
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,

    /// Number of frames to render; the player walks between frames
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// Index of the player start to render from
    #[arg(long, default_value_t = 0)]
    pub player: usize,

    /// Target frame rate used to scale movement
    #[arg(long, default_value_t = 61.0)]
    pub fps: f64,

    /// Heading change per frame in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub turn: f64,

    /// Screen width in pixels
    #[arg(long)]
    pub width: Option<usize>,

    /// Screen height in pixels
    #[arg(long)]
    pub height: Option<usize>,

    /// Number of workers (segments)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Segment layout
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Sparse sampling stride in pixels
    #[arg(long)]
    pub stride: Option<usize>,
}

impl RenderArgs {
    /// Apply command-line overrides on top of configured settings
    pub fn apply(&self, mut settings: RenderSettings) -> RenderSettings {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(layout) = self.layout {
            settings.layout = layout.into();
        }
        if let Some(stride) = self.stride {
            settings.sparse_stride = stride;
        }
        settings
    }
}
