// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photo_booth::backends::camera::types::CameraBackendType;
use photo_booth::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photo-booth")]
#[command(about = "Pose-guided photo booth for the camera")]
#[command(version = app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pose catalog
    Poses,

    /// List available cameras
    Cameras {
        /// Backend to query
        #[arg(short, long, value_enum, default_value = "v4l2")]
        backend: BackendArg,
    },

    /// Run a photo session and export the photos
    Session {
        /// Pose ids in capture order (up to four), e.g. 1,3
        #[arg(short, long, value_delimiter = ',', required = true)]
        poses: Vec<u32>,

        /// Countdown length in seconds
        #[arg(short, long)]
        timer: Option<u32>,

        /// Use a still image as the camera
        #[arg(short, long, conflicts_with = "device")]
        source: Option<PathBuf>,

        /// V4L2 camera index to use (from 'photo-booth cameras')
        #[arg(short, long)]
        device: Option<usize>,

        /// Export directory (default: ~/Pictures/photo-booth)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory containing the poses/ images
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Start each countdown from the keyboard instead of automatically
        #[arg(long)]
        manual: bool,

        /// Draw the pose behind the camera frame
        #[arg(long)]
        backdrop: bool,

        /// Do not mirror the photos
        #[arg(long)]
        no_mirror: bool,

        /// Skip the waiting (virtual time)
        #[arg(long)]
        fast: bool,
    },

    /// Composite one image with a pose
    Compose {
        /// Image used as the camera frame
        frame: PathBuf,

        /// Pose id
        #[arg(short, long)]
        pose: u32,

        /// Directory containing the poses/ images
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Output file (.jpg or .png)
        #[arg(short, long, default_value = "photo-booth.jpg")]
        output: PathBuf,

        /// Draw the pose behind the frame
        #[arg(long)]
        backdrop: bool,

        /// Mirror the frame horizontally
        #[arg(long)]
        mirror: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BackendArg {
    V4l2,
    Virtual,
}

impl From<BackendArg> for CameraBackendType {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::V4l2 => CameraBackendType::V4l2,
            BackendArg::Virtual => CameraBackendType::Virtual,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photo_booth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poses => cli::list_poses(),
        Commands::Cameras { backend } => cli::list_cameras(backend.into()),
        Commands::Session {
            poses,
            timer,
            source,
            device,
            output,
            assets,
            manual,
            backdrop,
            no_mirror,
            fast,
        } => cli::run_booth(cli::SessionArgs {
            poses,
            timer,
            source,
            device,
            output,
            assets,
            manual,
            backdrop,
            no_mirror,
            fast,
        }),
        Commands::Compose {
            frame,
            pose,
            assets,
            output,
            backdrop,
            mirror,
        } => cli::compose(&frame, pose, assets, &output, backdrop, mirror),
    }
}
