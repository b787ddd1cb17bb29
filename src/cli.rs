// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for photo-booth operations
//!
//! This module provides command-line functionality for:
//! - Listing the pose catalog
//! - Listing available cameras
//! - Running a complete session headlessly
//! - Compositing a single image with a pose

use photo_booth::app::{
    CaptureMode, CountdownDisplay, Message, Pace, Selection, Session, SessionEvent, SessionPhase,
    run_session,
};
use photo_booth::backends::camera::types::{CameraBackendType, CameraFrame};
use photo_booth::backends::camera::CaptureDevice;
use photo_booth::backends::virtual_camera::{self, VirtualCamera};
use photo_booth::config::Config;
use photo_booth::constants::MAX_SELECTED_POSES;
use photo_booth::errors::AppError;
use photo_booth::pipelines::photo::{
    Caption, EncodingFormat, LayoutParams, OverlayMode, PhotoEncoder, PhotoPipeline,
};
use photo_booth::poses::{self, PoseImages};
use photo_booth::storage::{DirectorySink, ExportSink};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Options of the `session` command
pub struct SessionArgs {
    pub poses: Vec<u32>,
    pub timer: Option<u32>,
    pub source: Option<PathBuf>,
    pub device: Option<usize>,
    pub output: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub manual: bool,
    pub backdrop: bool,
    pub no_mirror: bool,
    pub fast: bool,
}

/// Print the pose catalog
pub fn list_poses() -> Result<(), Box<dyn std::error::Error>> {
    println!("Available poses:");
    println!();
    for pose in poses::CATALOG.iter() {
        println!("  [{:>2}] {:<14} {}", pose.id, pose.label, pose.instruction());
    }
    Ok(())
}

/// List all available cameras of a backend
pub fn list_cameras(backend: CameraBackendType) -> Result<(), Box<dyn std::error::Error>> {
    let device = CaptureDevice::for_type(backend);
    let cameras = device.enumerate_devices();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend);
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      {}", camera.path);
        if let Some(info) = &camera.device_info {
            println!("      driver: {}  bus: {}", info.driver, info.bus_info);
        }
    }
    Ok(())
}

/// Run a whole session and export the result
pub fn run_booth(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let selection = {
        let mut selection = Selection::new();
        let refused = selection.select_all(&args.poses)?;
        if !refused.is_empty() {
            println!(
                "Pose limit reached ({} max), skipped: {}",
                MAX_SELECTED_POSES,
                refused
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        selection.select_timer(args.timer.unwrap_or(config.timer_seconds))?;
        selection
    };

    let mut options = config.session_options();
    if args.manual {
        options.capture_mode = CaptureMode::Manual;
    }
    if args.backdrop {
        options.overlay_mode = OverlayMode::Backdrop;
    }
    if args.no_mirror {
        options.settings.mirrored = false;
    }

    let device = match (&args.source, args.device) {
        (Some(path), _) => CaptureDevice::new(Box::new(VirtualCamera::from_image_file(path)?)),
        (None, Some(index)) => {
            options.settings.camera_index = index;
            CaptureDevice::for_type(CameraBackendType::V4l2)
        }
        (None, None) => CaptureDevice::for_type(config.backend),
    };

    let mut session = Session::new(&selection, device, options)?;
    if let Some(dir) = args.assets.as_ref().or(config.pose_asset_dir.as_ref()) {
        let loaded = session.pose_images_mut().preload(dir, selection.poses());
        info!(loaded, dir = %dir.display(), "Pose images loaded");
    }

    println!(
        "Session {} with {} pose(s), {} s countdown",
        session.id(),
        session.slot_count(),
        session.settings().timer_seconds
    );
    for (slot, pose) in selection.poses().iter().enumerate() {
        println!("  {}. {} - {}", slot + 1, pose.label, pose.instruction());
    }

    let controls = if args.manual {
        print_manual_help();
        Some(spawn_stdin_controls())
    } else {
        None
    };
    let pace = if args.fast { Pace::Virtual } else { Pace::RealTime };

    session.update(Message::Start)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let phase = runtime.block_on(run_session(&mut session, pace, controls, print_event));

    match phase {
        SessionPhase::AllCaptured => {
            let output = args.output.unwrap_or_else(|| config.export_dir());
            let mut sink = DirectorySink::new(&output);
            let report = session.finish(&mut sink as &mut dyn ExportSink)?;
            println!();
            println!(
                "Saved {} photo(s) to {}",
                report.exported.len(),
                sink.dir().display()
            );
            for name in &report.blocked {
                println!("  not saved: {}", name);
            }
            Ok(())
        }
        SessionPhase::DeviceError(err) => Err(AppError::from(err).into()),
        other => {
            println!("Session ended while {}", other.name());
            Ok(())
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Countdown(CountdownDisplay::Remaining(n)) => println!("  {}...", n),
        SessionEvent::Countdown(CountdownDisplay::CaptureNow) => println!("  Smile!"),
        SessionEvent::PhotoStored { slot, label } => {
            println!("  Captured photo {}: {}", slot + 1, label)
        }
        SessionEvent::OverlayShown { slot, pose_id, .. } => {
            if let Some(pose) = poses::find(*pose_id) {
                println!("Pose {}: {} ({})", slot + 1, pose.label, pose.instruction());
            }
        }
        SessionEvent::CaptureDeferred { attempt } => {
            println!("  Waiting for camera (attempt {})", attempt)
        }
        SessionEvent::Status(text) => info!(status = %text, "Status"),
        _ => {}
    }
}

fn print_manual_help() {
    println!();
    println!("Manual mode controls (type a letter and press Enter):");
    println!("  c      start the countdown");
    println!("  n      next pose");
    println!("  r N    retake photo N");
    println!("  v N    view photo N");
    println!("  p / u  pause / resume");
    println!("  m      toggle mirror");
    println!("  q      cancel the session");
    println!();
}

/// Forward stdin commands to the session driver
fn spawn_stdin_controls() -> mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_control(&line) {
                Some(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "Unknown control"),
            }
        }
    });
    rx
}

/// Map one input line to a control; slot numbers are 1-based
pub fn parse_control(line: &str) -> Option<Message> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("c");
    let mut slot = || {
        parts
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
    };
    match command {
        "c" => Some(Message::Capture),
        "n" => Some(Message::Advance),
        "r" => slot().map(Message::Retake),
        "v" => slot().map(Message::NavigateTo),
        "p" => Some(Message::Pause),
        "u" => Some(Message::Resume),
        "m" => Some(Message::ToggleMirror),
        "g" => Some(Message::ToggleGrid),
        "q" => Some(Message::Cancel),
        _ => None,
    }
}

/// Composite one still image with a pose and write it out
pub fn compose(
    frame_path: &Path,
    pose_id: u32,
    assets: Option<PathBuf>,
    output: &Path,
    backdrop: bool,
    mirror: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let pose = poses::find(pose_id).ok_or_else(|| format!("Unknown pose id {}", pose_id))?;

    let source = virtual_camera::load_image(frame_path)?;
    let frame = CameraFrame::from_image(&source);

    let mut images = PoseImages::new();
    if let Some(dir) = assets.or(config.pose_asset_dir.clone()) {
        images.load(&dir, pose);
    }

    let layout = LayoutParams {
        display_width: config.viewport_width,
        display_height: config.viewport_height,
        overlay_mode: if backdrop {
            OverlayMode::Backdrop
        } else {
            config.overlay_mode
        },
        mirrored: mirror,
    };
    let caption = Caption {
        label: pose.label.to_string(),
        slot_index: 0,
        slot_count: 1,
        timestamp: config
            .caption_timestamp
            .then(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    };

    let mut encoder = PhotoEncoder::with_quality(config.jpeg_quality);
    encoder.set_format(EncodingFormat::from_path(output));
    let encoded = PhotoPipeline::new(encoder).process(&frame, images.get(pose.id), &layout, &caption)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &encoded.data)?;
    println!(
        "Photo saved: {} ({}x{}, {} bytes)",
        output.display(),
        encoded.width,
        encoded.height,
        encoded.data.len()
    );
    Ok(())
}
