// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Opens `/dev/video*` capture nodes with the `v4l` crate and runs a
//! memory-mapped capture loop on a background thread. The loop converts each
//! buffer to RGBA and keeps only the latest frame.

use super::types::*;
use super::CameraBackend;
use crate::constants::timing;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// How long `start_stream` waits for the capture thread to start streaming
const STREAM_START_TIMEOUT: Duration = Duration::from_secs(5);

struct ActiveStream {
    id: StreamId,
    stop_signal: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
    thread: Option<JoinHandle<()>>,
}

impl ActiveStream {
    fn stop(mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(stream = self.id.0, "V4L2 capture thread panicked");
            }
        }
    }
}

/// V4L2 backend holding at most one capture thread
pub struct V4l2Backend {
    next_id: u64,
    active: Option<ActiveStream>,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: None,
        }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        Path::new("/dev").exists()
    }

    fn request_access(&mut self) -> BackendResult<()> {
        // Device nodes are guarded by file permissions; opening one is the prompt.
        for path in video_node_paths() {
            match std::fs::File::open(&path) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    debug!(path = %path, "No permission for video node");
                    return Err(BackendError::AccessDenied(format!("{}: {}", path, e)));
                }
                Err(e) => debug!(path = %path, error = %e, "Skipping video node"),
            }
        }
        Ok(())
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut cameras = Vec::new();
        for path in video_node_paths() {
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                continue;
            }
            debug!(path = %path, card = %caps.card, "Found V4L2 capture device");
            cameras.push(CameraDevice {
                name: caps.card.clone(),
                path: path.clone(),
                facing: None,
                device_info: Some(DeviceInfo {
                    card: caps.card.clone(),
                    driver: caps.driver.clone(),
                    bus_info: caps.bus.clone(),
                }),
            });
        }
        cameras
    }

    fn start_stream(
        &mut self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<StreamHandle> {
        if let Some(active) = self.active.take() {
            warn!(stream = active.id.0, "Stopping stale stream before opening a new one");
            active.stop();
        }

        let dev = Device::with_path(&device.path)?;
        let format = negotiate_format(&dev, constraints)?;
        info!(
            path = %device.path,
            width = format.width,
            height = format.height,
            fourcc = ?format.fourcc,
            "V4L2 format configured"
        );

        let id = StreamId(self.next_id);
        self.next_id += 1;

        let stop_signal = Arc::new(AtomicBool::new(false));
        let latest_frame = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = {
            let stop_signal = Arc::clone(&stop_signal);
            let latest_frame = Arc::clone(&latest_frame);
            std::thread::Builder::new()
                .name(format!("v4l2-capture-{}", id.0))
                .spawn(move || capture_loop(dev, format, stop_signal, latest_frame, ready_tx))
                .map_err(|e| BackendError::Other(format!("Failed to spawn capture thread: {}", e)))?
        };

        let mut active = ActiveStream {
            id,
            stop_signal,
            latest_frame,
            thread: Some(thread),
        };

        match ready_rx.recv_timeout(STREAM_START_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                active.stop();
                return Err(e);
            }
            Err(_) => {
                active.stop_signal.store(true, Ordering::SeqCst);
                // Leave the thread detached; it exits on its next buffer.
                active.thread.take();
                return Err(BackendError::NotReadable(
                    "Timed out waiting for stream start".to_string(),
                ));
            }
        }

        self.active = Some(active);
        Ok(StreamHandle {
            id,
            device: device.clone(),
            width: format.width,
            height: format.height,
        })
    }

    fn stop_stream(&mut self, id: StreamId) {
        if self.active.as_ref().is_some_and(|a| a.id == id) {
            if let Some(active) = self.active.take() {
                active.stop();
                info!(stream = id.0, "V4L2 stream stopped");
            }
        }
    }

    fn latest_frame(&mut self, id: StreamId) -> Option<CameraFrame> {
        let active = self.active.as_ref().filter(|a| a.id == id)?;
        active.latest_frame.lock().ok()?.clone()
    }
}

impl Drop for V4l2Backend {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop();
        }
    }
}

/// Sorted `/dev/video*` paths
fn video_node_paths() -> Vec<String> {
    let mut paths: Vec<String> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with("video")
                .then(|| e.path().to_string_lossy().to_string())
        })
        .collect();
    paths.sort();
    paths
}

/// Ask for YUYV at the ideal size, falling back to MJPG
fn negotiate_format(dev: &Device, constraints: &StreamConstraints) -> BackendResult<Format> {
    let fourcc_yuyv = FourCC::new(b"YUYV");
    let fourcc_mjpg = FourCC::new(b"MJPG");

    for fourcc in [fourcc_yuyv, fourcc_mjpg] {
        let wanted = Format::new(constraints.width, constraints.height, fourcc);
        match dev.set_format(&wanted) {
            Ok(actual) if actual.fourcc == fourcc => return Ok(actual),
            Ok(actual) => debug!(wanted = ?fourcc, got = ?actual.fourcc, "Format not accepted"),
            Err(e) => debug!(fourcc = ?fourcc, error = %e, "Failed to set format"),
        }
    }

    Err(BackendError::FormatNotSupported(
        "device offers neither YUYV nor MJPG".to_string(),
    ))
}

/// Capture loop running in a separate thread
fn capture_loop(
    dev: Device,
    format: Format,
    stop_signal: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
    ready: mpsc::Sender<BackendResult<()>>,
) {
    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, 4) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(BackendError::from(e)));
            return;
        }
    };

    let width = format.width;
    let height = format.height;
    let is_mjpg = format.fourcc == FourCC::new(b"MJPG");
    let mut frame_count: u64 = 0;

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to capture V4L2 frame");
                std::thread::sleep(timing::STREAM_POLL_INTERVAL);
                continue;
            }
        };

        let rgba = if is_mjpg {
            match image::load_from_memory(buf) {
                Ok(img) => img.to_rgba8().into_raw(),
                Err(e) => {
                    debug!(error = %e, "Dropping undecodable MJPG frame");
                    continue;
                }
            }
        } else {
            yuyv_to_rgba(buf, width, height)
        };

        if rgba.len() < (width * height * 4) as usize {
            debug!(got = rgba.len(), "Dropping short frame");
            continue;
        }

        let frame = CameraFrame {
            width,
            height,
            data: Arc::from(rgba.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        };

        if let Ok(mut guard) = latest_frame.lock() {
            *guard = Some(frame);
        }

        frame_count += 1;
        if frame_count == 1 {
            debug!("First V4L2 frame received");
        }
    }

    info!(frames = frame_count, "V4L2 capture loop stopped");
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    rgba
}
