// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end session runs against the virtual camera on the virtual clock

use photo_booth::app::{
    CaptureMode, CountdownDisplay, Message, Pace, Selection, SelectionChange, Session,
    SessionEvent, SessionOptions, SessionPhase, run_session,
};
use photo_booth::backends::camera::{CaptureDevice, CaptureSettings};
use photo_booth::backends::virtual_camera::{
    FrameSource, PermissionOutcome, VirtualCamera, VirtualCameraConfig, VirtualCameraStats,
};
use photo_booth::pipelines::photo::MirrorPolicy;
use photo_booth::constants::ResolutionTier;
use photo_booth::errors::{CameraError, SessionError};
use photo_booth::storage::MemorySink;
use std::sync::Arc;
use std::time::Duration;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn options(mode: CaptureMode) -> SessionOptions {
    SessionOptions {
        settings: CaptureSettings {
            resolution_tier: ResolutionTier::Low,
            ..Default::default()
        },
        capture_mode: mode,
        viewport_width: 160,
        viewport_height: 120,
        ..Default::default()
    }
}

fn build(
    ids: &[u32],
    timer: u32,
    camera: VirtualCameraConfig,
    mode: CaptureMode,
) -> (Session, VirtualCameraStats) {
    build_with(ids, timer, camera, options(mode))
}

fn build_with(
    ids: &[u32],
    timer: u32,
    camera: VirtualCameraConfig,
    options: SessionOptions,
) -> (Session, VirtualCameraStats) {
    let mut selection = Selection::from_ids(ids).unwrap();
    selection.select_timer(timer).unwrap();
    let camera = VirtualCamera::new(camera);
    let stats = camera.stats();
    let session = Session::new(&selection, CaptureDevice::new(Box::new(camera)), options).unwrap();
    (session, stats)
}

/// Build and start a session; the permission request fires immediately
fn started(ids: &[u32], timer: u32, mode: CaptureMode) -> (Session, VirtualCameraStats) {
    let (mut session, stats) = build(ids, timer, VirtualCameraConfig::default(), mode);
    session.update(Message::Start).unwrap();
    session.run_due();
    (session, stats)
}

fn countdowns(events: &[SessionEvent]) -> Vec<CountdownDisplay> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Countdown(display) => Some(*display),
            _ => None,
        })
        .collect()
}

#[test]
fn test_two_pose_auto_session() {
    let (mut session, stats) = started(&[1, 3], 5, CaptureMode::Auto);
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 5 });
    assert_eq!(session.current_index(), 0);

    session.advance_by(secs(4));
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 1 });

    session.advance_by(secs(1));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);
    assert!(session.gallery().is_filled(0));
    assert_eq!(session.status(), "Captured Peace Sign");

    let events = session.take_events();
    assert_eq!(
        countdowns(&events),
        vec![
            CountdownDisplay::Remaining(5),
            CountdownDisplay::Remaining(4),
            CountdownDisplay::Remaining(3),
            CountdownDisplay::Remaining(2),
            CountdownDisplay::Remaining(1),
            CountdownDisplay::CaptureNow,
        ]
    );
    assert!(events.contains(&SessionEvent::Flash));

    // Review pause, then the next pose waits briefly before counting down
    session.advance_by(secs(1));
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert_eq!(session.current_index(), 1);
    session.advance_by(millis(500));
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 5 });

    session.advance_by(secs(5));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);
    assert!(session.gallery().is_complete());
    assert_eq!(session.status(), "All photos captured! Ready to finish.");

    session.advance_by(secs(1));
    assert_eq!(session.phase(), &SessionPhase::AllCaptured);
    assert_eq!(session.next_deadline(), None);

    let labels: Vec<_> = session
        .gallery()
        .all()
        .iter()
        .map(|p| p.as_ref().unwrap().label.clone())
        .collect();
    assert_eq!(labels, vec!["Peace Sign", "Hands on Hips"]);
    assert_eq!(stats.streams_started(), 1);
}

#[test]
fn test_countdown_never_increases() {
    let (mut session, _) = started(&[2], 3, CaptureMode::Auto);
    session.advance_by(secs(10));

    let values: Vec<u32> = countdowns(&session.take_events())
        .into_iter()
        .filter_map(|d| match d {
            CountdownDisplay::Remaining(n) => Some(n),
            CountdownDisplay::CaptureNow => None,
        })
        .collect();
    assert_eq!(values, vec![3, 2, 1]);
}

#[test]
fn test_permission_denied() {
    let (mut session, stats) = build(
        &[1],
        5,
        VirtualCameraConfig {
            permission: PermissionOutcome::Denied,
            ..Default::default()
        },
        CaptureMode::Auto,
    );
    session.update(Message::Start).unwrap();
    assert_eq!(session.phase(), &SessionPhase::AwaitingPermission);
    session.run_due();

    assert_eq!(
        session.phase(),
        &SessionPhase::DeviceError(CameraError::PermissionDenied)
    );
    assert_eq!(stats.streams_started(), 0);
    assert_eq!(session.next_deadline(), None);
    assert!(session.update(Message::Capture).is_err());
}

#[test]
fn test_busy_device_can_be_retried() {
    let (mut session, stats) = build(
        &[1],
        5,
        VirtualCameraConfig {
            busy: true,
            ..Default::default()
        },
        CaptureMode::Auto,
    );
    session.update(Message::Start).unwrap();
    session.run_due();
    assert_eq!(session.phase(), &SessionPhase::DeviceError(CameraError::DeviceBusy));

    session.update(Message::RetryPermission).unwrap();
    assert_eq!(session.phase(), &SessionPhase::AwaitingPermission);
    session.run_due();
    assert_eq!(session.phase(), &SessionPhase::DeviceError(CameraError::DeviceBusy));
    assert_eq!(stats.active_streams(), 0);
}

#[test]
fn test_retake_keeps_other_slots() {
    let (mut session, _) = started(&[1, 2, 3], 3, CaptureMode::Auto);
    session.advance_by(secs(60));
    assert_eq!(session.phase(), &SessionPhase::AllCaptured);

    let second = Arc::clone(session.gallery().get(1).unwrap());
    let third = Arc::clone(session.gallery().get(2).unwrap());

    session.update(Message::Retake(0)).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert_eq!(session.current_index(), 0);
    assert!(!session.gallery().is_filled(0));
    assert_eq!(session.status(), "Retake: Peace Sign");
    assert!(session.take_events().contains(&SessionEvent::SlotCleared { slot: 0 }));

    session.advance_by(secs(10));
    assert_eq!(session.phase(), &SessionPhase::AllCaptured);
    assert!(Arc::ptr_eq(session.gallery().get(1).unwrap(), &second));
    assert!(Arc::ptr_eq(session.gallery().get(2).unwrap(), &third));
    assert!(session.gallery().is_filled(0));

    assert_eq!(
        session.update(Message::Retake(5)),
        Err(SessionError::NoSuchSlot(5))
    );
}

#[test]
fn test_finish_with_blocked_export() {
    let (mut session, stats) = started(&[1, 2, 3, 4], 3, CaptureMode::Auto);

    let mut sink = MemorySink::new();
    assert!(matches!(
        session.finish(&mut sink),
        Err(SessionError::InvalidPhase { .. })
    ));

    session.advance_by(secs(60));
    assert_eq!(session.phase(), &SessionPhase::AllCaptured);

    let mut sink = MemorySink::new().block("photo-booth-2-cool-pose.jpg");
    let report = session.finish(&mut sink).unwrap();

    assert_eq!(
        report.exported,
        vec![
            "photo-booth-1-peace-sign.jpg",
            "photo-booth-3-hands-on-hips.jpg",
            "photo-booth-4-thumbs-up.jpg",
        ]
    );
    assert_eq!(report.blocked, vec!["photo-booth-2-cool-pose.jpg"]);
    assert_eq!(sink.file_names(), report.exported);
    assert!(sink.delivered.iter().all(|(_, data)| data.starts_with(&[0xFF, 0xD8])));

    assert_eq!(session.phase(), &SessionPhase::Idle);
    assert_eq!(session.gallery().filled_count(), 0);
    assert_eq!(session.status(), "Downloaded 3 photos, 1 blocked");
    assert_eq!(stats.active_streams(), 0);
}

#[test]
fn test_finish_requires_every_slot() {
    let (mut session, _) = started(&[1, 2], 3, CaptureMode::Manual);
    session.update(Message::Capture).unwrap();
    session.advance_by(secs(3));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);

    let mut sink = MemorySink::new();
    assert_eq!(
        session.finish(&mut sink),
        Err(SessionError::Incomplete {
            filled: 1,
            total: 2
        })
    );
    assert!(sink.delivered.is_empty());
}

#[test]
fn test_capture_waits_for_warmup() {
    let (mut session, stats) = build(
        &[5],
        3,
        VirtualCameraConfig {
            warmup_polls: 3,
            ..Default::default()
        },
        CaptureMode::Auto,
    );
    session.update(Message::Start).unwrap();
    session.run_due();

    session.advance_by(secs(3));
    assert_eq!(session.phase(), &SessionPhase::Capturing);

    session.advance_by(millis(300));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);

    let deferred: Vec<_> = session
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::CaptureDeferred { attempt } => Some(attempt),
            _ => None,
        })
        .collect();
    assert_eq!(deferred, vec![1, 2, 3]);
    assert_eq!(stats.frames_served(), 1);
}

#[test]
fn test_capture_gives_up_without_frames() {
    let (mut session, _) = build(
        &[5],
        3,
        VirtualCameraConfig {
            warmup_polls: 1000,
            ..Default::default()
        },
        CaptureMode::Auto,
    );
    session.update(Message::Start).unwrap();
    session.run_due();

    session.advance_by(secs(6));
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert!(session.status().starts_with("Capture failed"));
    assert!(!session.gallery().is_filled(0));
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn test_manual_mode_waits_for_controls() {
    let (mut session, _) = started(&[1, 2], 3, CaptureMode::Manual);
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert_eq!(session.status(), "Camera ready");
    assert_eq!(session.next_deadline(), None);

    session.update(Message::Capture).unwrap();
    assert_eq!(session.status(), "Capturing in 3 seconds...");
    session.advance_by(secs(3));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);
    assert_eq!(session.next_deadline(), None);

    assert!(session.update(Message::Capture).is_err());
    session.update(Message::Advance).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert_eq!(session.current_index(), 1);

    session.advance_by(secs(10));
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert!(matches!(
        session.update(Message::Advance),
        Err(SessionError::InvalidPhase { .. })
    ));
}

#[test]
fn test_capture_restarts_running_countdown() {
    let (mut session, _) = started(&[1], 5, CaptureMode::Manual);
    session.update(Message::Capture).unwrap();
    session.advance_by(secs(3));
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 2 });

    session.update(Message::Capture).unwrap();
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 5 });
    session.advance_by(secs(2));
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 3 });
}

#[test]
fn test_navigate_between_slots() {
    let (mut session, _) = started(&[1, 2], 3, CaptureMode::Manual);
    session.update(Message::Capture).unwrap();
    session.advance_by(secs(3));
    session.update(Message::Advance).unwrap();
    assert_eq!(session.current_index(), 1);

    assert_eq!(
        session.update(Message::NavigateTo(7)),
        Err(SessionError::NoSuchSlot(7))
    );

    session.update(Message::NavigateTo(0)).unwrap();
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.status(), "Viewing photo 1: Peace Sign");

    // An empty target is set up for capture
    session.update(Message::NavigateTo(1)).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.status(), "Pose 2: Cool Pose");

    // Advancing from a viewed photo returns to the empty slot
    session.update(Message::NavigateTo(0)).unwrap();
    session.update(Message::Advance).unwrap();
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.phase(), &SessionPhase::Ready);
}

#[test]
fn test_navigate_to_empty_slot_starts_countdown_in_auto_mode() {
    let (mut session, _) = started(&[1, 2, 3], 3, CaptureMode::Auto);
    assert!(session.update(Message::NavigateTo(2)).is_err());

    session.advance_by(secs(3));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);

    session.update(Message::NavigateTo(2)).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Ready);
    session.advance_by(millis(500));
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 3 });
    assert_eq!(session.current_index(), 2);
}

#[test]
fn test_pause_and_resume() {
    let (mut session, _) = started(&[1], 5, CaptureMode::Auto);
    session.advance_by(secs(2));

    session.update(Message::Pause).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Ready);
    assert!(session.is_paused());
    assert_eq!(session.next_deadline(), None);
    session.advance_by(secs(30));
    assert_eq!(session.phase(), &SessionPhase::Ready);

    session.update(Message::Resume).unwrap();
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 5 });
    session.advance_by(secs(5));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);
}

#[test]
fn test_switch_camera_holds_one_stream() {
    let (mut session, stats) = started(&[1, 2], 3, CaptureMode::Auto);
    session.advance_by(secs(1));

    session.update(Message::SwitchCamera(1)).unwrap();
    assert_eq!(stats.last_device().as_deref(), Some("virtual:1"));
    assert_eq!(stats.streams_started(), 2);
    assert_eq!(stats.active_streams(), 1);
    assert_eq!(stats.max_active_streams(), 1);

    // The interrupted countdown starts over on the new stream
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 3 });

    // Same camera again is a no-op
    session.update(Message::SwitchCamera(1)).unwrap();
    assert_eq!(stats.streams_started(), 2);

    session.update(Message::SelectResolution(ResolutionTier::High)).unwrap();
    assert_eq!(stats.streams_started(), 3);
    assert_eq!(stats.max_active_streams(), 1);
}

#[test]
fn test_cancel_releases_everything() {
    let (mut session, stats) = started(&[1, 2], 3, CaptureMode::Auto);
    session.advance_by(secs(5));
    assert!(session.gallery().is_filled(0));

    session.update(Message::Cancel).unwrap();
    assert_eq!(session.phase(), &SessionPhase::Idle);
    assert_eq!(session.gallery().filled_count(), 0);
    assert_eq!(session.next_deadline(), None);
    assert_eq!(stats.active_streams(), 0);
    assert_eq!(session.status(), "Session cancelled");

    // A cancelled session can start over
    session.update(Message::Start).unwrap();
    session.run_due();
    assert_eq!(session.phase(), &SessionPhase::CountdownRunning { remaining: 3 });
}

#[test]
fn test_selection_limit_and_toggle() {
    let mut selection = Selection::new();
    for id in 1..=4 {
        assert!(matches!(
            selection.toggle(id).unwrap(),
            SelectionChange::Added { .. }
        ));
    }
    assert_eq!(selection.toggle(5).unwrap(), SelectionChange::LimitReached);
    assert_eq!(selection.ids(), vec![1, 2, 3, 4]);

    assert_eq!(selection.toggle(3).unwrap(), SelectionChange::Removed);
    assert!(matches!(
        selection.toggle(3).unwrap(),
        SelectionChange::Added { .. }
    ));
    assert_eq!(selection.ids(), vec![1, 2, 4, 3]);
    assert_eq!(selection.counter_text(), "4/4 selected");
}

#[test]
fn test_empty_selection_cannot_start() {
    let device = CaptureDevice::new(Box::new(VirtualCamera::default()));
    assert_eq!(
        Session::new(&Selection::new(), device, SessionOptions::default()).unwrap_err(),
        SessionError::NoPosesSelected
    );
}

#[tokio::test]
async fn test_driver_runs_to_completion() {
    let (mut session, _) = build(&[1, 2], 3, VirtualCameraConfig::default(), CaptureMode::Auto);
    session.update(Message::Start).unwrap();

    let mut stored = Vec::new();
    let phase = run_session(&mut session, Pace::Virtual, None, |event| {
        if let SessionEvent::PhotoStored { slot, .. } = event {
            stored.push(*slot);
        }
    })
    .await;

    assert_eq!(phase, SessionPhase::AllCaptured);
    assert_eq!(stored, vec![0, 1]);
}

#[tokio::test]
async fn test_driver_forwards_controls() {
    let (mut session, _) = build(&[1], 3, VirtualCameraConfig::default(), CaptureMode::Manual);
    session.update(Message::Start).unwrap();
    session.run_due();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(Message::Capture).unwrap();
    tx.send(Message::Cancel).unwrap();
    drop(tx);

    let mut stored = 0;
    let phase = run_session(&mut session, Pace::Virtual, Some(rx), |event| {
        if matches!(event, SessionEvent::PhotoStored { .. }) {
            stored += 1;
        }
    })
    .await;
    // Virtual pace fires due timers before reading the next control
    assert_eq!(stored, 1);
    assert_eq!(phase, SessionPhase::Idle);
}

/// Shoot one manual photo from a gradient camera after applying `controls`
fn capture_gradient(options: SessionOptions, controls: &[Message]) -> (u32, u32, image::RgbaImage) {
    let camera = VirtualCameraConfig {
        source: FrameSource::Gradient,
        ..Default::default()
    };
    let (mut session, _) = build_with(&[1], 1, camera, options);
    session.update(Message::Start).unwrap();
    session.run_due();
    for control in controls {
        session.update(control.clone()).unwrap();
    }
    session.update(Message::Capture).unwrap();
    session.advance_by(secs(1));
    assert_eq!(session.phase(), &SessionPhase::ReviewingPhoto);

    let photo = session.gallery().get(0).unwrap();
    let decoded = image::load_from_memory(&photo.image.data).unwrap().to_rgba8();
    (photo.image.width, photo.image.height, decoded)
}

/// Red grows left to right in the gradient; true when the photo shows it reversed
fn is_flipped(photo: &image::RgbaImage) -> bool {
    let left = photo.get_pixel(10, 30).0[0];
    let right = photo.get_pixel(photo.width() - 10, 30).0[0];
    assert!(left.abs_diff(right) > 100, "gradient lost: {} vs {}", left, right);
    left > right
}

#[test]
fn test_photo_follows_mirror_toggle() {
    // Preview is mirrored by default and the photo matches it
    let (_, _, mirrored) = capture_gradient(options(CaptureMode::Manual), &[]);
    assert!(is_flipped(&mirrored));

    let (_, _, plain) = capture_gradient(options(CaptureMode::Manual), &[Message::ToggleMirror]);
    assert!(!is_flipped(&plain));
}

#[test]
fn test_raw_sensor_policy_never_mirrors() {
    let raw = SessionOptions {
        mirror_policy: MirrorPolicy::RawSensor,
        ..options(CaptureMode::Manual)
    };
    let (_, _, photo) = capture_gradient(raw, &[]);
    assert!(!is_flipped(&photo));

    let (_, _, photo) = capture_gradient(raw, &[Message::ToggleMirror]);
    assert!(!is_flipped(&photo));
}

#[test]
fn test_photo_uses_resized_viewport() {
    let (width, height, photo) = capture_gradient(
        options(CaptureMode::Manual),
        &[Message::ViewportResized {
            width: 320,
            height: 200,
        }],
    );
    assert_eq!((width, height), (320, 200));
    assert_eq!(photo.dimensions(), (320, 200));
}

#[tokio::test]
async fn test_real_time_countdown_counts_from_the_control() {
    let (mut session, _) = build(&[1], 1, VirtualCameraConfig::default(), CaptureMode::Manual);
    session.update(Message::Start).unwrap();
    session.run_due();

    // The capture control arrives after the session has idled for a while
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        tokio::time::sleep(millis(300)).await;
        let _ = tx.send(Message::Capture);
    });

    let mut started = None;
    let mut stored = None;
    let phase = run_session(&mut session, Pace::RealTime, Some(rx), |event| match event {
        SessionEvent::Countdown(CountdownDisplay::Remaining(1)) => {
            started = Some(tokio::time::Instant::now())
        }
        SessionEvent::PhotoStored { .. } => stored = Some(tokio::time::Instant::now()),
        _ => {}
    })
    .await;

    assert_eq!(phase, SessionPhase::ReviewingPhoto);
    let countdown = stored.unwrap() - started.unwrap();
    assert!(
        countdown >= millis(900),
        "one second countdown took {:?}",
        countdown
    );
}
