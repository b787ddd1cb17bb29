// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use photo_booth::constants::{
    DEFAULT_TIMER_SECONDS, MAX_SELECTED_POSES, ResolutionTier, TIMER_OPTIONS, compositing, timing,
};
use std::time::Duration;

#[test]
fn test_resolution_tier_values() {
    // Test that all tiers exist (Low, Medium, High)
    assert_eq!(ResolutionTier::ALL.len(), 3);
}

#[test]
fn test_resolution_tier_ordering() {
    // Tiers are ordered from lowest to highest resolution
    let mut prev_pixels = 0u32;
    for tier in ResolutionTier::ALL {
        let (width, height) = tier.ideal_resolution();
        assert!(
            width * height > prev_pixels,
            "Tiers should be ordered from lowest to highest"
        );
        prev_pixels = width * height;
    }
}

#[test]
fn test_resolution_tier_display_names() {
    for tier in ResolutionTier::ALL {
        assert!(!tier.display_name().is_empty());
    }
}

#[test]
fn test_selection_limits() {
    assert_eq!(MAX_SELECTED_POSES, 4);
    assert!(TIMER_OPTIONS.iter().all(|&s| s > 0));
    assert!(TIMER_OPTIONS.contains(&DEFAULT_TIMER_SECONDS));
}

#[test]
fn test_timing() {
    assert_eq!(timing::COUNTDOWN_TICK, Duration::from_secs(1));
    assert_eq!(timing::CAPTURE_RETRY_DELAY, Duration::from_millis(100));
    assert!(timing::MAX_CAPTURE_RETRIES > 0);
    assert!(timing::NEXT_POSE_DELAY < timing::REVIEW_PAUSE);
}

#[test]
fn test_compositing() {
    assert_eq!(compositing::JPEG_QUALITY, 90);
    assert_eq!(compositing::CAPTION_BAND_HEIGHT, 60);
    assert!((compositing::OVERLAY_ALPHA - 0.7).abs() < f32::EPSILON);
    assert!((compositing::OVERLAY_SIZE_RATIO - 0.8).abs() < f32::EPSILON);
}
