// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `~/.config/photo-booth/config.json`. Missing fields take
//! their defaults, so older files keep loading after new settings are added.

use crate::app::{CaptureMode, SessionOptions};
use crate::backends::camera::types::{CameraBackendType, CaptureSettings, FacingMode};
use crate::constants::{DEFAULT_TIMER_SECONDS, ResolutionTier, compositing};
use crate::errors::ConfigError;
use crate::pipelines::photo::{LayoutParams, MirrorPolicy, OverlayMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "photo-booth";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown length in seconds
    pub timer_seconds: u32,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    pub resolution_tier: ResolutionTier,
    pub facing_mode: FacingMode,
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Pose guide on top of the frame, or pose backdrop beneath it
    pub overlay_mode: OverlayMode,
    /// Whether saved photos follow the mirrored preview
    pub mirror_policy: MirrorPolicy,
    pub capture_mode: CaptureMode,
    /// Output size of composited photos
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Add a capture time line to the caption band
    pub caption_timestamp: bool,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Export directory (None = ~/Pictures/photo-booth)
    pub export_dir: Option<PathBuf>,
    /// Directory holding the `poses/` images
    pub pose_asset_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer_seconds: DEFAULT_TIMER_SECONDS,
            mirror_preview: true,
            resolution_tier: ResolutionTier::Medium,
            facing_mode: FacingMode::User,
            backend: CameraBackendType::default(),
            overlay_mode: OverlayMode::ReferenceOverlay,
            mirror_policy: MirrorPolicy::MatchPreview,
            capture_mode: CaptureMode::Auto,
            viewport_width: 1280,
            viewport_height: 720,
            caption_timestamp: false,
            jpeg_quality: compositing::JPEG_QUALITY,
            export_dir: None,
            pose_asset_dir: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the user config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            debug!("No config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config.sanitized())
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path =
            Self::path().ok_or_else(|| ConfigError::Io("no config directory".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Clamp values a hand-edited file may get wrong
    fn sanitized(mut self) -> Self {
        if self.timer_seconds == 0 {
            warn!("timer_seconds must be positive, using default");
            self.timer_seconds = DEFAULT_TIMER_SECONDS;
        }
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.viewport_width = self.viewport_width.max(1);
        self.viewport_height = self.viewport_height.max(1);
        self
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            timer_seconds: self.timer_seconds.max(1),
            mirrored: self.mirror_preview,
            resolution_tier: self.resolution_tier,
            camera_index: 0,
            facing: self.facing_mode,
        }
    }

    pub fn layout(&self) -> LayoutParams {
        LayoutParams {
            display_width: self.viewport_width,
            display_height: self.viewport_height,
            overlay_mode: self.overlay_mode,
            mirrored: self.mirror_policy.applies(self.mirror_preview),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            settings: self.capture_settings(),
            capture_mode: self.capture_mode,
            overlay_mode: self.overlay_mode,
            mirror_policy: self.mirror_policy,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            caption_timestamp: self.caption_timestamp,
            jpeg_quality: self.jpeg_quality,
        }
    }

    /// Where exported photos go
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(crate::storage::default_export_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"timer_seconds": 10}"#).unwrap();
        assert_eq!(config.timer_seconds, 10);
        assert!(config.mirror_preview);
        assert_eq!(config.overlay_mode, OverlayMode::ReferenceOverlay);
    }

    #[test]
    fn test_sanitized() {
        let config = Config {
            timer_seconds: 0,
            jpeg_quality: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.timer_seconds, DEFAULT_TIMER_SECONDS);
        assert_eq!(config.jpeg_quality, 1);
    }

    #[test]
    fn test_layout_follows_mirror_policy() {
        let mut config = Config::default();
        assert!(config.layout().mirrored);
        config.mirror_policy = MirrorPolicy::RawSensor;
        assert!(!config.layout().mirrored);
    }
}
