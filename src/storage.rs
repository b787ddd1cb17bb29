// SPDX-License-Identifier: MPL-2.0

//! Export of finished photos
//!
//! Each filled slot becomes one file named from its slot number and pose
//! label. A file the sink refuses is logged and skipped; the rest of the
//! batch still goes out.

use crate::app::gallery::CapturedPhoto;
use crate::constants::compositing::EXPORT_PREFIX;
use crate::errors::ExportError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host capability that delivers one encoded photo under a file name
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, data: &[u8]) -> Result<(), ExportError>;
}

/// Writes exports into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, data: &[u8]) -> Result<(), ExportError> {
        let blocked = |e: std::io::Error| ExportError::Blocked {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        };
        std::fs::create_dir_all(&self.dir).map_err(blocked)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, data).map_err(blocked)?;
        debug!(path = %path.display(), bytes = data.len(), "Photo written");
        Ok(())
    }
}

/// In-memory sink that can refuse chosen file names
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub delivered: Vec<(String, Vec<u8>)>,
    blocked: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any delivery of `file_name`
    pub fn block(mut self, file_name: impl Into<String>) -> Self {
        self.blocked.insert(file_name.into());
        self
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.delivered.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, file_name: &str, data: &[u8]) -> Result<(), ExportError> {
        if self.blocked.contains(file_name) {
            return Err(ExportError::Blocked {
                file_name: file_name.to_string(),
                reason: "blocked by host".to_string(),
            });
        }
        self.delivered.push((file_name.to_string(), data.to_vec()));
        Ok(())
    }
}

/// What happened to each filled slot during an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: Vec<String>,
    pub blocked: Vec<String>,
}

/// Lowercase, whitespace runs to one hyphen, path separators to hyphens
pub fn sanitize_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase().replace(['/', '\\'], "-");
    lowered.split_whitespace().collect::<Vec<_>>().join("-")
}

/// `photo-booth-{slot + 1}-{label}` plus the format extension
pub fn export_file_name(photo: &CapturedPhoto) -> String {
    format!(
        "{}-{}-{}.{}",
        EXPORT_PREFIX,
        photo.slot_index + 1,
        sanitize_label(&photo.label),
        photo.image.format.extension()
    )
}

/// Deliver every filled slot; empty slots are skipped
pub fn export_all(
    slots: &[Option<Arc<CapturedPhoto>>],
    sink: &mut dyn ExportSink,
) -> ExportReport {
    let mut report = ExportReport::default();

    for photo in slots.iter().flatten() {
        let file_name = export_file_name(photo);
        match sink.deliver(&file_name, &photo.image.data) {
            Ok(()) => {
                info!(file = %file_name, "Photo exported");
                report.exported.push(file_name);
            }
            Err(e) => {
                warn!(error = %e, "Export skipped");
                report.blocked.push(file_name);
            }
        }
    }

    info!(
        exported = report.exported.len(),
        blocked = report.blocked.len(),
        "Export finished"
    );
    report
}

/// Default export directory: `~/Pictures/photo-booth`, or the working directory
pub fn default_export_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(EXPORT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::{EncodedImage, EncodingFormat};

    fn photo(slot: usize, label: &str) -> Arc<CapturedPhoto> {
        Arc::new(CapturedPhoto {
            image: EncodedImage {
                data: vec![0xFF, 0xD8, slot as u8],
                format: EncodingFormat::Jpeg,
                width: 1,
                height: 1,
            },
            label: label.to_string(),
            pose_id: 1,
            slot_index: slot,
        })
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Peace Sign"), "peace-sign");
        assert_eq!(sanitize_label("  Hands  on\tHips "), "hands-on-hips");
        assert_eq!(sanitize_label("AC/DC"), "ac-dc");
    }

    #[test]
    fn test_export_skips_empty_slots() {
        let slots = vec![Some(photo(0, "Wave")), None, Some(photo(2, "Thumbs Up"))];
        let mut sink = MemorySink::new();
        let report = export_all(&slots, &mut sink);
        assert_eq!(
            sink.file_names(),
            vec!["photo-booth-1-wave.jpg", "photo-booth-3-thumbs-up.jpg"]
        );
        assert!(report.blocked.is_empty());
    }

    #[test]
    fn test_blocked_file_does_not_abort() {
        let slots = vec![Some(photo(0, "A")), Some(photo(1, "B"))];
        let mut sink = MemorySink::new().block("photo-booth-1-a.jpg");
        let report = export_all(&slots, &mut sink);
        assert_eq!(report.blocked, vec!["photo-booth-1-a.jpg"]);
        assert_eq!(report.exported, vec!["photo-booth-2-b.jpg"]);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = std::env::temp_dir().join(format!("photo-booth-export-{}", uuid::Uuid::new_v4()));
        let mut sink = DirectorySink::new(&dir);
        let report = export_all(&[Some(photo(0, "Wave"))], &mut sink);
        assert_eq!(report.exported.len(), 1);
        let written = std::fs::read(dir.join("photo-booth-1-wave.jpg")).unwrap();
        assert_eq!(written, vec![0xFF, 0xD8, 0]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
