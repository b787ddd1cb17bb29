// SPDX-License-Identifier: GPL-3.0-only

//! Pose catalog and decoded pose images
//!
//! The catalog is static; pose images are decoded on demand and cached so the
//! compositor can ask whether a pose is ready to draw.

use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A reference pose the subject imitates for one photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose {
    pub id: u32,
    /// Asset path relative to the pose asset directory
    pub asset_ref: &'static str,
    pub label: &'static str,
}

impl Pose {
    /// Posing hint shown under the pose name
    pub fn instruction(&self) -> &'static str {
        instruction_for(self.label)
    }
}

/// The fixed catalog of 20 poses
pub const CATALOG: [Pose; 20] = [
    Pose { id: 1, asset_ref: "poses/pose1.webp", label: "Peace Sign" },
    Pose { id: 2, asset_ref: "poses/pose2.webp", label: "Cool Pose" },
    Pose { id: 3, asset_ref: "poses/pose3.webp", label: "Hands on Hips" },
    Pose { id: 4, asset_ref: "poses/pose4.webp", label: "Thumbs Up" },
    Pose { id: 5, asset_ref: "poses/pose5.webp", label: "Jumping" },
    Pose { id: 6, asset_ref: "poses/pose6.webp", label: "Silly Face" },
    Pose { id: 7, asset_ref: "poses/pose7.webp", label: "Superhero" },
    Pose { id: 8, asset_ref: "poses/pose8.webp", label: "Dancing" },
    Pose { id: 9, asset_ref: "poses/pose9.webp", label: "Thinking" },
    Pose { id: 10, asset_ref: "poses/pose10.webp", label: "Winking" },
    Pose { id: 11, asset_ref: "poses/pose11.webp", label: "Heart Hands" },
    Pose { id: 12, asset_ref: "poses/pose12.webp", label: "Surprised" },
    Pose { id: 13, asset_ref: "poses/pose13.webp", label: "Flexing" },
    Pose { id: 14, asset_ref: "poses/pose14.webp", label: "Blowing Kiss" },
    Pose { id: 15, asset_ref: "poses/pose15.webp", label: "Pointing" },
    Pose { id: 16, asset_ref: "poses/pose16.webp", label: "Celebration" },
    Pose { id: 17, asset_ref: "poses/pose17.webp", label: "Model Pose" },
    Pose { id: 18, asset_ref: "poses/pose18.webp", label: "Group Hug" },
    Pose { id: 19, asset_ref: "poses/pose19.webp", label: "Sitting Pose" },
    Pose { id: 20, asset_ref: "poses/pose20.webp", label: "Action Pose" },
];

/// Look up a catalog pose by id
pub fn find(id: u32) -> Option<&'static Pose> {
    CATALOG.iter().find(|pose| pose.id == id)
}

fn instruction_for(label: &str) -> &'static str {
    match label {
        "Peace Sign" => "Show your peace sign with a big smile!",
        "Cool Pose" => "Put on your sunglasses attitude!",
        "Hands on Hips" => "Stand confidently with hands on your hips",
        "Thumbs Up" => "Give a thumbs up and smile!",
        "Jumping" => "Jump in the air with excitement!",
        "Silly Face" => "Make your funniest face!",
        "Superhero" => "Strike a powerful superhero pose!",
        "Dancing" => "Show your best dance move!",
        "Thinking" => "Look thoughtful with hand on chin",
        "Winking" => "Wink at the camera playfully",
        "Heart Hands" => "Make a heart shape with your hands",
        "Surprised" => "Open your mouth wide in surprise!",
        "Flexing" => "Show off your muscles!",
        "Blowing Kiss" => "Blow a kiss to the camera",
        "Pointing" => "Point at the camera confidently",
        "Celebration" => "Throw your hands up in celebration!",
        "Model Pose" => "Strike a fashion model pose",
        "Group Hug" => "Pretend you're hugging friends",
        "Sitting Pose" => "Imagine sitting elegantly",
        "Action Pose" => "Show some action movie energy!",
        _ => "Get ready for automatic capture!",
    }
}

/// Decoded pose images keyed by pose id
#[derive(Debug, Default, Clone)]
pub struct PoseImages {
    images: HashMap<u32, RgbaImage>,
}

impl PoseImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already decoded image for a pose
    pub fn insert(&mut self, pose_id: u32, image: RgbaImage) {
        self.images.insert(pose_id, image);
    }

    /// Drop a cached image (used when a pose is deselected)
    pub fn remove(&mut self, pose_id: u32) {
        self.images.remove(&pose_id);
    }

    /// Whether the pose image can be drawn right now
    pub fn is_ready(&self, pose_id: u32) -> bool {
        self.images
            .get(&pose_id)
            .is_some_and(|img| img.width() > 0 && img.height() > 0)
    }

    /// Natural pixel dimensions of a loaded pose image
    pub fn dimensions(&self, pose_id: u32) -> Option<(u32, u32)> {
        self.images.get(&pose_id).map(|img| img.dimensions())
    }

    pub fn get(&self, pose_id: u32) -> Option<&RgbaImage> {
        self.images.get(&pose_id).filter(|_| self.is_ready(pose_id))
    }

    /// Decode `pose.asset_ref` under `asset_dir`
    ///
    /// Failures are logged and leave the pose unloaded; photos for that pose
    /// are then composited without the pose layer.
    pub fn load(&mut self, asset_dir: &Path, pose: &Pose) -> bool {
        let path = asset_dir.join(pose.asset_ref);
        match image::open(&path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                debug!(
                    pose_id = pose.id,
                    width = rgba.width(),
                    height = rgba.height(),
                    "Pose image loaded"
                );
                self.images.insert(pose.id, rgba);
                true
            }
            Err(e) => {
                warn!(pose_id = pose.id, path = %path.display(), error = %e, "Failed to load pose image");
                false
            }
        }
    }

    /// Preload every pose in `poses`, returning how many decoded
    pub fn preload<'a>(&mut self, asset_dir: &Path, poses: impl IntoIterator<Item = &'a Pose>) -> usize {
        let loaded = poses
            .into_iter()
            .filter(|pose| self.load(asset_dir, pose))
            .count();
        info!(loaded, "Pose images preloaded");
        loaded
    }
}
