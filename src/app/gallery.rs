// SPDX-License-Identifier: GPL-3.0-only

//! Finished photos in slot order

use crate::pipelines::photo::EncodedImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// One composited photo, immutable once stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub image: EncodedImage,
    pub label: String,
    pub pose_id: u32,
    pub slot_index: usize,
}

/// Slot-indexed photo strip
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    slots: Vec<Option<Arc<CapturedPhoto>>>,
}

impl Gallery {
    /// Gallery with `slot_count` empty slots
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Put a photo into its slot, replacing whatever was there
    ///
    /// Returns false when the slot does not exist.
    pub fn store(&mut self, slot: usize, photo: CapturedPhoto) -> bool {
        let Some(entry) = self.slots.get_mut(slot) else {
            warn!(slot, slots = self.slots.len(), "Photo for unknown slot dropped");
            return false;
        };
        debug!(slot, label = %photo.label, "Photo stored");
        *entry = Some(Arc::new(photo));
        true
    }

    /// Empty one slot, returning the photo it held
    pub fn retake(&mut self, slot: usize) -> Option<Arc<CapturedPhoto>> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn get(&self, slot: usize) -> Option<&Arc<CapturedPhoto>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn all(&self) -> &[Option<Arc<CapturedPhoto>>] {
        &self.slots
    }

    pub fn is_filled(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Every slot holds a photo (and there is at least one slot)
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Option::is_some)
    }

    /// First empty slot after `slot`, wrapping around; `slot` itself is checked last
    pub fn next_empty_after(&self, slot: usize) -> Option<usize> {
        let len = self.slots.len();
        (1..=len)
            .map(|step| (slot + step) % len)
            .find(|&index| self.slots[index].is_none())
    }

    /// Drop every photo, keeping the slot count
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::EncodingFormat;

    fn photo(slot: usize) -> CapturedPhoto {
        CapturedPhoto {
            image: EncodedImage {
                data: vec![slot as u8],
                format: EncodingFormat::Jpeg,
                width: 1,
                height: 1,
            },
            label: format!("Pose {}", slot),
            pose_id: slot as u32 + 1,
            slot_index: slot,
        }
    }

    #[test]
    fn test_store_and_retake() {
        let mut gallery = Gallery::new(3);
        assert!(gallery.store(0, photo(0)));
        assert!(gallery.store(2, photo(2)));
        assert!(!gallery.store(3, photo(3)));
        assert_eq!(gallery.filled_count(), 2);

        let removed = gallery.retake(0).unwrap();
        assert_eq!(removed.slot_index, 0);
        assert!(gallery.retake(0).is_none());
        assert!(gallery.is_filled(2));
    }

    #[test]
    fn test_completion() {
        let mut gallery = Gallery::new(2);
        assert!(!gallery.is_complete());
        gallery.store(0, photo(0));
        gallery.store(1, photo(1));
        assert!(gallery.is_complete());
        assert!(!Gallery::new(0).is_complete());
    }

    #[test]
    fn test_next_empty_wraps() {
        let mut gallery = Gallery::new(4);
        gallery.store(1, photo(1));
        gallery.store(2, photo(2));
        assert_eq!(gallery.next_empty_after(1), Some(3));
        gallery.store(3, photo(3));
        assert_eq!(gallery.next_empty_after(1), Some(0));
        gallery.store(0, photo(0));
        assert_eq!(gallery.next_empty_after(0), None);
        assert_eq!(Gallery::new(0).next_empty_after(0), None);
    }
}
