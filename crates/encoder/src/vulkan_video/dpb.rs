//! Reference picture (DPB) slot bookkeeping and selection policy.
//!
//! The DPB is a fixed ring of GPU-resident reference pictures, one image
//! array layer each. Every submission picks a *setup slot* (the slot the
//! reconstructed picture is written to) by least-recently-used eviction, and
//! a *prediction reference* by the acknowledgement-driven policy:
//!
//! 1. A slot holding the last frame the remote decoder acknowledged -- the
//!    encoder then predicts only from pictures confirmed received, bounding
//!    error propagation from lost packets without a full refresh.
//! 2. While the acknowledgement channel is still filling (fewer than
//!    [`STARTUP_REFERENCE_WINDOW`] submissions since the last reset), the
//!    most recently produced registered reference.
//! 3. Otherwise a full reset: every slot is freed and the frame is encoded
//!    without a reference. This is the recovery path when the decoder has
//!    fallen silent.

use ash::vk;

use crate::vulkan_video::device::SlotDeclaration;

/// Device slot index meaning "not registered with the device".
pub const UNREGISTERED: i32 = -1;

/// Submissions allowed to chain off an unacknowledged reference before the
/// silence of the decoder forces a full reset. Policy constant; not derived
/// and not configurable.
pub const STARTUP_REFERENCE_WINDOW: u64 = 100;

/// One entry of the reference picture ring.
#[derive(Clone, Debug)]
pub struct ReferenceSlot {
    /// View of this slot's DPB image layer.
    image_view: vk::ImageView,
    /// Frame currently held, or `None` if the slot was never assigned.
    frame_index: Option<u64>,
    /// Registered device slot index, [`UNREGISTERED`] when inactive.
    device_slot: i32,
}

impl ReferenceSlot {
    fn new(image_view: vk::ImageView) -> Self {
        Self {
            image_view,
            frame_index: None,
            device_slot: UNREGISTERED,
        }
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn is_registered(&self) -> bool {
        self.device_slot != UNREGISTERED
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// LRU ordering key: occupied slots sort by `frame_index + 1`, a
    /// never-assigned slot sorts as 0 (most eligible).
    fn lru_key(&self) -> u64 {
        self.frame_index.map_or(0, |f| f + 1)
    }
}

/// Outcome of reference selection for one submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferencePick {
    /// Predict from the slot holding the last acknowledged frame.
    Acknowledged(usize),
    /// Startup fallback: predict from the newest registered reference.
    MostRecent(usize),
    /// No usable reference; reset the ring and encode a refresh frame.
    Refresh,
}

/// The fixed-size reference slot ring.
///
/// Mutated exclusively by the frame submission engine; slots are recycled
/// for the encoder's lifetime, never destroyed individually.
#[derive(Debug)]
pub struct DpbRing {
    slots: Vec<ReferenceSlot>,
}

impl DpbRing {
    pub fn new(views: Vec<vk::ImageView>) -> Self {
        debug_assert!(views.len() >= 2);
        Self {
            slots: views.into_iter().map(ReferenceSlot::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ReferenceSlot] {
        &self.slots
    }

    /// Pick the setup slot: least recently used, ties broken by the lowest
    /// slot index.
    pub fn select_setup_slot(&self) -> usize {
        let mut best = 0;
        for (index, slot) in self.slots.iter().enumerate().skip(1) {
            if slot.lru_key() < self.slots[best].lru_key() {
                best = index;
            }
        }
        best
    }

    /// Pick the prediction reference. Only registered slots are candidates;
    /// the pending setup slot must be unregistered before calling this.
    pub fn select_reference(
        &self,
        last_acknowledged: Option<u64>,
        frames_since_reset: u64,
    ) -> ReferencePick {
        if let Some(ack) = last_acknowledged {
            if let Some(index) = self
                .slots
                .iter()
                .position(|s| s.is_registered() && s.frame_index == Some(ack))
            {
                return ReferencePick::Acknowledged(index);
            }
        }

        // Avoid sending many refresh frames in a row while acknowledgements
        // are still in flight.
        if frames_since_reset < STARTUP_REFERENCE_WINDOW {
            let mut best: Option<usize> = None;
            for (index, slot) in self.slots.iter().enumerate() {
                if !slot.is_registered() {
                    continue;
                }
                match best {
                    Some(b) if self.slots[b].frame_index >= slot.frame_index => {}
                    _ => best = Some(index),
                }
            }
            if let Some(index) = best {
                return ReferencePick::MostRecent(index);
            }
        }

        ReferencePick::Refresh
    }

    /// Free every slot and drop all registrations.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.frame_index = None;
            slot.device_slot = UNREGISTERED;
        }
    }

    /// Tag a slot with the frame it now holds.
    pub fn assign(&mut self, index: usize, frame_index: u64) {
        self.slots[index].frame_index = Some(frame_index);
    }

    /// Mark a slot as pending (not registered with the device).
    pub fn unregister(&mut self, index: usize) {
        self.slots[index].device_slot = UNREGISTERED;
    }

    /// Register a slot at its ring position.
    pub fn register(&mut self, index: usize) {
        self.slots[index].device_slot = index as i32;
    }

    /// Declarations for the entire slot set, as required when a coding scope
    /// opens (unregistered slots are declared with index -1).
    pub fn declarations(&self) -> Vec<SlotDeclaration> {
        self.slots
            .iter()
            .map(|s| SlotDeclaration {
                slot_index: s.device_slot,
                image_view: s.image_view,
            })
            .collect()
    }

    /// Declaration of a single slot.
    pub fn declaration(&self, index: usize) -> SlotDeclaration {
        SlotDeclaration {
            slot_index: self.slots[index].device_slot,
            image_view: self.slots[index].image_view,
        }
    }
}
