//! The Vulkan Video encode orchestrator.
//!
//! `VulkanVideoEncoder` owns the encode session and drives the per-frame
//! submission algorithm: bounded waits on the in-flight ring, LRU setup-slot
//! eviction, acknowledgement-driven reference selection, and recording of
//! the coding scope through the injected [`EncodeDevice`].
//!
//! Submission is strictly sequential per encoder (all methods take
//! `&mut self`); parallelism is bounded by the in-flight ring depth. The
//! only state shared with other threads is the [`FeedbackTracker`], which
//! the network receive path updates lock-free.

use std::collections::HashMap;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use fv_common::{DecoderFeedback, EncoderConfig, TimeCode};

use crate::codec::{params_for, CodecParams};
use crate::error::{DeviceError, EncodeError};
use crate::vulkan_video::device::{EncodeCommand, EncodeDevice};
use crate::vulkan_video::dpb::{DpbRing, ReferencePick};
use crate::vulkan_video::feedback::FeedbackTracker;
use crate::vulkan_video::rate_control::{negotiate, RateControlConfig};
use crate::vulkan_video::session::SessionResources;

/// Bounded wait for a ring slot's completion fence. Exceeding it is fatal
/// for the affected call; ring state is not safely reusable after a timeout.
const COMPLETION_TIMEOUT_NS: u64 = 1_000_000_000;

/// A source frame handed in by the rendering pipeline.
#[derive(Copy, Clone, Debug)]
pub struct SourceFrame {
    /// The rendered YUV image. Owned externally; the pool of source images
    /// is small and stable, so views of them are cached for the encoder's
    /// lifetime.
    pub image: vk::Image,
    /// Presentation timestamp of the frame.
    pub timestamp: TimeCode,
}

/// One encoded access unit, viewing the host-mapped output buffer.
///
/// The view borrows the encoder: it must be consumed (packetized) before the
/// next submission, which matches the rule that a ring slot may not be
/// reused while its output is still being read.
#[derive(Debug)]
pub struct EncodedFrame<'a> {
    pub bytes: &'a [u8],
    /// Whether the device overrode any requested parameter.
    pub has_overrides: bool,
}

/// Counters for one encoder's lifetime.
#[derive(Copy, Clone, Debug, Default)]
pub struct EncoderStats {
    /// Total frames submitted.
    pub frames_submitted: u64,
    /// Caller-forced refreshes.
    pub forced_refreshes: u64,
    /// Full DPB resets (including the implicit one on the first frame).
    pub full_resets: u64,
}

/// Per-ring-slot bookkeeping.
#[derive(Copy, Clone, Debug, Default)]
struct InFlight {
    submitted: bool,
    frame_index: u64,
}

/// Hardware video encoder driving a Vulkan Video encode session.
pub struct VulkanVideoEncoder<D: EncodeDevice> {
    device: D,
    params: Box<dyn CodecParams>,
    resources: SessionResources,
    rate_control: Option<RateControlConfig>,
    dpb: DpbRing,
    feedback: Arc<FeedbackTracker>,
    /// Views of source images, keyed by image identity. Never evicted; the
    /// source pool is externally managed and small.
    source_views: HashMap<vk::Image, vk::ImageView>,
    in_flight: Vec<InFlight>,
    /// Submissions since the last full DPB reset.
    frames_since_reset: u64,
    /// Whether the one-time session reset and DPB layout transition have
    /// been recorded.
    session_state_initialized: bool,
    stats: EncoderStats,
}

impl<D: EncodeDevice> std::fmt::Debug for VulkanVideoEncoder<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanVideoEncoder")
            .field("codec", &self.params.codec())
            .field("coded_rect", &self.resources.coded_rect())
            .field("rate_control", &self.rate_control)
            .field("dpb_slots", &self.dpb.len())
            .field("in_flight", &self.in_flight.len())
            .field("frames_submitted", &self.stats.frames_submitted)
            .field("session_state_initialized", &self.session_state_initialized)
            .finish()
    }
}

impl<D: EncodeDevice> VulkanVideoEncoder<D> {
    /// Create the encoder: negotiate rate control against the device's
    /// capabilities and initialize all session resources.
    ///
    /// # Errors
    ///
    /// Configuration and resource errors abort startup; see
    /// [`SessionResources::initialize`]. An inconsistent rate-control
    /// capability report is recovered by downgrading to the device default
    /// and is not an error.
    pub fn new(mut device: D, config: &EncoderConfig) -> Result<Self, EncodeError> {
        config.validate()?;

        let caps = device.encode_capabilities()?;
        let rate_control = negotiate(caps, config.bitrate, config.fps);

        let resources = SessionResources::initialize(
            &mut device,
            config.codec,
            config.resolution,
            config.num_dpb_slots,
        )?;
        let dpb = DpbRing::new(resources.dpb_views.clone());

        info!(
            codec = config.codec.display_name(),
            resolution = %config.resolution,
            fps = %config.fps,
            rate_control = ?rate_control.as_ref().map(|rc| rc.mode),
            "Vulkan Video encoder created"
        );

        Ok(Self {
            device,
            params: params_for(config.codec),
            resources,
            rate_control,
            dpb,
            feedback: Arc::new(FeedbackTracker::new()),
            source_views: HashMap::new(),
            in_flight: vec![InFlight::default(); config.in_flight_frames as usize],
            frames_since_reset: 0,
            session_state_initialized: false,
            stats: EncoderStats::default(),
        })
    }

    /// Submit one frame for encoding into the given in-flight ring slot.
    ///
    /// Blocks (bounded, 1 s) until the slot's previous submission completed.
    /// `force_refresh` triggers the codec's out-of-band refresh side channel
    /// before the frame is recorded.
    ///
    /// # Errors
    ///
    /// [`EncodeError::CompletionTimeout`] if the slot's previous work did not
    /// complete in time; the encoder must then be recreated, no retry is
    /// attempted. Device errors are propagated as-is.
    pub fn submit_frame(
        &mut self,
        frame: &SourceFrame,
        frame_index: u64,
        force_refresh: bool,
        ring_slot: u32,
    ) -> Result<(), EncodeError> {
        let slot = self.check_ring_slot(ring_slot)?;
        if self.in_flight[slot].submitted {
            self.wait_slot(ring_slot)?;
        }

        if force_refresh {
            self.params.signal_refresh();
            self.stats.forced_refreshes += 1;
        }

        // Evict the least recently used slot and take it out of the
        // reference candidate set before selecting a reference.
        let setup = self.dpb.select_setup_slot();
        self.dpb.unregister(setup);

        let pick = self
            .dpb
            .select_reference(self.feedback.last_acknowledged(), self.frames_since_reset);
        let reference = match pick {
            ReferencePick::Acknowledged(index) | ReferencePick::MostRecent(index) => Some(index),
            ReferencePick::Refresh => {
                self.dpb.reset();
                self.frames_since_reset = 0;
                self.stats.full_resets += 1;
                debug!(frame_index, "No usable reference, encoding a refresh frame");
                None
            }
        };
        self.dpb.assign(setup, frame_index);

        let src_view = match self.source_views.get(&frame.image) {
            Some(view) => *view,
            None => {
                let view = self
                    .device
                    .create_source_view(frame.image, self.resources.picture_format)?;
                self.source_views.insert(frame.image, view);
                view
            }
        };

        self.device.begin_recording(ring_slot)?;
        self.device.reset_feedback_query(ring_slot);

        // The device requires the entire fixed slot set to be declared, the
        // pending setup slot as unregistered. Rate control is attached only
        // once the session state exists on the device.
        let declarations = self.dpb.declarations();
        let rate_control = if self.session_state_initialized {
            self.rate_control.as_ref()
        } else {
            None
        };
        self.device
            .begin_coding(ring_slot, &declarations, rate_control);

        self.dpb.register(setup);

        if !self.session_state_initialized {
            self.device
                .init_session_state(ring_slot, self.rate_control.as_ref());
            self.device.transition_dpb_layout(
                ring_slot,
                self.resources.dpb_image,
                self.dpb.len() as u32,
            );
            self.session_state_initialized = true;
        }

        let picture = self.params.picture(reference.is_some());
        let command = EncodeCommand {
            src_view,
            coded_rect: self.resources.coded_rect(),
            output_range: self.resources.output_buffer_size(),
            setup_slot: self.dpb.declaration(setup),
            reference_slot: reference.map(|index| self.dpb.declaration(index)),
            picture,
        };
        self.device.encode_frame(ring_slot, &command);
        self.device.end_coding(ring_slot);
        self.device.submit(ring_slot)?;

        self.in_flight[slot] = InFlight {
            submitted: true,
            frame_index,
        };
        self.frames_since_reset += 1;
        self.stats.frames_submitted += 1;

        debug!(
            frame_index,
            ring_slot,
            pts = frame.timestamp.as_secs(),
            setup_slot = setup,
            reference_slot = ?reference,
            "Frame submitted"
        );
        Ok(())
    }

    /// Wait for a submitted frame and return its encoded bytes.
    ///
    /// The returned view borrows the encoder; consume it before submitting
    /// again.
    pub fn encoded_result(&mut self, ring_slot: u32) -> Result<EncodedFrame<'_>, EncodeError> {
        let slot = self.check_ring_slot(ring_slot)?;
        if !self.in_flight[slot].submitted {
            return Err(EncodeError::NoPendingSubmission { slot: ring_slot });
        }
        self.wait_slot(ring_slot)?;

        let feedback = self.device.read_feedback_query()?;
        let bytes = self
            .device
            .output_bytes(feedback.offset, feedback.bytes_written)?;

        debug!(
            ring_slot,
            frame_index = self.in_flight[slot].frame_index,
            offset = feedback.offset,
            size = feedback.bytes_written,
            has_overrides = feedback.has_overrides,
            "Encoded frame retrieved"
        );

        Ok(EncodedFrame {
            bytes,
            has_overrides: feedback.has_overrides,
        })
    }

    /// Encoded session parameter blob (e.g. SPS/PPS) for out-of-band
    /// delivery to the remote decoder before the first frame. Callable any
    /// time after construction.
    pub fn encoded_parameter_set(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.device.encoded_session_parameters()?)
    }

    /// Deliver a decoder acknowledgement. Callable concurrently with
    /// submission through [`feedback_tracker`](Self::feedback_tracker).
    pub fn on_feedback(&self, feedback: DecoderFeedback) {
        self.feedback.record(feedback);
    }

    /// Shared handle to the feedback tracker, for the network receive path.
    pub fn feedback_tracker(&self) -> Arc<FeedbackTracker> {
        Arc::clone(&self.feedback)
    }

    /// Wait for every in-flight submission to complete. Called before the
    /// device resources are released; also attempted on drop.
    pub fn drain(&mut self) -> Result<(), EncodeError> {
        for ring_slot in 0..self.in_flight.len() as u32 {
            if self.in_flight[ring_slot as usize].submitted {
                self.wait_slot(ring_slot)?;
                self.in_flight[ring_slot as usize].submitted = false;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> EncoderStats {
        self.stats
    }

    /// The negotiated rate-control configuration, `None` when running under
    /// the device's unmanaged default mode.
    pub fn rate_control(&self) -> Option<&RateControlConfig> {
        self.rate_control.as_ref()
    }

    /// The underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    fn check_ring_slot(&self, ring_slot: u32) -> Result<usize, EncodeError> {
        let slot = ring_slot as usize;
        if slot >= self.in_flight.len() {
            return Err(EncodeError::InvalidRingSlot {
                slot: ring_slot,
                depth: self.in_flight.len() as u32,
            });
        }
        Ok(slot)
    }

    fn wait_slot(&mut self, ring_slot: u32) -> Result<(), EncodeError> {
        self.device
            .wait_ring_slot(ring_slot, COMPLETION_TIMEOUT_NS)
            .map_err(|err| match err {
                DeviceError::FenceTimeout => EncodeError::CompletionTimeout { slot: ring_slot },
                other => EncodeError::Device(other),
            })
    }
}

impl<D: EncodeDevice> Drop for VulkanVideoEncoder<D> {
    fn drop(&mut self) {
        if let Err(err) = self.drain() {
            warn!(error = %err, "Failed to drain in-flight submissions on drop");
        }
    }
}
