//! The injected hardware encode capability surface.
//!
//! The orchestrator never talks to Vulkan directly; it drives an
//! [`EncodeDevice`] implementation that wraps the `VK_KHR_video_queue` /
//! `VK_KHR_video_encode_queue` primitives: capability and format queries,
//! session and resource creation, memory binding, per-slot command recording
//! (coding scope, encode, feedback query), fence waits, and bitstream
//! read-back. Keeping this surface behind a trait makes the submission
//! algorithm testable against a fake device.
//!
//! Command recording is addressed by *ring slot*: the device owns one
//! command buffer and one completion fence per in-flight slot. `submit`
//! signals the slot's fence; `wait_ring_slot` blocks on it with a bounded
//! timeout.

use ash::vk;

use fv_common::VideoCodec;

use crate::codec::PictureInfo;
use crate::error::DeviceError;
use crate::vulkan_video::rate_control::RateControlConfig;

/// Image usage a video format is queried for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PictureUsage {
    /// Source pictures fed to the encoder (`VIDEO_ENCODE_SRC`).
    EncodeSource,
    /// Reference pictures held in the DPB (`VIDEO_ENCODE_DPB`).
    EncodeDpb,
}

impl PictureUsage {
    pub fn label(self) -> &'static str {
        match self {
            Self::EncodeSource => "encoder input",
            Self::EncodeDpb => "reference picture",
        }
    }
}

/// One entry of the device's advertised video format list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VideoFormatProperties {
    pub format: vk::Format,
}

/// General video-session capabilities of the device.
#[derive(Copy, Clone, Debug)]
pub struct VideoCapabilities {
    /// Granularity image extents must be rounded up to.
    pub picture_access_granularity: vk::Extent2D,
    /// Required alignment of the bitstream output buffer size.
    pub min_bitstream_buffer_size_alignment: u64,
}

/// Encode-specific capabilities of the device.
///
/// `max_bitrate == 0` is a legal report meaning "unbounded or unspecified";
/// rate-control negotiation sanitizes the combination of that with an
/// advertised CBR/VBR mode.
#[derive(Copy, Clone, Debug)]
pub struct EncodeCapabilities {
    pub rate_control_modes: vk::VideoEncodeRateControlModeFlagsKHR,
    pub max_bitrate: u64,
}

/// Parameters for video session creation.
#[derive(Copy, Clone, Debug)]
pub struct SessionCreateInfo {
    pub picture_format: vk::Format,
    pub reference_format: vk::Format,
    pub max_coded_extent: vk::Extent2D,
    pub max_dpb_slots: u32,
    pub max_active_reference_pictures: u32,
}

/// One memory region the video session requires.
#[derive(Copy, Clone, Debug)]
pub struct MemoryRequirement {
    pub bind_index: u32,
    pub size: u64,
    pub memory_type_bits: u32,
}

/// Result of the per-submission encode feedback query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryFeedback {
    /// Byte offset of the access unit within the output buffer.
    pub offset: u32,
    /// Number of bytes written.
    pub bytes_written: u32,
    /// Whether the device overrode any requested parameter.
    pub has_overrides: bool,
}

/// Declared state of one DPB slot when a coding scope opens.
///
/// `slot_index == -1` declares the picture resource without registering it;
/// the device requires every slot of the fixed set to be declared even when
/// currently unused.
#[derive(Copy, Clone, Debug)]
pub struct SlotDeclaration {
    pub slot_index: i32,
    pub image_view: vk::ImageView,
}

/// Everything the device needs to record one encode command.
#[derive(Copy, Clone, Debug)]
pub struct EncodeCommand {
    /// View of the source picture.
    pub src_view: vk::ImageView,
    /// Coded rectangle of the stream.
    pub coded_rect: vk::Rect2D,
    /// Writable byte range of the output buffer.
    pub output_range: u64,
    /// The DPB slot receiving the reconstructed picture.
    pub setup_slot: SlotDeclaration,
    /// The prediction reference, or `None` for a refresh frame.
    pub reference_slot: Option<SlotDeclaration>,
    /// Codec-level picture metadata.
    pub picture: PictureInfo,
}

/// Hardware encode device abstraction.
///
/// Implementations wrap a live Vulkan device with an encode-capable queue;
/// tests use a fake. Infallible methods record commands into the ring slot's
/// command buffer and cannot fail until submission, mirroring Vulkan's
/// deferred-error model for command recording.
///
/// # Contract
///
/// - `bind_session_memory` is all-or-nothing: on error the implementation
///   must leave no partially bound session behind.
/// - `wait_ring_slot` returns [`DeviceError::FenceTimeout`] when the slot's
///   fence is not signaled within the deadline, and resets the fence before
///   `submit` reuses it.
/// - `output_bytes` returns a view into host-mapped memory that stays valid
///   until the same ring slot is submitted again.
pub trait EncodeDevice: Send {
    // -- Capabilities and formats --

    /// General video-session capabilities.
    fn video_capabilities(&self) -> Result<VideoCapabilities, DeviceError>;

    /// Encode capabilities (rate-control modes, bitrate bound).
    fn encode_capabilities(&self) -> Result<EncodeCapabilities, DeviceError>;

    /// Formats advertised for the given picture usage, in device preference
    /// order. An empty list means the usage is unsupported.
    fn format_properties(
        &self,
        usage: PictureUsage,
    ) -> Result<Vec<VideoFormatProperties>, DeviceError>;

    // -- Session and resource creation --

    /// Create the DPB image array (one layer per reference slot).
    fn create_dpb_image(
        &mut self,
        format: vk::Format,
        extent: vk::Extent2D,
        layers: u32,
    ) -> Result<vk::Image, DeviceError>;

    /// Create a view of one DPB layer.
    fn create_dpb_view(
        &mut self,
        image: vk::Image,
        format: vk::Format,
        layer: u32,
    ) -> Result<vk::ImageView, DeviceError>;

    /// Create the host-mapped bitstream output buffer.
    fn create_output_buffer(&mut self, size: u64) -> Result<vk::Buffer, DeviceError>;

    /// Create the video session.
    fn create_session(&mut self, info: &SessionCreateInfo) -> Result<(), DeviceError>;

    /// Memory regions the session requires before first use.
    fn session_memory_requirements(&self) -> Result<Vec<MemoryRequirement>, DeviceError>;

    /// Bind all required session memory. All-or-nothing.
    fn bind_session_memory(
        &mut self,
        requirements: &[MemoryRequirement],
    ) -> Result<(), DeviceError>;

    /// Create the codec-specific session parameters object.
    fn create_session_parameters(&mut self, codec: VideoCodec) -> Result<(), DeviceError>;

    /// Create the single-entry encode feedback query.
    fn create_feedback_query(&mut self) -> Result<(), DeviceError>;

    /// Create a view of an externally owned source image.
    fn create_source_view(
        &mut self,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView, DeviceError>;

    /// Encoded session parameter blob for out-of-band delivery.
    fn encoded_session_parameters(&self) -> Result<Vec<u8>, DeviceError>;

    // -- Synchronization --

    /// Bounded wait on the ring slot's completion fence.
    fn wait_ring_slot(&mut self, ring_slot: u32, timeout_ns: u64) -> Result<(), DeviceError>;

    // -- Command recording --

    /// Begin recording into the ring slot's command buffer.
    fn begin_recording(&mut self, ring_slot: u32) -> Result<(), DeviceError>;

    /// Record a reset of the feedback query.
    fn reset_feedback_query(&mut self, ring_slot: u32);

    /// Open the video coding scope, declaring the entire DPB slot set.
    /// `rate_control` is attached only once the session state has been
    /// initialized on the device.
    fn begin_coding(
        &mut self,
        ring_slot: u32,
        slots: &[SlotDeclaration],
        rate_control: Option<&RateControlConfig>,
    );

    /// Record the one-time session-state reset and rate-control setup.
    fn init_session_state(&mut self, ring_slot: u32, rate_control: Option<&RateControlConfig>);

    /// Record the one-time layout transition of the DPB image array to the
    /// encode-DPB layout.
    fn transition_dpb_layout(&mut self, ring_slot: u32, dpb_image: vk::Image, layers: u32);

    /// Record the encode command, bracketed by the feedback query.
    fn encode_frame(&mut self, ring_slot: u32, command: &EncodeCommand);

    /// Close the video coding scope.
    fn end_coding(&mut self, ring_slot: u32);

    /// End recording and submit, signaling the ring slot's fence.
    fn submit(&mut self, ring_slot: u32) -> Result<(), DeviceError>;

    // -- Read-back --

    /// Read the feedback query of the last completed submission.
    fn read_feedback_query(&self) -> Result<QueryFeedback, DeviceError>;

    /// Read-only view into the host-mapped output buffer.
    fn output_bytes(&self, offset: u32, len: u32) -> Result<&[u8], DeviceError>;
}
