//! `fv-encoder` -- Hardware video encoding for the FarView streaming server.
//!
//! Rendered frames are encoded with Vulkan Video hardware acceleration and
//! streamed to the headset; the remote decoder acknowledges received frames
//! over a feedback channel, and the encoder predicts only from confirmed
//! pictures so packet loss never snowballs into a stream of full refreshes.
//!
//! # Architecture
//!
//! - [`vulkan_video`] -- The encode session orchestrator
//!   - [`vulkan_video::device`] -- Injected device capability trait
//!   - [`vulkan_video::rate_control`] -- Rate-control negotiation
//!   - [`vulkan_video::session`] -- Session resource management
//!   - [`vulkan_video::dpb`] -- Reference slot ring and selection policy
//!   - [`vulkan_video::feedback`] -- Decoder acknowledgement tracking
//!   - [`vulkan_video::encoder`] -- Per-frame submission engine
//! - [`codec`] -- Codec-specific parameter strategies (H.264 / H.265)
//! - [`error`] -- Device and orchestrator error types
//!
//! # Encode Pipeline
//!
//! ```text
//! SourceFrame (YUV image from the compositor)
//!   --> submit_frame (reference selection, coding scope recording)
//!     --> EncodeDevice (vkCmdEncodeVideoKHR on the encode queue)
//!       --> encoded_result (feedback query read-back)
//!         --> EncodedFrame (byte view into the bitstream buffer)
//!           --> network transport --> headset decoder
//!               --> DecoderFeedback --> FeedbackTracker
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fv_common::{EncoderConfig, Resolution, VideoCodec};
//! use fv_encoder::VulkanVideoEncoder;
//!
//! let config = EncoderConfig::new(VideoCodec::H264, Resolution::EYE_2K);
//! let mut encoder = VulkanVideoEncoder::new(device, &config)?;
//!
//! // Deliver the parameter set out-of-band before the first frame.
//! transport.send_config(encoder.encoded_parameter_set()?);
//!
//! // The network receive path feeds acknowledgements concurrently.
//! let tracker = encoder.feedback_tracker();
//!
//! for (index, frame) in frames.enumerate() {
//!     let slot = (index % 3) as u32;
//!     encoder.submit_frame(&frame, index as u64, false, slot)?;
//!     let encoded = encoder.encoded_result(slot)?;
//!     transport.send(encoded.bytes);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod vulkan_video;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DeviceError, EncodeError};
pub use vulkan_video::{
    EncodeDevice, EncodedFrame, EncoderStats, FeedbackTracker, SourceFrame, VulkanVideoEncoder,
};
