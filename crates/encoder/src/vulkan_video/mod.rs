//! Vulkan Video hardware encode orchestration.
//!
//! This module drives hardware video encoding through the
//! `VK_KHR_video_encode_queue` family of extensions on AMD, Intel, and
//! NVIDIA GPUs, via the vendor-neutral Vulkan Video API.
//!
//! # Required Vulkan Extensions
//!
//! A device implementation needs, beyond a queue family with
//! `VIDEO_ENCODE_BIT_KHR`:
//!
//! - **`VK_KHR_video_queue`** -- Core video infrastructure (video sessions,
//!   coding scopes, reference slot management, rate control).
//! - **`VK_KHR_video_encode_queue`** -- Encode commands, rate-control
//!   parameters, bitstream output and the encode feedback query.
//! - **`VK_KHR_video_encode_h264`** / **`VK_KHR_video_encode_h265`** -- The
//!   codec profile in use.
//!
//! # Module Structure
//!
//! - [`device`]: the injected [`EncodeDevice`] capability trait wrapping the
//!   raw Vulkan primitives.
//! - [`rate_control`]: capability sanitizing and rate-control negotiation.
//! - [`session`]: one-shot creation of the session's device resources.
//! - [`dpb`]: reference slot bookkeeping and the selection policy.
//! - [`feedback`]: lock-free decoder acknowledgement tracking.
//! - [`encoder`]: the per-frame submission engine tying it all together.

pub mod device;
pub mod dpb;
pub mod encoder;
pub mod feedback;
pub mod rate_control;
pub mod session;

pub use device::{EncodeCapabilities, EncodeDevice, QueryFeedback};
pub use encoder::{EncodedFrame, EncoderStats, SourceFrame, VulkanVideoEncoder};
pub use feedback::FeedbackTracker;
pub use rate_control::{RateControlConfig, RateControlMode};
