//! Video codec identifiers.

use serde::{Deserialize, Serialize};

/// Video codec identifier.
///
/// Only the codecs with a Vulkan Video *encode* extension are listed:
///
/// - `VK_KHR_video_encode_h264` -- H.264/AVC
/// - `VK_KHR_video_encode_h265` -- H.265/HEVC
///
/// AV1 and VP9 encode are not part of the Vulkan Video specification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
    H265,
}

impl VideoCodec {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::H264 => "H.264/AVC",
            Self::H265 => "H.265/HEVC",
        }
    }

    /// The Vulkan device extension providing encode support for this codec.
    pub fn encode_extension(self) -> &'static str {
        match self {
            Self::H264 => "VK_KHR_video_encode_h264",
            Self::H265 => "VK_KHR_video_encode_h265",
        }
    }
}
