//! Encoder configuration.

use serde::{Deserialize, Serialize};

use crate::codec::VideoCodec;
use crate::error::ConfigError;
use crate::types::{Rational, Resolution};

/// Hardware encoder configuration.
///
/// Built once per stream and handed to the encoder at construction. The
/// bitrate here is the *requested* target; the encoder clamps it against the
/// device-advertised maximum during rate-control negotiation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub codec: VideoCodec,
    pub resolution: Resolution,
    pub fps: Rational,
    /// Requested average bitrate in bits/sec.
    pub bitrate: u64,
    /// Reference picture pool depth (DPB slots). Minimum 2: one slot is
    /// written per submission while the others serve as prediction sources.
    pub num_dpb_slots: u32,
    /// Submission pipeline depth (command buffers kept in flight).
    pub in_flight_frames: u32,
}

impl EncoderConfig {
    pub fn new(codec: VideoCodec, resolution: Resolution) -> Self {
        Self {
            codec,
            resolution,
            fps: Rational::FPS_90,
            bitrate: 50_000_000,
            num_dpb_slots: 4,
            in_flight_frames: 3,
        }
    }

    /// Validate the configuration before session creation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        if self.bitrate == 0 {
            return Err(ConfigError::ZeroBitrate);
        }
        if self.num_dpb_slots < 2 {
            return Err(ConfigError::TooFewDpbSlots(self.num_dpb_slots));
        }
        if self.in_flight_frames == 0 {
            return Err(ConfigError::NoInFlightFrames);
        }
        Ok(())
    }
}
