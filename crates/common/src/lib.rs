//! `fv-common` -- Shared types for the FarView streaming server.
//!
//! This crate holds the domain types used across the FarView crates: frame
//! rates and resolutions, the video codec enum, the encoder configuration,
//! and the decoder-feedback event delivered by the network receive path.
//!
//! It deliberately contains no Vulkan types -- everything device-facing lives
//! in `fv-encoder` behind its capability trait.

pub mod codec;
pub mod config;
pub mod error;
pub mod feedback;
pub mod types;

pub use codec::VideoCodec;
pub use config::EncoderConfig;
pub use error::ConfigError;
pub use feedback::DecoderFeedback;
pub use types::{Rational, Resolution, TimeCode};
