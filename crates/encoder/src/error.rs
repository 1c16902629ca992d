//! Encoder error types.
//!
//! Two layers: [`DeviceError`] covers failures reported by the injected
//! encode device (carrying the raw `vk::Result` where one exists), and
//! [`EncodeError`] is the taxonomy surfaced to callers of the orchestrator.

use ash::vk;
use thiserror::Error;

use fv_common::ConfigError;

/// Errors reported by an [`EncodeDevice`](crate::vulkan_video::EncodeDevice)
/// implementation.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Capability query failed: {0}")]
    CapabilityQuery(vk::Result),

    #[error("Video session creation failed: {0}")]
    SessionCreation(vk::Result),

    #[error("Video session parameters creation failed: {0}")]
    ParametersCreation(vk::Result),

    #[error("Image creation failed: {0}")]
    ImageCreation(vk::Result),

    #[error("Image view creation failed: {0}")]
    ImageViewCreation(vk::Result),

    #[error("Buffer creation failed: {0}")]
    BufferCreation(vk::Result),

    #[error("Query pool creation failed: {0}")]
    QueryPoolCreation(vk::Result),

    #[error("Memory bind failed for region {region}: {result}")]
    MemoryBind { region: u32, result: vk::Result },

    #[error("Command recording failed: {0}")]
    CommandRecording(vk::Result),

    #[error("Queue submit failed: {0}")]
    QueueSubmit(vk::Result),

    #[error("Fence wait failed: {0}")]
    FenceWait(vk::Result),

    #[error("Fence wait timed out")]
    FenceTimeout,

    #[error("Encode feedback query read failed: {0}")]
    QueryRead(vk::Result),

    #[error("Bitstream readback failed: {0}")]
    BitstreamReadback(vk::Result),

    #[error("Encoded parameter retrieval failed: {0}")]
    ParameterRetrieval(vk::Result),
}

/// Errors surfaced by the encode orchestrator.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unsupported encoder input format {0:?} (expected 2-plane YUV 4:2:0)")]
    UnsupportedInputFormat(vk::Format),

    #[error("No compatible {0} format advertised by the device")]
    NoCompatibleFormat(&'static str),

    #[error("Invalid encoder configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Ring slot {slot} out of range (pipeline depth {depth})")]
    InvalidRingSlot { slot: u32, depth: u32 },

    #[error("No submission pending on ring slot {slot}")]
    NoPendingSubmission { slot: u32 },

    #[error("Timed out waiting for completion of ring slot {slot}")]
    CompletionTimeout { slot: u32 },

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}
