//! Test double for the encode device.
//!
//! `FakeDevice` implements [`EncodeDevice`] without a GPU: resource creation
//! hands out synthetic handles, command recording appends to an operation
//! log, and every submission is captured as a [`RecordedSubmission`] so
//! tests can assert on the slots and parameters the orchestrator chose.
//! Failure modes (missing formats, bind failures, fence timeouts) are
//! programmable through public fields.

use std::collections::HashSet;

use ash::vk;
use ash::vk::Handle;

use fv_common::VideoCodec;

use crate::codec::PictureInfo;
use crate::error::DeviceError;
use crate::vulkan_video::device::{
    EncodeCommand, EncodeDevice, EncodeCapabilities, MemoryRequirement, PictureUsage,
    QueryFeedback, SessionCreateInfo, SlotDeclaration, VideoCapabilities, VideoFormatProperties,
};
use crate::vulkan_video::rate_control::RateControlConfig;

/// One encode command as the fake observed it.
#[derive(Clone, Debug)]
pub(crate) struct RecordedSubmission {
    pub ring_slot: u32,
    /// Registered index of the setup slot.
    pub setup_slot: i32,
    /// Registered index of the reference slot, if any.
    pub reference_slot: Option<i32>,
    /// Slot indices declared when the coding scope opened.
    pub declared_slots: Vec<i32>,
    pub picture: PictureInfo,
}

/// In-memory `EncodeDevice` for orchestration tests.
pub(crate) struct FakeDevice {
    pub source_formats: Vec<VideoFormatProperties>,
    pub dpb_formats: Vec<VideoFormatProperties>,
    pub capabilities: VideoCapabilities,
    pub encode_caps: EncodeCapabilities,
    /// Fail `bind_session_memory` with a memory-bind error.
    pub fail_bind: bool,
    /// Ring slots whose fence waits time out.
    pub timeout_slots: HashSet<u32>,
    /// Result returned by `read_feedback_query`.
    pub query: QueryFeedback,
    /// Simulated host-mapped output buffer, sized by `create_output_buffer`.
    pub output: Vec<u8>,
    pub parameter_blob: Vec<u8>,

    /// Flat log of device calls, in order.
    pub ops: Vec<String>,
    pub submissions: Vec<RecordedSubmission>,
    pub session_info: Option<SessionCreateInfo>,
    /// Extent and layer count of the created DPB image.
    pub dpb_image_desc: Option<(vk::Extent2D, u32)>,
    pub bound_regions: u32,
    pub source_views_created: u32,

    pending_declarations: Vec<i32>,
    next_handle: u64,
}

impl FakeDevice {
    pub fn new() -> Self {
        let yuv = VideoFormatProperties {
            format: vk::Format::G8_B8R8_2PLANE_420_UNORM,
        };
        Self {
            source_formats: vec![yuv],
            dpb_formats: vec![yuv],
            capabilities: VideoCapabilities {
                picture_access_granularity: vk::Extent2D {
                    width: 16,
                    height: 16,
                },
                min_bitstream_buffer_size_alignment: 4096,
            },
            encode_caps: EncodeCapabilities {
                rate_control_modes: vk::VideoEncodeRateControlModeFlagsKHR::CBR
                    | vk::VideoEncodeRateControlModeFlagsKHR::VBR,
                max_bitrate: 100_000_000,
            },
            fail_bind: false,
            timeout_slots: HashSet::new(),
            query: QueryFeedback {
                offset: 0,
                bytes_written: 4096,
                has_overrides: false,
            },
            output: Vec::new(),
            parameter_blob: vec![0x42; 32],
            ops: Vec::new(),
            submissions: Vec::new(),
            session_info: None,
            dpb_image_desc: None,
            bound_regions: 0,
            source_views_created: 0,
            pending_declarations: Vec::new(),
            next_handle: 0,
        }
    }

    fn handle<T: Handle>(&mut self) -> T {
        self.next_handle += 1;
        T::from_raw(self.next_handle)
    }
}

impl EncodeDevice for FakeDevice {
    fn video_capabilities(&self) -> Result<VideoCapabilities, DeviceError> {
        Ok(self.capabilities)
    }

    fn encode_capabilities(&self) -> Result<EncodeCapabilities, DeviceError> {
        Ok(self.encode_caps)
    }

    fn format_properties(
        &self,
        usage: PictureUsage,
    ) -> Result<Vec<VideoFormatProperties>, DeviceError> {
        Ok(match usage {
            PictureUsage::EncodeSource => self.source_formats.clone(),
            PictureUsage::EncodeDpb => self.dpb_formats.clone(),
        })
    }

    fn create_dpb_image(
        &mut self,
        _format: vk::Format,
        extent: vk::Extent2D,
        layers: u32,
    ) -> Result<vk::Image, DeviceError> {
        self.dpb_image_desc = Some((extent, layers));
        Ok(self.handle())
    }

    fn create_dpb_view(
        &mut self,
        _image: vk::Image,
        _format: vk::Format,
        _layer: u32,
    ) -> Result<vk::ImageView, DeviceError> {
        Ok(self.handle())
    }

    fn create_output_buffer(&mut self, size: u64) -> Result<vk::Buffer, DeviceError> {
        self.output = vec![0xAB; size as usize];
        Ok(self.handle())
    }

    fn create_session(&mut self, info: &SessionCreateInfo) -> Result<(), DeviceError> {
        self.session_info = Some(*info);
        Ok(())
    }

    fn session_memory_requirements(&self) -> Result<Vec<MemoryRequirement>, DeviceError> {
        Ok(vec![
            MemoryRequirement {
                bind_index: 0,
                size: 1 << 20,
                memory_type_bits: 1,
            },
            MemoryRequirement {
                bind_index: 1,
                size: 1 << 16,
                memory_type_bits: 1,
            },
        ])
    }

    fn bind_session_memory(
        &mut self,
        requirements: &[MemoryRequirement],
    ) -> Result<(), DeviceError> {
        if self.fail_bind {
            return Err(DeviceError::MemoryBind {
                region: 0,
                result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
            });
        }
        self.bound_regions = requirements.len() as u32;
        Ok(())
    }

    fn create_session_parameters(&mut self, _codec: VideoCodec) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_feedback_query(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_source_view(
        &mut self,
        _image: vk::Image,
        _format: vk::Format,
    ) -> Result<vk::ImageView, DeviceError> {
        self.source_views_created += 1;
        Ok(self.handle())
    }

    fn encoded_session_parameters(&self) -> Result<Vec<u8>, DeviceError> {
        Ok(self.parameter_blob.clone())
    }

    fn wait_ring_slot(&mut self, ring_slot: u32, _timeout_ns: u64) -> Result<(), DeviceError> {
        self.ops.push(format!("wait_ring_slot slot={ring_slot}"));
        if self.timeout_slots.contains(&ring_slot) {
            return Err(DeviceError::FenceTimeout);
        }
        Ok(())
    }

    fn begin_recording(&mut self, ring_slot: u32) -> Result<(), DeviceError> {
        self.ops.push(format!("begin_recording slot={ring_slot}"));
        Ok(())
    }

    fn reset_feedback_query(&mut self, ring_slot: u32) {
        self.ops.push(format!("reset_feedback_query slot={ring_slot}"));
    }

    fn begin_coding(
        &mut self,
        ring_slot: u32,
        slots: &[SlotDeclaration],
        rate_control: Option<&RateControlConfig>,
    ) {
        self.pending_declarations = slots.iter().map(|s| s.slot_index).collect();
        self.ops.push(format!(
            "begin_coding slot={ring_slot} rc={}",
            rate_control.is_some()
        ));
    }

    fn init_session_state(&mut self, ring_slot: u32, rate_control: Option<&RateControlConfig>) {
        self.ops.push(format!(
            "init_session_state slot={ring_slot} rc={}",
            rate_control.is_some()
        ));
    }

    fn transition_dpb_layout(&mut self, ring_slot: u32, _dpb_image: vk::Image, layers: u32) {
        self.ops
            .push(format!("transition_dpb_layout slot={ring_slot} layers={layers}"));
    }

    fn encode_frame(&mut self, ring_slot: u32, command: &EncodeCommand) {
        self.ops.push(format!("encode_frame slot={ring_slot}"));
        self.submissions.push(RecordedSubmission {
            ring_slot,
            setup_slot: command.setup_slot.slot_index,
            reference_slot: command.reference_slot.map(|s| s.slot_index),
            declared_slots: std::mem::take(&mut self.pending_declarations),
            picture: command.picture,
        });
    }

    fn end_coding(&mut self, ring_slot: u32) {
        self.ops.push(format!("end_coding slot={ring_slot}"));
    }

    fn submit(&mut self, ring_slot: u32) -> Result<(), DeviceError> {
        self.ops.push(format!("submit slot={ring_slot}"));
        Ok(())
    }

    fn read_feedback_query(&self) -> Result<QueryFeedback, DeviceError> {
        Ok(self.query)
    }

    fn output_bytes(&self, offset: u32, len: u32) -> Result<&[u8], DeviceError> {
        self.output
            .get(offset as usize..(offset as usize + len as usize))
            .ok_or(DeviceError::BitstreamReadback(
                vk::Result::ERROR_MEMORY_MAP_FAILED,
            ))
    }
}
