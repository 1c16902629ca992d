//! Encode session resource management.
//!
//! One-time creation of everything the encode session owns on the device:
//! the DPB image array and its per-layer views, the host-mapped bitstream
//! output buffer, the video session itself with all of its memory bound, the
//! codec session parameters, and the single-entry feedback query.

use ash::vk;
use tracing::info;

use fv_common::{Resolution, VideoCodec};

use crate::error::EncodeError;
use crate::vulkan_video::device::{EncodeDevice, PictureUsage, SessionCreateInfo};

/// Conservative output sizing: the bitstream buffer holds at least this many
/// bytes per pixel of the coded rectangle.
const OUTPUT_BYTES_PER_PIXEL: u64 = 3;

/// Round `value` up to a multiple of `alignment` (0 = no alignment).
pub(crate) fn align_u32(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

/// Round `value` up to a multiple of `alignment` (0 = no alignment).
pub(crate) fn align_u64(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

/// Device resources owned by one encode session.
///
/// Created exactly once per encoder; the handles stay valid for the
/// encoder's lifetime and are released by the device implementation when it
/// is dropped.
#[derive(Debug)]
pub struct SessionResources {
    /// Format of the encoder's source pictures.
    pub(crate) picture_format: vk::Format,
    /// Format of the DPB reference pictures.
    pub(crate) reference_format: vk::Format,
    /// The DPB image array, one layer per reference slot.
    pub(crate) dpb_image: vk::Image,
    /// One view per DPB layer, indexed by slot.
    pub(crate) dpb_views: Vec<vk::ImageView>,
    /// Coded rectangle of the stream.
    pub(crate) coded_rect: vk::Rect2D,
    /// The host-mapped bitstream output buffer.
    pub(crate) output_buffer: vk::Buffer,
    /// Size of the bitstream output buffer in bytes.
    pub(crate) output_buffer_size: u64,
}

impl SessionResources {
    /// Create and bind all session resources. One-shot; the caller must not
    /// invoke this twice for the same device.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::UnsupportedInputFormat`] if the device's encode input
    ///   format is not the expected planar YUV 4:2:0 layout.
    /// - [`EncodeError::NoCompatibleFormat`] if no format is advertised for
    ///   source or reference pictures.
    /// - Any [`DeviceError`](crate::error::DeviceError) from resource
    ///   creation or memory binding. Binding is all-or-nothing: on failure no
    ///   partially usable session is left behind.
    pub fn initialize<D: EncodeDevice>(
        device: &mut D,
        codec: VideoCodec,
        resolution: Resolution,
        num_dpb_slots: u32,
    ) -> Result<Self, EncodeError> {
        let picture_format = select_format(device, PictureUsage::EncodeSource)?;
        if picture_format != vk::Format::G8_B8R8_2PLANE_420_UNORM {
            return Err(EncodeError::UnsupportedInputFormat(picture_format));
        }
        let reference_format = select_format(device, PictureUsage::EncodeDpb)?;

        let caps = device.video_capabilities()?;
        let extent = vk::Extent2D {
            width: resolution.width,
            height: resolution.height,
        };
        let aligned_extent = vk::Extent2D {
            width: align_u32(extent.width, caps.picture_access_granularity.width),
            height: align_u32(extent.height, caps.picture_access_granularity.height),
        };

        let dpb_image = device.create_dpb_image(reference_format, aligned_extent, num_dpb_slots)?;

        let output_buffer_size = align_u64(
            resolution.pixel_count() * OUTPUT_BYTES_PER_PIXEL,
            caps.min_bitstream_buffer_size_alignment,
        );
        let output_buffer = device.create_output_buffer(output_buffer_size)?;

        device.create_session(&SessionCreateInfo {
            picture_format,
            reference_format,
            max_coded_extent: extent,
            max_dpb_slots: num_dpb_slots,
            max_active_reference_pictures: num_dpb_slots - 1,
        })?;

        let requirements = device.session_memory_requirements()?;
        device.bind_session_memory(&requirements)?;

        let dpb_views = (0..num_dpb_slots)
            .map(|layer| device.create_dpb_view(dpb_image, reference_format, layer))
            .collect::<Result<Vec<_>, _>>()?;

        device.create_session_parameters(codec)?;
        device.create_feedback_query()?;

        info!(
            codec = codec.display_name(),
            resolution = %resolution,
            dpb_slots = num_dpb_slots,
            output_buffer_size,
            "Encode session resources created"
        );

        Ok(Self {
            picture_format,
            reference_format,
            dpb_image,
            dpb_views,
            coded_rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            },
            output_buffer,
            output_buffer_size,
        })
    }

    pub fn picture_format(&self) -> vk::Format {
        self.picture_format
    }

    pub fn reference_format(&self) -> vk::Format {
        self.reference_format
    }

    pub fn output_buffer(&self) -> vk::Buffer {
        self.output_buffer
    }

    pub fn output_buffer_size(&self) -> u64 {
        self.output_buffer_size
    }

    pub fn coded_rect(&self) -> vk::Rect2D {
        self.coded_rect
    }
}

/// Pick the device's preferred format for a usage.
fn select_format<D: EncodeDevice>(
    device: &D,
    usage: PictureUsage,
) -> Result<vk::Format, EncodeError> {
    device
        .format_properties(usage)?
        .first()
        .map(|p| p.format)
        .ok_or(EncodeError::NoCompatibleFormat(usage.label()))
}
