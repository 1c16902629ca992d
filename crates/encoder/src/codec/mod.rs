//! Codec-specific per-frame parameter strategies.
//!
//! The orchestrator decides *which* frames are referenced and *when* a full
//! refresh happens; everything standard-specific -- picture typing, H.264
//! frame numbering and IDR identifiers, H.265 picture order counts -- is
//! produced here and handed opaquely to the device's codec layer. One
//! strategy is selected at encoder construction and never swapped.
//!
//! Bitstream syntax (SPS/PPS/slice headers) is out of scope: the device
//! implementation builds the `StdVideo*` structures from the metadata in
//! [`PictureInfo`].

mod h264;
mod h265;

pub use h264::H264Params;
pub use h265::H265Params;

use fv_common::VideoCodec;

/// Picture type of a submitted frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PictureType {
    /// Instantaneous decoder refresh: decodable with no prior frames.
    Idr,
    /// Predicted from one prior reference picture.
    P,
}

/// Codec-level metadata for one encoded frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PictureInfo {
    pub picture_type: PictureType,
    /// H.264 `frame_num` syntax value (0 for H.265).
    pub frame_num: u32,
    /// Picture order count.
    pub pic_order_cnt: i32,
    /// H.264 IDR picture identifier (0 for H.265).
    pub idr_id: u16,
}

/// Per-codec parameter strategy, selected once at encoder construction.
pub trait CodecParams: Send {
    fn codec(&self) -> VideoCodec;

    /// Out-of-band refresh side channel. Invoked when the caller forces a
    /// refresh, before the frame is recorded.
    fn signal_refresh(&mut self);

    /// Produce the picture metadata for the next frame. `has_reference` is
    /// false when the submission engine encodes without a prediction source,
    /// which makes the frame an IDR and restarts codec numbering.
    fn picture(&mut self, has_reference: bool) -> PictureInfo;
}

/// Select the parameter strategy for a codec.
pub fn params_for(codec: VideoCodec) -> Box<dyn CodecParams> {
    match codec {
        VideoCodec::H264 => Box::new(H264Params::new()),
        VideoCodec::H265 => Box::new(H265Params::new()),
    }
}
