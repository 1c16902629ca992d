//! H.264/AVC parameter strategy.

use fv_common::VideoCodec;
use tracing::debug;

use super::{CodecParams, PictureInfo, PictureType};

/// Modulus for `frame_num`, matching `log2_max_frame_num_minus4 = 4` in the
/// session parameters.
const MAX_FRAME_NUM: u32 = 1 << 8;

/// Modulus for the picture order count LSB, matching
/// `log2_max_pic_order_cnt_lsb_minus4 = 4`.
const MAX_PIC_ORDER_CNT_LSB: i32 = 1 << 8;

/// H.264 picture numbering state.
///
/// `frame_num` advances by one per reference picture and restarts at every
/// IDR; the picture order count advances by two per frame (frame coding, no
/// field pictures). Each IDR consumes a fresh `idr_pic_id` so a repeated
/// refresh is not mistaken for a retransmission of the previous one.
pub struct H264Params {
    frame_num: u32,
    pic_order_cnt: i32,
    idr_pic_id: u16,
}

impl H264Params {
    pub fn new() -> Self {
        Self {
            frame_num: 0,
            pic_order_cnt: 0,
            idr_pic_id: 0,
        }
    }
}

impl Default for H264Params {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecParams for H264Params {
    fn codec(&self) -> VideoCodec {
        VideoCodec::H264
    }

    fn signal_refresh(&mut self) {
        self.idr_pic_id = self.idr_pic_id.wrapping_add(1);
        debug!(idr_pic_id = self.idr_pic_id, "H.264 refresh requested");
    }

    fn picture(&mut self, has_reference: bool) -> PictureInfo {
        if !has_reference {
            let info = PictureInfo {
                picture_type: PictureType::Idr,
                frame_num: 0,
                pic_order_cnt: 0,
                idr_id: self.idr_pic_id,
            };
            self.idr_pic_id = self.idr_pic_id.wrapping_add(1);
            self.frame_num = 1;
            self.pic_order_cnt = 2;
            return info;
        }

        let info = PictureInfo {
            picture_type: PictureType::P,
            frame_num: self.frame_num,
            pic_order_cnt: self.pic_order_cnt,
            idr_id: 0,
        };
        self.frame_num = (self.frame_num + 1) % MAX_FRAME_NUM;
        self.pic_order_cnt = (self.pic_order_cnt + 2) % MAX_PIC_ORDER_CNT_LSB;
        info
    }
}
