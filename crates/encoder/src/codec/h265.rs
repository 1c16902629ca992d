//! H.265/HEVC parameter strategy.

use fv_common::VideoCodec;
use tracing::debug;

use super::{CodecParams, PictureInfo, PictureType};

/// Modulus for the picture order count LSB, matching
/// `log2_max_pic_order_cnt_lsb_minus4 = 4`.
const MAX_PIC_ORDER_CNT_LSB: i32 = 1 << 8;

/// H.265 picture numbering state.
///
/// HEVC has no `frame_num` or IDR identifier; only the picture order count
/// is tracked. It advances by one per picture and restarts at every IDR.
pub struct H265Params {
    pic_order_cnt: i32,
}

impl H265Params {
    pub fn new() -> Self {
        Self { pic_order_cnt: 0 }
    }
}

impl Default for H265Params {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecParams for H265Params {
    fn codec(&self) -> VideoCodec {
        VideoCodec::H265
    }

    fn signal_refresh(&mut self) {
        debug!("H.265 refresh requested");
    }

    fn picture(&mut self, has_reference: bool) -> PictureInfo {
        if !has_reference {
            self.pic_order_cnt = 1;
            return PictureInfo {
                picture_type: PictureType::Idr,
                frame_num: 0,
                pic_order_cnt: 0,
                idr_id: 0,
            };
        }

        let info = PictureInfo {
            picture_type: PictureType::P,
            frame_num: 0,
            pic_order_cnt: self.pic_order_cnt,
            idr_id: 0,
        };
        self.pic_order_cnt = (self.pic_order_cnt + 1) % MAX_PIC_ORDER_CNT_LSB;
        info
    }
}
