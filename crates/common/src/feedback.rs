//! Decoder acknowledgement events.

use serde::{Deserialize, Serialize};

/// An acknowledgement from the remote decoder for one streamed frame.
///
/// The network receive path delivers one of these whenever the headset
/// reports on a frame. `delivered == false` means the frame never reached the
/// decoder; the event then carries no usable information for reference
/// selection and is ignored by the tracker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderFeedback {
    /// Index of the frame this acknowledgement refers to.
    pub frame_index: u64,
    /// Whether the frame was handed to the remote decoder.
    pub delivered: bool,
}
