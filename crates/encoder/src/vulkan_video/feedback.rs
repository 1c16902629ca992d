//! Lock-free tracking of decoder acknowledgements.

use std::sync::atomic::{AtomicU64, Ordering};

use fv_common::DecoderFeedback;

/// Most recent frame index the remote decoder has confirmed.
///
/// The network receive path calls [`record`](Self::record) from whatever
/// thread delivers acknowledgements; the submission engine reads
/// [`last_acknowledged`](Self::last_acknowledged) on every frame. The value
/// only moves forward: stale or out-of-order acknowledgements are dropped by
/// the compare-exchange loop, and the feedback path never blocks on
/// submission progress.
///
/// Internally the atomic stores `frame_index + 1`, with 0 meaning "none
/// acknowledged yet".
#[derive(Debug, Default)]
pub struct FeedbackTracker {
    last_ack: AtomicU64,
}

impl FeedbackTracker {
    pub const fn new() -> Self {
        Self {
            last_ack: AtomicU64::new(0),
        }
    }

    /// Record a decoder acknowledgement.
    ///
    /// Undelivered frames carry no new information and are ignored. Newer
    /// acknowledgements overwrite older ones; anything else is a no-op, so
    /// the operation is idempotent and monotonic.
    pub fn record(&self, feedback: DecoderFeedback) {
        if !feedback.delivered {
            return;
        }
        let goal = feedback.frame_index.saturating_add(1);
        let mut current = self.last_ack.load(Ordering::Acquire);
        while current < goal {
            match self.last_ack.compare_exchange_weak(
                current,
                goal,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// The last acknowledged frame index, if any frame was ever confirmed.
    pub fn last_acknowledged(&self) -> Option<u64> {
        match self.last_ack.load(Ordering::Acquire) {
            0 => None,
            stored => Some(stored - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn delivered(frame_index: u64) -> DecoderFeedback {
        DecoderFeedback {
            frame_index,
            delivered: true,
        }
    }

    #[test]
    fn starts_with_nothing_acknowledged() {
        let tracker = FeedbackTracker::new();
        assert_eq!(tracker.last_acknowledged(), None);
    }

    #[test]
    fn monotonic_and_idempotent() {
        let tracker = FeedbackTracker::new();
        tracker.record(delivered(5));
        tracker.record(delivered(3));
        tracker.record(delivered(5));
        assert_eq!(tracker.last_acknowledged(), Some(5));
    }

    #[test]
    fn frame_zero_can_be_acknowledged() {
        let tracker = FeedbackTracker::new();
        tracker.record(delivered(0));
        assert_eq!(tracker.last_acknowledged(), Some(0));
    }

    #[test]
    fn undelivered_frames_are_ignored() {
        let tracker = FeedbackTracker::new();
        tracker.record(DecoderFeedback {
            frame_index: 9,
            delivered: false,
        });
        assert_eq!(tracker.last_acknowledged(), None);

        tracker.record(delivered(4));
        tracker.record(DecoderFeedback {
            frame_index: 12,
            delivered: false,
        });
        assert_eq!(tracker.last_acknowledged(), Some(4));
    }

    #[test]
    fn concurrent_recording_keeps_the_maximum() {
        let tracker = Arc::new(FeedbackTracker::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..1000u64 {
                        tracker.record(delivered(t * 1000 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.last_acknowledged(), Some(3999));
    }
}
