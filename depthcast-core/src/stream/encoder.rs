//! Reduced frame → ordered wire message sequence.
//!
//! One encode pass per tick emits the frame cycle the receiver state
//! machine consumes:
//!
//! ```text
//! (General)?  Depth1  (Depth2)?  Red  Green  Blue
//! ```
//!
//! `General` is repeat-suppressed — announced on the first frame of a
//! session and again only when dimensions change. Depth normally fits a
//! single `Depth1` by construction of the frame plan; the `Depth2`
//! split exists as the fallback for a payload that would exceed the
//! budget anyway.

use crate::stream::reduce::ReducedFrame;
use crate::stream::types::BYTES_PER_PIXEL;
use crate::wire::{MessageKind, WireMessage, HEADER_LEN, MAX_PAYLOAD_SIZE};

// ── FrameEncoder ─────────────────────────────────────────────────

/// Stateful per-session encoder.
pub struct FrameEncoder {
    /// Dimensions last announced via `General`, if any.
    announced: Option<(u32, u32)>,
    /// Per-message byte budget.
    max_payload: usize,
    /// Frames encoded so far.
    frame_count: u64,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder {
    /// Create an encoder with the transport's default payload budget.
    pub fn new() -> Self {
        Self {
            announced: None,
            max_payload: MAX_PAYLOAD_SIZE,
            frame_count: 0,
        }
    }

    /// Override the per-message byte budget (must exceed the header).
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        assert!(max_payload > HEADER_LEN + 1);
        self.max_payload = max_payload;
        self
    }

    /// Number of frames encoded so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Serialize one reduced frame into its message cycle, in the
    /// exact order the messages must be sent.
    pub fn encode(&mut self, frame: &ReducedFrame) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(6);

        // Dimension announcement, suppressed while unchanged.
        let dims = (frame.width, frame.height);
        if self.announced != Some(dims) {
            messages.push(WireMessage::general(frame.width, frame.height));
            self.announced = Some(dims);
        }

        // Depth, split at the midpoint only when one message would
        // blow the budget.
        let n = frame.depth.len();
        if HEADER_LEN + 2 * n <= self.max_payload {
            messages.push(WireMessage::depth_first(&frame.depth));
        } else {
            let mid = n.div_ceil(2);
            messages.push(WireMessage::depth_first(&frame.depth[..mid]));
            messages.push(WireMessage::depth_continuation(n, &frame.depth[mid..]));
        }

        // Color as three single-byte channels; alpha never travels.
        let mut red = Vec::with_capacity(n);
        let mut green = Vec::with_capacity(n);
        let mut blue = Vec::with_capacity(n);
        for px in frame.color.chunks_exact(BYTES_PER_PIXEL) {
            red.push(px[0]);
            green.push(px[1]);
            blue.push(px[2]);
        }
        messages.push(WireMessage::color(MessageKind::Red, &red));
        messages.push(WireMessage::color(MessageKind::Green, &green));
        messages.push(WireMessage::color(MessageKind::Blue, &blue));

        self.frame_count += 1;
        messages
    }
}

// ── Tests ────────────────────────────────────────────────────────
