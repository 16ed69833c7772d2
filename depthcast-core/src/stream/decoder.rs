//! Receiver-side frame reassembly state machine.
//!
//! Consumes [`WireMessage`]s in arrival order and rebuilds a depth
//! array plus three normalized color channels in place. The transport
//! may drop any message without notice, so the machine is built as a
//! tag dispatch: each handler checks the arriving tag against the
//! stage it expected and re-derives its position in the cycle from the
//! tag itself rather than stalling on a strict linear expectation.
//!
//! Recovery rules:
//! - `General` is handled from any stage (no-op while dimensions are
//!   unchanged, reallocation when they differ).
//! - `Depth1` is accepted from any stage — it anchors a new cycle, so
//!   a decoder that lost the tail of the previous cycle resumes on the
//!   very next depth message.
//! - Any other mismatched tag drops the message and resets the stage
//!   to `AwaitDepth1`. The worst case for a single dropped message is
//!   the loss of one full depth/color cycle, never a permanent hang.
//!
//! Per-message failures are absorbed into [`DecodeStats`]; the
//! consumer only ever observes the latest (possibly torn) frame.

use std::fmt;

use crate::stream::types::DepthRange;
use crate::wire::{MessageKind, WireMessage};

// ── PointFrame ───────────────────────────────────────────────────

/// The receiver's reconstruction of a reduced frame.
///
/// Exclusively owned and mutated by the decoder; consumers get
/// read-only access via [`FrameDecoder::latest_frame`]. Depth and
/// color may come from different ticks — torn frames are an intrinsic
/// property of the protocol, not a defect to buffer away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Depth in millimeters, row-major.
    pub depth: Vec<u16>,
    /// Red channel, normalized to `[0, 1]`.
    pub red: Vec<f32>,
    /// Green channel, normalized to `[0, 1]`.
    pub green: Vec<f32>,
    /// Blue channel, normalized to `[0, 1]`.
    pub blue: Vec<f32>,
}

impl PointFrame {
    fn allocate(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            depth: vec![0; pixels],
            red: vec![0.0; pixels],
            green: vec![0.0; pixels],
            blue: vec![0.0; pixels],
        }
    }

    /// Pixel count.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Whether pixel `i` carries a real measurement. Consumers use
    /// this to synthesize opacity (alpha 1 for valid, 0 for sentinel)
    /// — alpha is never transmitted.
    pub fn depth_valid(&self, i: usize, range: &DepthRange) -> bool {
        self.depth.get(i).is_some_and(|&d| range.contains(d))
    }
}

// ── DecodeStage ──────────────────────────────────────────────────

/// Position in the message cycle. Threaded explicitly through every
/// handler — never implied by object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeStage {
    /// No dimension announcement yet; buffers unallocated.
    #[default]
    AwaitGeneral,
    AwaitDepth1,
    AwaitDepth2,
    AwaitRed,
    AwaitGreen,
    AwaitBlue,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── DecodeStats ──────────────────────────────────────────────────

/// Diagnostic counters for absorbed per-message failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Messages whose tag did not match the expected stage.
    pub desyncs: u64,
    /// Messages discarded for carrying fewer bytes than declared, or
    /// declaring more samples than the negotiated frame holds.
    pub truncated: u64,
    /// `General` messages ignored because dimensions were unchanged.
    pub ignored_general: u64,
    /// Fully completed depth+color cycles.
    pub completed_cycles: u64,
}

// ── FrameDecoder ─────────────────────────────────────────────────

/// The receiver state machine.
pub struct FrameDecoder {
    frame: PointFrame,
    stage: DecodeStage,
    /// Next depth index a `Depth2` continuation would write.
    depth_cursor: usize,
    stats: DecodeStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder awaiting its first dimension announcement.
    pub fn new() -> Self {
        Self {
            frame: PointFrame::default(),
            stage: DecodeStage::AwaitGeneral,
            depth_cursor: 0,
            stats: DecodeStats::default(),
        }
    }

    /// The latest reconstructed frame, valid until the next
    /// successfully applied message.
    pub fn latest_frame(&self) -> &PointFrame {
        &self.frame
    }

    /// Current cycle position.
    pub fn stage(&self) -> DecodeStage {
        self.stage
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Apply one inbound message. Returns `true` when the frame was
    /// mutated. Never fails: malformed or unexpected messages are
    /// counted and dropped.
    pub fn handle(&mut self, msg: &WireMessage) -> bool {
        match msg.kind() {
            MessageKind::General => self.on_general(msg),
            MessageKind::Depth1 => self.on_depth1(msg),
            MessageKind::Depth2 => self.on_depth2(msg),
            kind => self.on_color(kind, msg),
        }
    }

    // ── Handlers ─────────────────────────────────────────────────

    fn on_general(&mut self, msg: &WireMessage) -> bool {
        let (w, h) = match msg.general_dims() {
            Ok(dims) => dims,
            Err(_) => {
                self.stats.truncated += 1;
                return false;
            }
        };
        if w <= 0 || h <= 0 {
            tracing::warn!(w, h, "discarding General with non-positive dimensions");
            self.stats.truncated += 1;
            return false;
        }
        let (w, h) = (w as u32, h as u32);

        if self.frame.width == w && self.frame.height == h {
            // Re-announcement of the running session: reallocating
            // here every tick would thrash, so it is a no-op.
            self.stats.ignored_general += 1;
            return false;
        }

        tracing::info!(width = w, height = h, "frame dimensions (re)negotiated");
        self.frame = PointFrame::allocate(w, h);
        self.depth_cursor = 0;
        self.stage = DecodeStage::AwaitDepth1;
        true
    }

    fn on_depth1(&mut self, msg: &WireMessage) -> bool {
        if self.frame.is_empty() {
            // No General yet: there is nothing to size the write by.
            self.stats.desyncs += 1;
            return false;
        }
        if self.stage != DecodeStage::AwaitDepth1 {
            // A new cycle is starting earlier than expected — the rest
            // of the previous one was lost. Resynchronize on it.
            tracing::debug!(stage = %self.stage, "Depth1 while mid-cycle; resynchronizing");
            self.stats.desyncs += 1;
        }

        let count = msg.count() as usize;
        if count > self.frame.len() || msg.depth_sample_len() < count {
            self.stats.truncated += 1;
            return false;
        }

        for (i, sample) in msg.depth_samples().take(count).enumerate() {
            self.frame.depth[i] = sample;
        }
        self.depth_cursor = count;
        self.stage = if count < self.frame.len() {
            DecodeStage::AwaitDepth2
        } else {
            DecodeStage::AwaitRed
        };
        true
    }

    fn on_depth2(&mut self, msg: &WireMessage) -> bool {
        if self.stage != DecodeStage::AwaitDepth2 {
            self.desync(MessageKind::Depth2);
            return false;
        }

        // The continuation declares the frame total and carries the
        // samples from the cursor onward.
        let total = msg.count() as usize;
        if total > self.frame.len() || total < self.depth_cursor {
            self.stats.truncated += 1;
            return false;
        }
        let tail = total - self.depth_cursor;
        if msg.depth_sample_len() < tail {
            self.stats.truncated += 1;
            return false;
        }

        for (i, sample) in msg.depth_samples().take(tail).enumerate() {
            self.frame.depth[self.depth_cursor + i] = sample;
        }
        self.depth_cursor = total;
        self.stage = DecodeStage::AwaitRed;
        true
    }

    fn on_color(&mut self, kind: MessageKind, msg: &WireMessage) -> bool {
        let expected = match kind {
            MessageKind::Red => DecodeStage::AwaitRed,
            MessageKind::Green => DecodeStage::AwaitGreen,
            MessageKind::Blue => DecodeStage::AwaitBlue,
            _ => unreachable!("on_color only receives color kinds"),
        };
        if self.stage != expected {
            self.desync(kind);
            return false;
        }

        let count = msg.count() as usize;
        let bytes = msg.intensities();
        if count > self.frame.len() || bytes.len() < count {
            self.stats.truncated += 1;
            return false;
        }

        let channel = match kind {
            MessageKind::Red => &mut self.frame.red,
            MessageKind::Green => &mut self.frame.green,
            _ => &mut self.frame.blue,
        };
        for (i, &b) in bytes[..count].iter().enumerate() {
            channel[i] = b as f32 / 255.0;
        }

        self.stage = match kind {
            MessageKind::Red => DecodeStage::AwaitGreen,
            MessageKind::Green => DecodeStage::AwaitBlue,
            _ => {
                self.stats.completed_cycles += 1;
                DecodeStage::AwaitDepth1
            }
        };
        true
    }

    /// Drop a mismatched message and fall back to the cycle anchor.
    fn desync(&mut self, kind: MessageKind) {
        tracing::debug!(%kind, stage = %self.stage, "unexpected message kind; resetting cycle");
        self.stats.desyncs += 1;
        self.stage = if self.frame.is_empty() {
            DecodeStage::AwaitGeneral
        } else {
            DecodeStage::AwaitDepth1
        };
    }
}

// ── Tests ────────────────────────────────────────────────────────
