//! Wire format for depthcast messages.
//!
//! Every message travels as one datagram payload with a fixed 5-byte
//! header. All multi-byte fields are **little-endian**, applied
//! consistently to every field in the protocol.
//!
//! ```text
//! u8   kind           (0=General,1=Depth1,2=Depth2,3=Red,4=Green,5=Blue)
//! i32  element_count  (General: fixed 2; others: sample count)
//! <elements>
//!   General:          i32 width, i32 height
//!   Depth1/Depth2:    i16 per sample (u16 millimeters bit-cast on encode,
//!                     bit-cast back on decode — never clamped)
//!   Red/Green/Blue:   u8 intensity per sample
//! ```
//!
//! For `Depth2` the element count declares the **total** depth sample
//! count of the frame; the payload carries only the tail starting at
//! the index where the preceding `Depth1` stopped. See
//! [`FrameDecoder`](crate::stream::decoder::FrameDecoder).

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::CastError;

// ── Constants ────────────────────────────────────────────────────

/// Maximum size of a single transport message in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 60_000;

/// Bytes occupied by the kind tag and element count.
pub const HEADER_LEN: usize = 5;

// ── MessageKind ──────────────────────────────────────────────────

/// Identifies the six message types of the frame cycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Frame width/height announcement.
    General = 0,
    /// Depth samples starting at index 0.
    Depth1 = 1,
    /// Depth continuation after a budget split.
    Depth2 = 2,
    /// Red channel intensities.
    Red = 3,
    /// Green channel intensities.
    Green = 4,
    /// Blue channel intensities.
    Blue = 5,
}

impl TryFrom<u8> for MessageKind {
    type Error = CastError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageKind::General),
            1 => Ok(MessageKind::Depth1),
            2 => Ok(MessageKind::Depth2),
            3 => Ok(MessageKind::Red),
            4 => Ok(MessageKind::Green),
            5 => Ok(MessageKind::Blue),
            _ => Err(CastError::UnknownVariant {
                type_name: "MessageKind",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl MessageKind {
    /// Bytes occupied by one element of this kind.
    pub const fn element_size(self) -> usize {
        match self {
            MessageKind::General => 4,
            MessageKind::Depth1 | MessageKind::Depth2 => 2,
            MessageKind::Red | MessageKind::Green | MessageKind::Blue => 1,
        }
    }

    /// Returns `true` for the three color-channel kinds.
    pub const fn is_color(self) -> bool {
        matches!(self, MessageKind::Red | MessageKind::Green | MessageKind::Blue)
    }
}

// ── WireMessage ──────────────────────────────────────────────────

/// One typed, length-prefixed protocol message.
///
/// The payload holds the raw element bytes exactly as they appear on
/// the wire; typed access goes through [`general_dims`](Self::general_dims),
/// [`depth_samples`](Self::depth_samples) and
/// [`intensities`](Self::intensities).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    kind: MessageKind,
    count: i32,
    payload: Vec<u8>,
}

impl WireMessage {
    /// Build a `General` dimension announcement. Element count is the
    /// fixed value 2 (two i32 fields).
    pub fn general(width: u32, height: u32) -> Self {
        let mut payload = Vec::with_capacity(8);
        payload.put_i32_le(width as i32);
        payload.put_i32_le(height as i32);
        Self {
            kind: MessageKind::General,
            count: 2,
            payload,
        }
    }

    /// Build a `Depth1` message carrying `samples` from index 0.
    ///
    /// Each u16 millimeter value is bit-cast into a signed 16-bit wire
    /// field; values past `i16::MAX` survive the round trip because the
    /// decoder reinterprets the bits rather than clamping.
    pub fn depth_first(samples: &[u16]) -> Self {
        Self {
            kind: MessageKind::Depth1,
            count: samples.len() as i32,
            payload: depth_payload(samples),
        }
    }

    /// Build a `Depth2` continuation. `total` is the full frame sample
    /// count; `tail` holds the samples from the split index onward.
    pub fn depth_continuation(total: usize, tail: &[u16]) -> Self {
        Self {
            kind: MessageKind::Depth2,
            count: total as i32,
            payload: depth_payload(tail),
        }
    }

    /// Build a color-channel message (`Red`, `Green` or `Blue`).
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a color kind (programmer error, not
    /// wire input).
    pub fn color(kind: MessageKind, intensities: &[u8]) -> Self {
        assert!(kind.is_color(), "color() requires Red/Green/Blue");
        Self {
            kind,
            count: intensities.len() as i32,
            payload: intensities.to_vec(),
        }
    }

    /// Message kind tag.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Declared element count.
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Raw element bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total encoded size on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    // ── Typed element access ─────────────────────────────────────

    /// Read the width/height fields of a `General` message.
    pub fn general_dims(&self) -> Result<(i32, i32), CastError> {
        if self.kind != MessageKind::General {
            return Err(CastError::ProtocolViolation(
                "general_dims on a non-General message",
            ));
        }
        let mut buf = self.payload.as_slice();
        if buf.len() < 8 {
            return Err(CastError::Truncated {
                expected: 8,
                actual: buf.len(),
            });
        }
        Ok((buf.get_i32_le(), buf.get_i32_le()))
    }

    /// Iterate the depth samples of a `Depth1`/`Depth2` payload,
    /// bit-reinterpreting each signed wire field as unsigned millimeters.
    pub fn depth_samples(&self) -> impl Iterator<Item = u16> + '_ {
        self.payload
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as u16)
    }

    /// Number of depth samples physically present in the payload.
    pub fn depth_sample_len(&self) -> usize {
        self.payload.len() / 2
    }

    /// The intensity bytes of a color-channel payload.
    pub fn intensities(&self) -> &[u8] {
        &self.payload
    }

    // ── Serialization ────────────────────────────────────────────

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        buf.put_u8(self.kind as u8);
        buf.put_i32_le(self.count);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Deserialize from wire bytes, validating the header against the
    /// bytes actually present. Never reads past the buffer.
    pub fn decode(data: &[u8]) -> Result<Self, CastError> {
        if data.len() < HEADER_LEN {
            return Err(CastError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let kind = MessageKind::try_from(buf.get_u8())?;
        let count = buf.get_i32_le();
        if count < 0 {
            return Err(CastError::ProtocolViolation("negative element count"));
        }

        let elements = count as usize;
        let payload = buf;
        match kind {
            // Depth2 carries a tail shorter than its declared total;
            // the cursor-sensitive length check lives in the decoder.
            MessageKind::Depth2 => {
                if payload.len() % 2 != 0 {
                    return Err(CastError::ProtocolViolation("odd depth payload length"));
                }
                if payload.len() / 2 > elements {
                    return Err(CastError::ProtocolViolation(
                        "depth continuation longer than declared total",
                    ));
                }
            }
            _ => {
                let expected = elements * kind.element_size();
                if payload.len() < expected {
                    return Err(CastError::Truncated {
                        expected,
                        actual: payload.len(),
                    });
                }
            }
        }

        Ok(Self {
            kind,
            count,
            payload: payload.to_vec(),
        })
    }
}

fn depth_payload(samples: &[u16]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        payload.put_i16_le(s as i16);
    }
    payload
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        let kinds = [
            MessageKind::General,
            MessageKind::Depth1,
            MessageKind::Depth2,
            MessageKind::Red,
            MessageKind::Green,
            MessageKind::Blue,
        ];
        for kind in kinds {
            assert_eq!(MessageKind::try_from(kind as u8).unwrap(), kind);
        }
    }

    #[test]
    fn kind_invalid() {
        assert!(MessageKind::try_from(6).is_err());
        assert!(MessageKind::try_from(0xFF).is_err());
    }

    #[test]
    fn general_roundtrip() {
        let msg = WireMessage::general(512, 424);
        let decoded = WireMessage::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.kind(), MessageKind::General);
        assert_eq!(decoded.count(), 2);
        assert_eq!(decoded.general_dims().unwrap(), (512, 424));
    }

    #[test]
    fn depth_roundtrip_bit_reinterpretation() {
        // 40_000 mm does not fit an i16; the bits must survive anyway.
        let samples = vec![0u16, 950, 40_000, u16::MAX];
        let msg = WireMessage::depth_first(&samples);
        let decoded = WireMessage::decode(&msg.encode()).unwrap();
        let out: Vec<u16> = decoded.depth_samples().collect();
        assert_eq!(out, samples);
    }

    #[test]
    fn depth_continuation_declares_total() {
        let tail = [7u16, 8, 9];
        let msg = WireMessage::depth_continuation(10, &tail);
        assert_eq!(msg.kind(), MessageKind::Depth2);
        assert_eq!(msg.count(), 10);
        assert_eq!(msg.depth_sample_len(), 3);
    }

    #[test]
    fn color_roundtrip() {
        let msg = WireMessage::color(MessageKind::Green, &[0, 128, 255]);
        let decoded = WireMessage::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.kind(), MessageKind::Green);
        assert_eq!(decoded.count(), 3);
        assert_eq!(decoded.intensities(), &[0, 128, 255]);
    }

    #[test]
    fn decode_too_short_for_header() {
        assert!(matches!(
            WireMessage::decode(&[1, 0]),
            Err(CastError::Truncated { .. })
        ));
    }

    #[test]
    fn decode_truncated_payload() {
        // Depth1 declaring 4 samples but carrying only 2.
        let mut bytes = WireMessage::depth_first(&[1, 2]).encode();
        bytes[1..5].copy_from_slice(&4i32.to_le_bytes());
        assert!(matches!(
            WireMessage::decode(&bytes),
            Err(CastError::Truncated {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn decode_negative_count() {
        let mut bytes = WireMessage::depth_first(&[1, 2]).encode();
        bytes[1..5].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            WireMessage::decode(&bytes),
            Err(CastError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn decode_unknown_kind() {
        let bytes = [9u8, 0, 0, 0, 0];
        assert!(matches!(
            WireMessage::decode(&bytes),
            Err(CastError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn general_dims_on_wrong_kind() {
        let msg = WireMessage::color(MessageKind::Red, &[1]);
        assert!(msg.general_dims().is_err());
    }
}
