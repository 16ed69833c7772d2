//! # depthcast-core
//!
//! Core library for broadcasting depth+color sensor frames over
//! unreliable-sequenced UDP, one reduced frame per tick, with every
//! message fitting a hard per-datagram byte budget.
//!
//! This crate contains:
//! - **Wire protocol**: `WireMessage` / `MessageKind`, the tagged
//!   little-endian message format
//! - **Transport**: `BroadcastChannel`, unreliable-sequenced datagram
//!   delivery with stale-datagram suppression
//! - **Pipeline**: budget planning, projection, reduction, encoding
//!   and the receiver state machine under [`stream`]
//! - **Error**: `CastError`, the typed `thiserror`-based hierarchy

pub mod error;
pub mod stream;
pub mod transport;
pub mod wire;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::CastError;
pub use transport::BroadcastChannel;
pub use wire::{MessageKind, WireMessage, HEADER_LEN, MAX_PAYLOAD_SIZE};

pub use stream::{
    CaptureSource, DecodeStats, DepthRange, FrameDecoder, FrameEncoder, FramePlan, FrameReducer,
    PointFrame, RawCapture, Resolution, StreamClient, StreamService, StreamServiceConfig,
};
