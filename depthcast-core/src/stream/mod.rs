//! Depth+color frame streaming pipeline.
//!
//! ## Architecture
//!
//! ```text
//! SENDER                                      RECEIVER
//! ┌─────────────────────────┐                ┌──────────────────────┐
//! │ CaptureSource           │                │ FrameDecoder         │
//! │   ↓                     │                │   ↓                  │
//! │ FrameReducer            │  UDP broadcast │ PointFrame           │
//! │   ↓                     │ ──────────►    │   ↓                  │
//! │ FrameEncoder            │                │ Render / consume     │
//! │   ↓                     │                │                      │
//! │ BroadcastChannel::send  │                │ BroadcastChannel::recv│
//! └─────────────────────────┘                └──────────────────────┘
//! ```
//!
//! ## Sub-modules
//!
//! | Module    | Purpose                                              |
//! |-----------|------------------------------------------------------|
//! | `types`   | Shared frame / capture types used across the pipeline |
//! | `plan`    | Per-session downsample factor computation             |
//! | `project` | Depth-space → color-space pixel projection            |
//! | `reduce`  | Stride sampling into budget-sized frames              |
//! | `encoder` | Reduced frame → ordered wire message cycle            |
//! | `decoder` | Receiver state machine reassembling frames            |
//! | `service` | Sender-side tick loop orchestrator                    |
//! | `client`  | Receiver-side frame consumer                          |

pub mod client;
pub mod decoder;
pub mod encoder;
pub mod plan;
pub mod project;
pub mod reduce;
pub mod service;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use client::{FrameStats, StreamClient};
pub use decoder::{DecodeStage, DecodeStats, FrameDecoder, PointFrame};
pub use encoder::FrameEncoder;
pub use plan::FramePlan;
pub use project::project;
pub use reduce::{ClipWindow, FrameReducer, ReducedFrame};
pub use service::{StreamService, StreamServiceConfig};
pub use types::{CaptureSource, ColorPoint, DepthRange, RawCapture, Resolution, BYTES_PER_PIXEL};
