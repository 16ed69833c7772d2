//! Domain-specific error types for the depthcast protocol.
//!
//! All fallible operations return `Result<T, CastError>`.
//! No panics on invalid input — every error is typed and recoverable.
//! Only `Configuration` is ever fatal, and only at session setup;
//! per-message decode failures are absorbed inside the decoder and
//! show up as counters, never as errors to the consumer.

use thiserror::Error;

/// The canonical error type for the depthcast protocol.
#[derive(Debug, Error)]
pub enum CastError {
    // ── Session setup ────────────────────────────────────────────
    /// Zero resolution, empty payload budget, degenerate clip window —
    /// anything that makes a streaming session impossible to start.
    #[error("invalid configuration: {0}")]
    Configuration(&'static str),

    // ── Wire errors ──────────────────────────────────────────────
    /// A message declared more elements than its payload carries.
    #[error("truncated message: need {expected} payload bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// A message violated protocol rules (negative count, odd depth
    /// payload, sample count exceeding the negotiated frame size).
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The payload exceeds the transport's maximum message size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Transport errors ─────────────────────────────────────────
    /// The UDP/IO layer reported an error.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Send attempted on a channel with no remote address configured.
    #[error("channel has no remote address")]
    NoRemote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = CastError::Configuration("zero resolution");
        assert!(e.to_string().contains("zero resolution"));

        let e = CastError::Truncated {
            expected: 100,
            actual: 60,
        };
        assert!(e.to_string().contains("100"));
        assert!(e.to_string().contains("60"));

        let e = CastError::PayloadTooLarge {
            size: 70_000,
            max: 60_000,
        };
        assert!(e.to_string().contains("70000"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: CastError = io_err.into();
        assert!(matches!(e, CastError::Io(_)));
    }
}
