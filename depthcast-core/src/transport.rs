//! UDP broadcast channel with unreliable-sequenced delivery.
//!
//! Each protocol message travels as exactly one datagram prefixed by a
//! small channel header. The receive side enforces *sequenced* delivery
//! per channel: a datagram whose sequence number is not strictly newer
//! than the last accepted one is silently dropped. Nothing is ever
//! retransmitted or acknowledged — the protocol above is built to
//! tolerate arbitrary loss.
//!
//! ## Datagram layout (little-endian)
//!
//! ```text
//! u8   channel    logical channel id
//! u32  sequence   per-sender monotonic counter
//! [u8] payload    one encoded WireMessage, ≤ MAX_PAYLOAD_SIZE
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tokio::net::UdpSocket;

use crate::error::CastError;
use crate::wire::MAX_PAYLOAD_SIZE;

// ── Constants ────────────────────────────────────────────────────

/// Bytes occupied by the channel id and sequence number.
pub const CHANNEL_HEADER_LEN: usize = 5;

// ── BroadcastChannel ─────────────────────────────────────────────

/// One logical unreliable-sequenced message channel over UDP.
///
/// The sender side stamps each datagram with a monotonically increasing
/// sequence number; the receiver side drops duplicates and reordered
/// datagrams so the messages it yields are always in send order (with
/// gaps where the network lost something).
pub struct BroadcastChannel {
    socket: UdpSocket,
    remote: Option<SocketAddr>,
    channel: u8,
    next_sequence: AtomicU32,
    /// Last accepted sequence + 1, shifted by 1 so 0 means "none yet".
    last_accepted: AtomicU64,
    /// Total bytes sent since construction.
    bytes_sent: AtomicU64,
}

impl BroadcastChannel {
    /// Wrap an already-bound socket for sending to `remote`.
    pub fn connect(socket: UdpSocket, remote: SocketAddr, channel: u8) -> Self {
        Self {
            socket,
            remote: Some(remote),
            channel,
            next_sequence: AtomicU32::new(0),
            last_accepted: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Wrap an already-bound socket for receive-only use.
    pub fn listen(socket: UdpSocket, channel: u8) -> Self {
        Self {
            socket,
            remote: None,
            channel,
            next_sequence: AtomicU32::new(0),
            last_accepted: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// The logical channel id this endpoint filters on.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Total bytes handed to the socket across all sends.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Broadcast one message payload as a single datagram.
    ///
    /// Best effort: a datagram the network drops is gone; the caller
    /// must not rely on delivery.
    pub async fn send(&self, payload: &[u8]) -> Result<(), CastError> {
        let remote = self.remote.ok_or(CastError::NoRemote)?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(CastError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let seq = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let mut pkt = Vec::with_capacity(CHANNEL_HEADER_LEN + payload.len());
        pkt.push(self.channel);
        pkt.extend_from_slice(&seq.to_le_bytes());
        pkt.extend_from_slice(payload);

        self.socket.send_to(&pkt, remote).await?;
        self.bytes_sent.fetch_add(pkt.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Receive the next in-order message payload on this channel.
    ///
    /// Datagrams for other channels, datagrams too short to carry the
    /// channel header, and stale/duplicate sequence numbers are
    /// silently skipped.
    pub async fn recv(&self) -> Result<Vec<u8>, CastError> {
        let mut buf = vec![0u8; CHANNEL_HEADER_LEN + MAX_PAYLOAD_SIZE];
        loop {
            let (len, _) = self.socket.recv_from(&mut buf).await?;
            if len < CHANNEL_HEADER_LEN {
                continue;
            }
            if buf[0] != self.channel {
                continue;
            }

            let seq = u32::from_le_bytes(buf[1..5].try_into().expect("4-byte slice"));
            if !self.accept_sequence(seq) {
                tracing::trace!(seq, "dropping stale datagram");
                continue;
            }

            return Ok(buf[CHANNEL_HEADER_LEN..len].to_vec());
        }
    }

    /// Returns a reference to the underlying socket.
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }

    /// Record `seq` if it is strictly newer than everything accepted
    /// so far; returns `false` for duplicates and reordered arrivals.
    fn accept_sequence(&self, seq: u32) -> bool {
        let candidate = seq as u64 + 1;
        let mut seen = self.last_accepted.load(Ordering::Acquire);
        loop {
            if candidate <= seen {
                return false;
            }
            match self.last_accepted.compare_exchange_weak(
                seen,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => seen = actual,
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
