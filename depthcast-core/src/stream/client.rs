//! Receiver-side frame consumer.
//!
//! Receives datagrams from the [`BroadcastChannel`], feeds them through
//! the [`FrameDecoder`] state machine, and publishes the latest
//! [`PointFrame`] to the render layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::watch;

use crate::error::CastError;
use crate::stream::decoder::{DecodeStats, FrameDecoder, PointFrame};
use crate::transport::BroadcastChannel;
use crate::wire::WireMessage;

// ── FrameStats ───────────────────────────────────────────────────

/// Receive-side statistics exposed to the consumer.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Smoothed completed cycles per second.
    pub cycles_per_second: f64,
    /// Total datagrams received since start.
    pub total_messages: u64,
    /// Total payload bytes received.
    pub total_bytes: u64,
    /// Datagrams that failed wire decoding.
    pub malformed: u64,
    /// Decoder state machine counters.
    pub decode: DecodeStats,
    /// Latest frame width.
    pub width: u32,
    /// Latest frame height.
    pub height: u32,
}

// ── StreamClient ─────────────────────────────────────────────────

/// Receiver that reassembles frames from the broadcast channel.
///
/// The reconstructed frame is published via a `tokio::sync::watch`
/// channel so the renderer can read the latest frame without blocking
/// the receive loop.
pub struct StreamClient {
    transport: Arc<BroadcastChannel>,
    decoder: FrameDecoder,
    running: Arc<AtomicBool>,
    /// Sender half of the frame watch channel.
    frame_tx: watch::Sender<PointFrame>,
    /// Receiver half, clone this to get frames in the renderer.
    frame_rx: watch::Receiver<PointFrame>,
    /// Stats channel.
    stats_tx: watch::Sender<FrameStats>,
    stats_rx: watch::Receiver<FrameStats>,
}

impl StreamClient {
    /// Create a client wrapping the given transport.
    pub fn new(transport: BroadcastChannel) -> Self {
        let (frame_tx, frame_rx) = watch::channel(PointFrame::default());
        let (stats_tx, stats_rx) = watch::channel(FrameStats::default());
        Self {
            transport: Arc::new(transport),
            decoder: FrameDecoder::new(),
            running: Arc::new(AtomicBool::new(false)),
            frame_tx,
            frame_rx,
            stats_tx,
            stats_rx,
        }
    }

    /// Obtain a `watch::Receiver` that yields the latest reconstructed
    /// frame whenever a message mutates it.
    pub fn frame_receiver(&self) -> watch::Receiver<PointFrame> {
        self.frame_rx.clone()
    }

    /// Obtain a `watch::Receiver` for receive statistics.
    pub fn stats_receiver(&self) -> watch::Receiver<FrameStats> {
        self.stats_rx.clone()
    }

    /// A cloneable stop handle.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run the receive loop.
    ///
    /// Blocks the calling task until [`stop`](Self::stop) is invoked
    /// or the transport encounters an unrecoverable error. Per-message
    /// protocol failures never stop the loop; they are absorbed into
    /// the published stats.
    pub async fn run(&mut self) -> Result<(), CastError> {
        self.running.store(true, Ordering::SeqCst);

        let mut total_messages: u64 = 0;
        let mut total_bytes: u64 = 0;
        let mut malformed: u64 = 0;
        let mut cycle_times: Vec<Instant> = Vec::with_capacity(64);

        while self.running.load(Ordering::SeqCst) {
            let payload = self.transport.recv().await?;
            total_messages += 1;
            total_bytes += payload.len() as u64;

            let msg = match WireMessage::decode(&payload) {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(error = %e, "discarding malformed datagram");
                    malformed += 1;
                    continue;
                }
            };

            let cycles_before = self.decoder.stats().completed_cycles;
            let mutated = self.decoder.handle(&msg);

            if mutated {
                let _ = self.frame_tx.send(self.decoder.latest_frame().clone());
            }

            // Cycle-rate tracking over a sliding window.
            if self.decoder.stats().completed_cycles > cycles_before {
                cycle_times.push(Instant::now());
                if cycle_times.len() > 60 {
                    cycle_times.remove(0);
                }
            }
            let cycles_per_second = match (cycle_times.first(), cycle_times.last()) {
                (Some(&first), Some(&last)) if last > first => {
                    (cycle_times.len() - 1) as f64 / (last - first).as_secs_f64()
                }
                _ => 0.0,
            };

            let frame = self.decoder.latest_frame();
            let _ = self.stats_tx.send(FrameStats {
                cycles_per_second,
                total_messages,
                total_bytes,
                malformed,
                decode: self.decoder.stats(),
                width: frame.width,
                height: frame.height,
            });
        }

        Ok(())
    }

    /// Signal the client to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the receive loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MessageKind;
    use tokio::net::UdpSocket;

    async fn loopback_client() -> (BroadcastChannel, StreamClient) {
        let tx_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rx_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rx_addr = rx_sock.local_addr().unwrap();
        (
            BroadcastChannel::connect(tx_sock, rx_addr, 2),
            StreamClient::new(BroadcastChannel::listen(rx_sock, 2)),
        )
    }

    #[tokio::test]
    async fn publishes_reconstructed_frames() {
        let (tx, mut client) = loopback_client().await;
        let mut frames = client.frame_receiver();
        let handle = client.stop_handle();
        tokio::spawn(async move { client.run().await });

        let cycle = [
            WireMessage::general(2, 2),
            WireMessage::depth_first(&[10, 20, 30, 40]),
            WireMessage::color(MessageKind::Red, &[255, 0, 0, 0]),
            WireMessage::color(MessageKind::Green, &[0, 255, 0, 0]),
            WireMessage::color(MessageKind::Blue, &[0, 0, 255, 0]),
        ];
        for msg in &cycle {
            tx.send(&msg.encode()).await.unwrap();
        }

        // Wait until the full cycle has been applied.
        loop {
            frames.changed().await.unwrap();
            let frame = frames.borrow_and_update().clone();
            if frame.blue.first() == Some(&1.0) {
                assert_eq!(frame.depth, vec![10, 20, 30, 40]);
                assert_eq!(frame.red[0], 1.0);
                assert_eq!(frame.green[1], 1.0);
                break;
            }
        }
        handle.store(false, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn malformed_datagrams_counted_not_fatal() {
        let (tx, mut client) = loopback_client().await;
        let mut stats = client.stats_receiver();
        let handle = client.stop_handle();
        tokio::spawn(async move { client.run().await });

        // Unknown tag 9, then a valid General.
        tx.send(&[9, 0, 0, 0, 0]).await.unwrap();
        tx.send(&WireMessage::general(2, 2).encode()).await.unwrap();

        loop {
            stats.changed().await.unwrap();
            let snapshot = stats.borrow_and_update().clone();
            if snapshot.width == 2 {
                assert_eq!(snapshot.malformed, 1);
                assert_eq!(snapshot.total_messages, 2);
                break;
            }
        }
        handle.store(false, Ordering::SeqCst);
    }
}
