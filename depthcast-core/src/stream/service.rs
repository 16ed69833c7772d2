//! Sender-side streaming service.
//!
//! Orchestrates the full per-tick pipeline:
//!
//! 1. A [`CaptureSource`] acquires a native depth+color frame.
//! 2. [`FrameReducer`] downsamples it to the payload budget.
//! 3. [`FrameEncoder`] serializes the wire message cycle.
//! 4. [`BroadcastChannel`] sends one datagram per message.
//!
//! The service runs in a Tokio task and stops via its cloneable
//! `running` flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::CastError;
use crate::stream::encoder::FrameEncoder;
use crate::stream::plan::FramePlan;
use crate::stream::reduce::{ClipWindow, FrameReducer};
use crate::stream::types::CaptureSource;
use crate::transport::BroadcastChannel;
use crate::wire::{HEADER_LEN, MAX_PAYLOAD_SIZE};

// ── StreamServiceConfig ──────────────────────────────────────────

/// Configuration for [`StreamService`].
#[derive(Debug, Clone)]
pub struct StreamServiceConfig {
    /// Target ticks (frames) per second.
    pub tick_rate: f64,
    /// Per-message byte budget, datagram header excluded.
    pub max_payload: usize,
    /// Optional column window of the native depth frame to stream.
    /// `None` streams the full width.
    pub clip: Option<ClipWindow>,
}

impl Default for StreamServiceConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            max_payload: MAX_PAYLOAD_SIZE,
            clip: None,
        }
    }
}

impl StreamServiceConfig {
    /// The largest depth sample count one message can carry under this
    /// payload budget. Depth is the widest per-sample element, so it
    /// bounds the whole plan.
    pub fn sample_budget(&self) -> u32 {
        ((self.max_payload - HEADER_LEN) / 2) as u32
    }
}

// ── StreamService ────────────────────────────────────────────────

/// Sender-side streaming service.
///
/// # Lifetime
///
/// Call [`run`](Self::run) to start the tick loop. It runs until
/// [`stop`](Self::stop) is called or an unrecoverable error occurs.
pub struct StreamService<S: CaptureSource> {
    source: S,
    reducer: FrameReducer,
    encoder: FrameEncoder,
    transport: Arc<BroadcastChannel>,
    running: Arc<AtomicBool>,
    config: StreamServiceConfig,
}

impl<S: CaptureSource> StreamService<S> {
    /// Create a service with default configuration.
    pub fn new(source: S, transport: BroadcastChannel) -> Result<Self, CastError> {
        Self::with_config(source, transport, StreamServiceConfig::default())
    }

    /// Create a service with explicit configuration.
    ///
    /// The frame plan is fixed here from the source's native depth
    /// resolution and never recomputed mid-session.
    pub fn with_config(
        source: S,
        transport: BroadcastChannel,
        config: StreamServiceConfig,
    ) -> Result<Self, CastError> {
        if !(config.tick_rate > 0.0) {
            return Err(CastError::Configuration("tick rate must be positive"));
        }
        if config.max_payload <= HEADER_LEN + 1 || config.max_payload > MAX_PAYLOAD_SIZE {
            return Err(CastError::Configuration("payload budget out of range"));
        }

        let depth_size = source.depth_resolution();
        let plan = FramePlan::plan(depth_size, config.sample_budget())?;
        let clip = config.clip.unwrap_or_else(|| ClipWindow::full(depth_size));
        let reducer = FrameReducer::new(plan, depth_size, source.color_resolution(), clip)?;

        tracing::info!(
            factor = plan.factor,
            width = reducer.output_resolution().width,
            height = reducer.output_resolution().height,
            "stream plan fixed for session"
        );

        Ok(Self {
            source,
            reducer,
            encoder: FrameEncoder::new().with_max_payload(config.max_payload),
            transport: Arc::new(transport),
            running: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    /// A cloneable handle that can stop the service from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Frames sent since start.
    pub fn frames_sent(&self) -> u64 {
        self.encoder.frame_count()
    }

    /// Total bytes handed to the transport.
    pub fn bytes_sent(&self) -> u64 {
        self.transport.bytes_sent()
    }

    /// Run the tick loop.
    ///
    /// Intended to be spawned on the Tokio runtime:
    ///
    /// ```no_run
    /// # use depthcast_core::stream::service::StreamService;
    /// # use depthcast_core::stream::types::CaptureSource;
    /// # async fn example<S: CaptureSource + Send + 'static>(mut svc: StreamService<S>) {
    /// let handle = svc.stop_handle();
    /// tokio::spawn(async move { svc.run().await });
    /// // … later …
    /// handle.store(false, std::sync::atomic::Ordering::SeqCst);
    /// # }
    /// ```
    pub async fn run(&mut self) -> Result<(), CastError> {
        self.running.store(true, Ordering::SeqCst);
        let tick_interval = Duration::from_secs_f64(1.0 / self.config.tick_rate);

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            // 1. Capture. A tick with no fresh frame sends nothing.
            let capture = match self.source.capture_tick()? {
                Some(c) => c,
                None => {
                    Self::pace(tick_start, tick_interval).await;
                    continue;
                }
            };

            // 2. Reduce.
            let reduced = self.reducer.reduce(&capture)?;

            // 3. Encode.
            let messages = self.encoder.encode(reduced);

            // 4. Send, in cycle order.
            for msg in &messages {
                self.transport.send(&msg.encode()).await?;
            }
            tracing::trace!(messages = messages.len(), "tick sent");

            // 5. Tick pacing.
            Self::pace(tick_start, tick_interval).await;
        }

        Ok(())
    }

    /// Signal the service to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the tick loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sleep for the remainder of the tick interval.
    async fn pace(tick_start: Instant, interval: Duration) {
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::types::{ColorPoint, RawCapture, Resolution};
    use tokio::net::UdpSocket;

    /// Delivers a fixed number of identity-mapped frames, then stops
    /// reporting new data.
    struct ScriptedSource {
        size: Resolution,
        remaining: u32,
    }

    impl CaptureSource for ScriptedSource {
        fn depth_resolution(&self) -> Resolution {
            self.size
        }

        fn color_resolution(&self) -> Resolution {
            self.size
        }

        fn capture_tick(&mut self) -> Result<Option<RawCapture>, CastError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let pixels = self.size.pixel_count();
            Ok(Some(RawCapture {
                depth_size: self.size,
                color_size: self.size,
                depth: vec![500; pixels],
                color: vec![128; pixels * 4],
                mapping: (0..pixels)
                    .map(|i| {
                        ColorPoint::new(
                            (i % self.size.width as usize) as f64,
                            (i / self.size.width as usize) as f64,
                        )
                    })
                    .collect(),
            }))
        }
    }

    async fn service_over_loopback(
        frames: u32,
    ) -> (StreamService<ScriptedSource>, BroadcastChannel) {
        let tx_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rx_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rx_addr = rx_sock.local_addr().unwrap();

        let source = ScriptedSource {
            size: Resolution::new(4, 4),
            remaining: frames,
        };
        let svc = StreamService::with_config(
            source,
            BroadcastChannel::connect(tx_sock, rx_addr, 1),
            StreamServiceConfig {
                tick_rate: 500.0,
                ..Default::default()
            },
        )
        .unwrap();
        (svc, BroadcastChannel::listen(rx_sock, 1))
    }

    #[tokio::test]
    async fn streams_and_stops() {
        let (mut svc, rx) = service_over_loopback(2).await;
        let handle = svc.stop_handle();

        let task = tokio::spawn(async move {
            svc.run().await.unwrap();
            svc.frames_sent()
        });

        // First tick: General + Depth1 + 3 colors.
        for _ in 0..5 {
            rx.recv().await.unwrap();
        }
        // Second tick: General suppressed.
        let payload = rx.recv().await.unwrap();
        assert_eq!(payload[0], 1); // Depth1 tag

        handle.store(false, Ordering::SeqCst);
        assert_eq!(task.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rejects_nonpositive_tick_rate() {
        let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = sock.local_addr().unwrap();
        let source = ScriptedSource {
            size: Resolution::new(4, 4),
            remaining: 0,
        };
        let result = StreamService::with_config(
            source,
            BroadcastChannel::connect(sock, addr, 0),
            StreamServiceConfig {
                tick_rate: 0.0,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(CastError::Configuration(_))));
    }
}
