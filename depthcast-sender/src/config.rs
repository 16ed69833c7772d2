//! Configuration for the sender service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use depthcast_core::stream::{ClipWindow, StreamServiceConfig};
use depthcast_core::MAX_PAYLOAD_SIZE;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Streaming settings.
    pub stream: StreamConfig,
    /// Synthetic capture settings.
    pub capture: CaptureConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Local address to bind the UDP socket to.
    pub bind_addr: String,
    /// Address the frame datagrams are sent to.
    pub target_addr: String,
    /// Logical channel id stamped on every datagram.
    pub channel: u8,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Target ticks (frames) per second.
    pub tick_rate: f64,
    /// Per-message byte budget.
    pub max_payload: usize,
    /// Left edge of the streamed column window (inclusive).
    pub clip_min_x: Option<u32>,
    /// Right edge of the streamed column window (exclusive).
    pub clip_max_x: Option<u32>,
}

/// Synthetic capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Native depth frame width in pixels.
    pub depth_width: u32,
    /// Native depth frame height in pixels.
    pub depth_height: u32,
    /// Native color frame width in pixels.
    pub color_width: u32,
    /// Native color frame height in pixels.
    pub color_height: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            stream: StreamConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:0".into(),
            target_addr: "255.255.255.255:8752".into(),
            channel: 1,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            max_payload: MAX_PAYLOAD_SIZE,
            clip_min_x: None,
            clip_max_x: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        // Native Kinect v2 frame geometry.
        Self {
            depth_width: 512,
            depth_height: 424,
            color_width: 1920,
            color_height: 1080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Convert streaming settings into a `StreamServiceConfig`.
    pub fn to_service_config(&self) -> StreamServiceConfig {
        let clip = match (self.stream.clip_min_x, self.stream.clip_max_x) {
            (Some(min_x), Some(max_x)) => Some(ClipWindow::new(min_x, max_x)),
            (Some(min_x), None) => Some(ClipWindow::new(min_x, self.capture.depth_width)),
            (None, Some(max_x)) => Some(ClipWindow::new(0, max_x)),
            (None, None) => None,
        };
        StreamServiceConfig {
            tick_rate: self.stream.tick_rate,
            max_payload: self.stream.max_payload.min(MAX_PAYLOAD_SIZE),
            clip,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = SenderConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("target_addr"));
        assert!(text.contains("tick_rate"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = SenderConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SenderConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.channel, 1);
        assert_eq!(parsed.capture.depth_width, 512);
    }

    #[test]
    fn to_service_config_caps_payload() {
        let mut cfg = SenderConfig::default();
        cfg.stream.max_payload = MAX_PAYLOAD_SIZE * 2;
        let svc = cfg.to_service_config();
        assert_eq!(svc.max_payload, MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn partial_clip_fills_the_other_edge() {
        let mut cfg = SenderConfig::default();
        cfg.stream.clip_min_x = Some(100);
        let svc = cfg.to_service_config();
        assert_eq!(svc.clip, Some(ClipWindow::new(100, 512)));
    }
}
