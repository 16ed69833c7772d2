//! Shared types for the capture/reduce/encode pipeline.
//!
//! These are **internal** frame representations used between pipeline
//! stages. They are distinct from [`crate::wire::WireMessage`], which
//! is the serialisable *wire* type carried over the broadcast channel.

use crate::error::CastError;

/// Bytes per pixel of the native color frame (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

// ── Resolution ───────────────────────────────────────────────────

/// A frame resolution in pixels. Immutable once a sensor session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ── ColorPoint ───────────────────────────────────────────────────

/// Where a depth pixel lands in color space, per the sensor's
/// calibration. Out-of-range coordinates (negative, past the color
/// frame, or NaN for unmappable pixels) mean "no color available" and
/// are a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPoint {
    pub x: f64,
    pub y: f64,
}

impl ColorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A point that can never project into any color frame.
    pub fn invalid() -> Self {
        Self {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        }
    }
}

// ── DepthRange ───────────────────────────────────────────────────

/// Valid depth interval in millimeters. Samples at 0, at or below
/// `near_mm`, or at or above `far_mm` carry no measurement and must
/// render fully transparent — never as a false surface point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRange {
    /// Lower sentinel bound (exclusive valid side).
    pub near_mm: u16,
    /// Upper sentinel bound (exclusive valid side).
    pub far_mm: u16,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self {
            near_mm: 5,
            far_mm: 1000,
        }
    }
}

impl DepthRange {
    /// Whether `depth` is a real measurement inside the range.
    pub fn contains(&self, depth: u16) -> bool {
        depth > self.near_mm && depth < self.far_mm
    }
}

// ── RawCapture ───────────────────────────────────────────────────

/// One native-resolution capture delivered by the sensor collaborator:
/// a depth array, an RGBA color array, and the per-frame depth→color
/// mapping table from the sensor's calibration.
#[derive(Debug, Clone)]
pub struct RawCapture {
    /// Depth frame resolution.
    pub depth_size: Resolution,
    /// Color frame resolution.
    pub color_size: Resolution,
    /// `depth_size.pixel_count()` millimeter samples, row-major.
    pub depth: Vec<u16>,
    /// `color_size.pixel_count() * 4` RGBA bytes, row-major.
    pub color: Vec<u8>,
    /// One entry per depth pixel.
    pub mapping: Vec<ColorPoint>,
}

impl RawCapture {
    /// Check that the three arrays agree with the declared resolutions.
    pub fn validate(&self) -> Result<(), CastError> {
        let depth_pixels = self.depth_size.pixel_count();
        if self.depth.len() != depth_pixels || self.mapping.len() != depth_pixels {
            return Err(CastError::Configuration(
                "depth/mapping arrays do not match the depth resolution",
            ));
        }
        if self.color.len() != self.color_size.pixel_count() * BYTES_PER_PIXEL {
            return Err(CastError::Configuration(
                "color array does not match the color resolution",
            ));
        }
        Ok(())
    }
}

// ── CaptureSource ────────────────────────────────────────────────

/// The sensor acquisition collaborator consumed by the sender pipeline.
///
/// `capture_tick` is a synchronous per-tick read: `Ok(None)` means no
/// new frame was ready this tick and the pipeline must skip it — never
/// fabricate data.
pub trait CaptureSource {
    /// Native depth resolution, fixed for the session.
    fn depth_resolution(&self) -> Resolution;

    /// Native color resolution, fixed for the session.
    fn color_resolution(&self) -> Resolution;

    /// Acquire the latest frame, if one is ready.
    fn capture_tick(&mut self) -> Result<Option<RawCapture>, CastError>;
}

// ── Tests ────────────────────────────────────────────────────────
