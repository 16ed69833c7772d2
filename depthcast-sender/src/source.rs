//! Synthetic capture source.
//!
//! Stands in for real sensor hardware: generates a moving depth wave
//! with a sliding color gradient so the receive side has recognisable,
//! animated data to verify against. The depth→color mapping is the
//! linear rescale between the two frame geometries.

use depthcast_core::stream::{CaptureSource, ColorPoint, RawCapture, Resolution};
use depthcast_core::CastError;

/// Generates one synthetic frame per tick, forever.
pub struct SyntheticSource {
    depth_size: Resolution,
    color_size: Resolution,
    tick: u64,
    /// Depth→color mapping, fixed for the synthetic geometry.
    mapping: Vec<ColorPoint>,
}

impl SyntheticSource {
    pub fn new(depth_size: Resolution, color_size: Resolution) -> Self {
        let scale_x = color_size.width as f64 / depth_size.width as f64;
        let scale_y = color_size.height as f64 / depth_size.height as f64;
        let mapping = (0..depth_size.pixel_count())
            .map(|i| {
                let x = (i % depth_size.width as usize) as f64;
                let y = (i / depth_size.width as usize) as f64;
                ColorPoint::new(x * scale_x, y * scale_y)
            })
            .collect();

        Self {
            depth_size,
            color_size,
            tick: 0,
            mapping,
        }
    }
}

impl CaptureSource for SyntheticSource {
    fn depth_resolution(&self) -> Resolution {
        self.depth_size
    }

    fn color_resolution(&self) -> Resolution {
        self.color_size
    }

    fn capture_tick(&mut self) -> Result<Option<RawCapture>, CastError> {
        let phase = self.tick as f64 * 0.1;
        self.tick += 1;

        let w = self.depth_size.width as usize;
        let depth: Vec<u16> = (0..self.depth_size.pixel_count())
            .map(|i| {
                let x = (i % w) as f64;
                let y = (i / w) as f64;
                // A band of sentinel pixels keeps the invalid-depth
                // path exercised on the receive side.
                if x < 8.0 {
                    return 0;
                }
                let wave = ((x * 0.05 + phase).sin() + (y * 0.05).cos()) * 0.25 + 0.5;
                200 + (wave * 600.0) as u16
            })
            .collect();

        let cw = self.color_size.width as usize;
        let color: Vec<u8> = (0..self.color_size.pixel_count())
            .flat_map(|i| {
                let x = (i % cw) as u64;
                let y = (i / cw) as u64;
                [
                    ((x + self.tick) % 256) as u8,
                    (y % 256) as u8,
                    ((x + y) % 256) as u8,
                    255,
                ]
            })
            .collect();

        Ok(Some(RawCapture {
            depth_size: self.depth_size,
            color_size: self.color_size,
            depth,
            color,
            mapping: self.mapping.clone(),
        }))
    }
}

// ── Tests ────────────────────────────────────────────────────────
