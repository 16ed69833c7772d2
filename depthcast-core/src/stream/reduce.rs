//! Native frame → budget-sized reduced frame.
//!
//! Applies the session's [`FramePlan`] stride to the native depth
//! grid, carrying each kept depth sample and its projected color pixel
//! into packed row-major output arrays. Position is implied by
//! sequence order — no coordinates are ever transmitted — so the
//! ordering produced here is the ordering the encoder and decoder both
//! assume.

use crate::error::CastError;
use crate::stream::plan::FramePlan;
use crate::stream::project::project;
use crate::stream::types::{RawCapture, Resolution, BYTES_PER_PIXEL};

// ── ClipWindow ───────────────────────────────────────────────────

/// Half-open column interval `[min_x, max_x)` of the native depth
/// frame to stream. Clipping narrows the frame without changing its
/// row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub min_x: u32,
    pub max_x: u32,
}

impl ClipWindow {
    pub fn new(min_x: u32, max_x: u32) -> Self {
        Self { min_x, max_x }
    }

    /// The whole width of `native`.
    pub fn full(native: Resolution) -> Self {
        Self {
            min_x: 0,
            max_x: native.width,
        }
    }
}

// ── ReducedFrame ─────────────────────────────────────────────────

/// A downsampled frame sized to fit one transport payload: depth
/// samples plus the RGBA color each one projects onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedFrame {
    /// Reduced width in pixels.
    pub width: u32,
    /// Reduced height in pixels.
    pub height: u32,
    /// `width * height` depth samples, row-major over the reduced grid.
    pub depth: Vec<u16>,
    /// `width * height * 4` RGBA bytes in the same order.
    pub color: Vec<u8>,
}

impl ReducedFrame {
    fn new(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            depth: vec![0; pixels],
            color: vec![0; pixels * BYTES_PER_PIXEL],
        }
    }

    /// Reduced pixel count.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}

// ── FrameReducer ─────────────────────────────────────────────────

/// Per-session reducer applying a fixed plan and clip window.
///
/// Owns its output buffers and reuses them every tick; a pixel whose
/// projection falls outside the color frame keeps the color it had on
/// the previous tick (initially transparent black), which is the
/// defined "no color available" behavior.
pub struct FrameReducer {
    plan: FramePlan,
    clip: ClipWindow,
    depth_size: Resolution,
    color_size: Resolution,
    out_width: u32,
    reduced: ReducedFrame,
}

impl FrameReducer {
    /// Build a reducer for one session.
    ///
    /// Fails with [`CastError::Configuration`] when the clip window is
    /// inverted, exceeds the native width, or is narrower than one
    /// stride — a window that yields zero output columns must be
    /// rejected here, never silently streamed as an empty frame.
    pub fn new(
        plan: FramePlan,
        depth_size: Resolution,
        color_size: Resolution,
        clip: ClipWindow,
    ) -> Result<Self, CastError> {
        if clip.min_x >= clip.max_x || clip.max_x > depth_size.width {
            return Err(CastError::Configuration("clip window out of range"));
        }

        let out_width = (clip.max_x - clip.min_x) / plan.factor;
        if out_width == 0 {
            return Err(CastError::Configuration(
                "clip window narrower than the downsample stride",
            ));
        }
        if plan.out_height == 0 {
            return Err(CastError::Configuration(
                "native height shorter than the downsample stride",
            ));
        }

        Ok(Self {
            plan,
            clip,
            depth_size,
            color_size,
            out_width,
            reduced: ReducedFrame::new(out_width, plan.out_height),
        })
    }

    /// Reduced output resolution.
    pub fn output_resolution(&self) -> Resolution {
        Resolution::new(self.out_width, self.plan.out_height)
    }

    /// Downsample one capture into the persistent reduced frame.
    ///
    /// Iterates exactly `out_height × out_width` grid points so the
    /// output length always equals the receiver's allocation,
    /// regardless of how the native extent divides by the stride.
    pub fn reduce(&mut self, capture: &RawCapture) -> Result<&ReducedFrame, CastError> {
        if capture.depth_size != self.depth_size || capture.color_size != self.color_size {
            return Err(CastError::Configuration(
                "capture resolution differs from the session resolution",
            ));
        }
        capture.validate()?;

        let factor = self.plan.factor as usize;
        let native_w = self.depth_size.width as usize;
        let min_x = self.clip.min_x as usize;

        let mut out = 0usize;
        for row in 0..self.plan.out_height as usize {
            let y = row * factor;
            for col in 0..self.out_width as usize {
                let x = min_x + col * factor;
                let depth_index = y * native_w + x;

                self.reduced.depth[out] = capture.depth[depth_index];

                if let Some(color_index) =
                    project(depth_index, &capture.mapping, self.color_size)
                {
                    let src = color_index * BYTES_PER_PIXEL;
                    let dst = out * BYTES_PER_PIXEL;
                    self.reduced.color[dst..dst + 3]
                        .copy_from_slice(&capture.color[src..src + 3]);
                    // Alpha is forced, never sampled: consumers derive
                    // opacity from depth validity alone.
                    self.reduced.color[dst + 3] = 1;
                }

                out += 1;
            }
        }

        Ok(&self.reduced)
    }

    /// The most recent reduced frame.
    pub fn latest(&self) -> &ReducedFrame {
        &self.reduced
    }
}

// ── Tests ────────────────────────────────────────────────────────
