//! Frame budget planning.
//!
//! Computes, once per session, the integer downsample factor that
//! shrinks a native-resolution frame until one depth message fits the
//! transport's payload budget.

use crate::error::CastError;
use crate::stream::types::Resolution;

// ── FramePlan ────────────────────────────────────────────────────

/// The downsample factor and reduced dimensions for one streaming
/// session.
///
/// Fixed for the session lifetime: recomputing mid-stream while the
/// receiver's buffers are sized for the old factor is the desync
/// hazard the decoder guards against, so a plan is made exactly once
/// and then only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Stride applied to both axes of the native grid (≥ 1).
    pub factor: u32,
    /// Reduced width, `native.width / factor` (floor).
    pub out_width: u32,
    /// Reduced height, `native.height / factor` (floor).
    pub out_height: u32,
}

impl FramePlan {
    /// Plan a session: pick the smallest factor whose reduced frame
    /// fits `max_samples`.
    ///
    /// `factor = max(1, ceil(sqrt(native_pixels / max_samples)))`, so
    /// `out_width * out_height <= max_samples` always holds.
    pub fn plan(native: Resolution, max_samples: u32) -> Result<Self, CastError> {
        if native.pixel_count() == 0 {
            return Err(CastError::Configuration("native resolution has zero pixels"));
        }
        if max_samples == 0 {
            return Err(CastError::Configuration("payload sample budget is zero"));
        }

        let ratio = native.pixel_count() as f64 / max_samples as f64;
        let factor = (ratio.sqrt().ceil() as u32).max(1);

        Ok(Self {
            factor,
            out_width: native.width / factor,
            out_height: native.height / factor,
        })
    }

    /// Reduced sample count.
    pub fn sample_count(&self) -> usize {
        self.out_width as usize * self.out_height as usize
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_by_four_with_budget_four() {
        let plan = FramePlan::plan(Resolution::new(4, 4), 4).unwrap();
        assert_eq!(plan.factor, 2);
        assert_eq!(plan.out_width, 2);
        assert_eq!(plan.out_height, 2);
    }

    #[test]
    fn factor_is_one_when_frame_already_fits() {
        let plan = FramePlan::plan(Resolution::new(100, 50), 10_000).unwrap();
        assert_eq!(plan.factor, 1);
        assert_eq!(plan.out_width, 100);
        assert_eq!(plan.out_height, 50);
    }

    #[test]
    fn kinect_depth_frame_under_message_budget() {
        // 512×424 native depth, two bytes per sample, 60 kB messages.
        let plan = FramePlan::plan(Resolution::new(512, 424), 29_997).unwrap();
        assert!(plan.factor >= 1);
        assert!(plan.sample_count() <= 29_997);
    }

    #[test]
    fn budget_invariant_over_assorted_inputs() {
        let cases = [
            (1u32, 1u32, 1u32),
            (3, 7, 2),
            (640, 480, 1000),
            (1920, 1080, 60_000),
            (512, 424, 4),
            (10_000, 1, 16),
        ];
        for (w, h, budget) in cases {
            let plan = FramePlan::plan(Resolution::new(w, h), budget).unwrap();
            assert!(plan.factor >= 1);
            assert!(
                plan.sample_count() <= budget as usize,
                "{w}x{h} budget {budget}: {plan:?}"
            );
        }
    }

    #[test]
    fn zero_resolution_rejected() {
        assert!(matches!(
            FramePlan::plan(Resolution::new(0, 480), 100),
            Err(CastError::Configuration(_))
        ));
    }

    #[test]
    fn zero_budget_rejected() {
        assert!(matches!(
            FramePlan::plan(Resolution::new(4, 4), 0),
            Err(CastError::Configuration(_))
        ));
    }
}
