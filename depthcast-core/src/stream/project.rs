//! Depth-space → color-space pixel projection.
//!
//! The sensor calibration hands the pipeline a per-frame mapping table
//! with one floating-point color coordinate per depth pixel. This
//! module resolves a depth pixel index to a color pixel index, or to
//! `None` when the calibration points outside the color frame.

use crate::stream::types::{ColorPoint, Resolution};

/// Resolve the color pixel a depth pixel projects onto.
///
/// Coordinates round with `floor(v + 0.5)` — round-half-up, the
/// sensor convention. Do not substitute `f64::round` semantics for
/// negative halves or banker's rounding.
///
/// Returns `None` when `depth_index` is past the mapping table or the
/// rounded point falls outside `[0, width) × [0, height)`; NaN
/// coordinates fail the range comparison and land here too.
pub fn project(depth_index: usize, mapping: &[ColorPoint], color: Resolution) -> Option<usize> {
    let point = mapping.get(depth_index)?;

    let x = (point.x + 0.5).floor();
    let y = (point.y + 0.5).floor();

    if x < 0.0 || y < 0.0 || x >= color.width as f64 || y >= color.height as f64 {
        return None;
    }

    Some(y as usize * color.width as usize + x as usize)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table(points: &[(f64, f64)]) -> Vec<ColorPoint> {
        points.iter().map(|&(x, y)| ColorPoint::new(x, y)).collect()
    }

    #[test]
    fn half_rounds_up_and_out_of_bounds() {
        // (2.5, 3.5) rounds to (3, 4); y=4 is outside a 4×4 frame.
        let mapping = table(&[(2.5, 3.5)]);
        assert_eq!(project(0, &mapping, Resolution::new(4, 4)), None);
    }

    #[test]
    fn below_half_rounds_down() {
        let mapping = table(&[(2.4, 3.4)]);
        assert_eq!(
            project(0, &mapping, Resolution::new(4, 4)),
            Some(3 * 4 + 2)
        );
    }

    #[test]
    fn negative_coordinates_are_no_color() {
        let mapping = table(&[(-1.0, 2.0), (2.0, -0.6)]);
        let color = Resolution::new(8, 8);
        assert_eq!(project(0, &mapping, color), None);
        assert_eq!(project(1, &mapping, color), None);
    }

    #[test]
    fn negative_but_rounding_to_zero_is_in_bounds() {
        // -0.4 + 0.5 = 0.1 → floor 0 → pixel column 0.
        let mapping = table(&[(-0.4, 0.0)]);
        assert_eq!(project(0, &mapping, Resolution::new(8, 8)), Some(0));
    }

    #[test]
    fn nan_is_no_color() {
        let mapping = table(&[(f64::NAN, 1.0)]);
        assert_eq!(project(0, &mapping, Resolution::new(8, 8)), None);
    }

    #[test]
    fn index_past_mapping_is_no_color() {
        let mapping = table(&[(1.0, 1.0)]);
        assert_eq!(project(5, &mapping, Resolution::new(8, 8)), None);
    }
}
