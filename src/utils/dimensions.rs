//! Output size calculation for resize requests.

/// Computes the output size for an image or video frame.
///
/// With aspect lock and a single target dimension, the other one is derived
/// from the original ratio. Missing targets fall back to the original size.
/// Results are rounded and never smaller than 1.
pub fn compute_dimensions(
    original_width: u32,
    original_height: u32,
    target_width: Option<u32>,
    target_height: Option<u32>,
    aspect_locked: bool,
) -> (u32, u32) {
    if target_width.is_none() && target_height.is_none() {
        return (original_width.max(1), original_height.max(1));
    }

    let ratio = if original_height == 0 || original_width == 0 {
        1.0
    } else {
        original_width as f64 / original_height as f64
    };

    let (width, height) = match (target_width, target_height, aspect_locked) {
        (Some(w), None, true) => (w, round_dimension(w as f64 / ratio)),
        (None, Some(h), true) => (round_dimension(h as f64 * ratio), h),
        (w, h, _) => (w.unwrap_or(original_width), h.unwrap_or(original_height)),
    };

    (width.max(1), height.max(1))
}

fn round_dimension(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_targets_keeps_original() {
        assert_eq!(compute_dimensions(1920, 1080, None, None, true), (1920, 1080));
    }

    #[test]
    fn width_only_with_lock_derives_height() {
        assert_eq!(compute_dimensions(1000, 500, Some(400), None, true), (400, 200));
    }

    #[test]
    fn height_only_with_lock_derives_width() {
        assert_eq!(compute_dimensions(1000, 500, None, Some(100), true), (200, 100));
    }

    #[test]
    fn unlocked_uses_given_values() {
        assert_eq!(compute_dimensions(1000, 500, Some(300), None, false), (300, 500));
        assert_eq!(compute_dimensions(1000, 500, Some(300), Some(300), true), (300, 300));
    }

    #[test]
    fn zero_height_uses_unit_ratio() {
        assert_eq!(compute_dimensions(640, 0, Some(50), None, true), (50, 50));
    }

    #[test]
    fn tiny_results_clamp_to_one() {
        assert_eq!(compute_dimensions(10_000, 1, Some(10), None, true), (10, 1));
        assert_eq!(compute_dimensions(1, 10_000, Some(1), None, true), (1, 10_000));
        assert_eq!(compute_dimensions(10_000, 10, Some(1), None, true), (1, 1));
    }

    proptest! {
        #[test]
        fn aspect_lock_preserves_ratio_within_a_pixel(
            w in 1u32..8000,
            h in 1u32..8000,
            target in 1u32..4000,
            by_width in any::<bool>(),
        ) {
            let (out_w, out_h) = if by_width {
                compute_dimensions(w, h, Some(target), None, true)
            } else {
                compute_dimensions(w, h, None, Some(target), true)
            };
            let ratio = w as f64 / h as f64;
            if by_width {
                prop_assert_eq!(out_w, target);
                let expected = (out_w as f64 / ratio).max(1.0);
                prop_assert!((out_h as f64 - expected).abs() <= 1.0);
            } else {
                prop_assert_eq!(out_h, target);
                let expected = (out_h as f64 * ratio).max(1.0);
                prop_assert!((out_w as f64 - expected).abs() <= 1.0);
            }
        }
    }
}
