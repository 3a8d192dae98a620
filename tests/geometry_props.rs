// Property tests for output size clamping.
use image_compressor::compressor::{clamp, CompressorConfig};
use proptest::prelude::*;

/// Sources with an aspect ratio up to 64:1 and a cap of at least 64 never clamp to zero.
fn source_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..30_000, 1u32..30_000).prop_filter("aspect ratio above 64", |(w, h)| {
        let (big, small) = if w >= h { (*w, *h) } else { (*h, *w) };
        big <= small.saturating_mul(64)
    })
}

fn limits() -> impl Strategy<Value = (u64, u32)> {
    (4_096u64..50_000_000, 64u32..8_192)
}

proptest! {
    #[test]
    fn output_respects_both_limits((w, h) in source_dims(), (budget, cap) in limits()) {
        let size = clamp(w, h, budget, cap);
        prop_assert!((size.width as u64) * (size.height as u64) <= budget.max(w as u64 * h as u64));
        prop_assert!((size.width as u64) * (size.height as u64) <= budget || !size.pixel_budget_applied);
        prop_assert!(size.width <= cap && size.height <= cap);
        prop_assert!(size.width >= 1 && size.height >= 1);
    }

    #[test]
    fn sources_within_limits_are_untouched(w in 1u32..4_096, h in 1u32..4_096) {
        let config = CompressorConfig::default();
        let size = clamp(w, h, config.max_total_pixels, config.max_dimension);
        prop_assert_eq!((size.width, size.height), (w, h));
        prop_assert!(!size.resized);
    }

    #[test]
    fn aspect_ratio_is_preserved((w, h) in source_dims(), (budget, cap) in limits()) {
        let size = clamp(w, h, budget, cap);
        let drift = if w >= h {
            (size.height as f64 - h as f64 * size.width as f64 / w as f64).abs()
        } else {
            (size.width as f64 - w as f64 * size.height as f64 / h as f64).abs()
        };
        prop_assert!(drift <= 2.0, "drift {} for {}x{} -> {}x{}", drift, w, h, size.width, size.height);
    }

    #[test]
    fn resized_flag_matches_rules((w, h) in source_dims(), (budget, cap) in limits()) {
        let size = clamp(w, h, budget, cap);
        prop_assert_eq!(size.pixel_budget_applied, (w as u64) * (h as u64) > budget);
        prop_assert_eq!(size.resized, size.pixel_budget_applied || size.dimension_cap_applied);
        if !size.resized {
            prop_assert_eq!((size.width, size.height), (w, h));
        }
    }
}

#[test]
fn documented_examples() {
    let size = clamp(8192, 4096, 16_777_216, 4096);
    assert_eq!((size.width, size.height), (4096, 2048));

    let size = clamp(6000, 4000, 16_777_216, 4096);
    assert_eq!((size.width, size.height), (4096, 2731));
}
