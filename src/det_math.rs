// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic math helpers for cross-platform reproducibility.
//!
//! Everything that feeds capacity or ordering decisions must produce the
//! same bits on every platform, otherwise a stego image written on one
//! machine cannot be read on another. `f64::log2` is delegated to the
//! platform libm and is not guaranteed to be correctly rounded, so the
//! entropy computation uses a pinned table instead. Only IEEE 754 basic
//! operations (add, sub, mul, div, sqrt) are used here.

/// Number of samples in a 5×5 entropy window.
pub const WINDOW_SAMPLES: usize = 25;

// ──────────────────────────────────────────────────────────────────────────
// log2(k) for k = 0..=25, pinned as IEEE 754 bit patterns.
// log2(0) is stored as 0.0 so that 0·log2(0) contributes nothing.
// ──────────────────────────────────────────────────────────────────────────

const LOG2_TABLE: [f64; WINDOW_SAMPLES + 1] = [
    0.0,                                 // (0)
    0.0,                                 // log2(1)
    f64::from_bits(0x3FF0000000000000), // log2(2)  = 1.0
    f64::from_bits(0x3FF95C01A39FBD68), // log2(3)  = 1.584962500721156
    f64::from_bits(0x4000000000000000), // log2(4)  = 2.0
    f64::from_bits(0x4002934F0979A371), // log2(5)  = 2.321928094887362
    f64::from_bits(0x4004AE00D1CFDEB4), // log2(6)  = 2.584962500721156
    f64::from_bits(0x400675767F54042D), // log2(7)  = 2.807354922057604
    f64::from_bits(0x4008000000000000), // log2(8)  = 3.0
    f64::from_bits(0x40095C01A39FBD68), // log2(9)  = 3.169925001442312
    f64::from_bits(0x400A934F0979A371), // log2(10) = 3.321928094887362
    f64::from_bits(0x400BACEA7C065D42), // log2(11) = 3.4594316186372973
    f64::from_bits(0x400CAE00D1CFDEB4), // log2(12) = 3.584962500721156
    f64::from_bits(0x400D9A802391E233), // log2(13) = 3.700439718141092
    f64::from_bits(0x400E75767F54042D), // log2(14) = 3.807354922057604
    f64::from_bits(0x400F414FDB498226), // log2(15) = 3.9068905956085187
    f64::from_bits(0x4010000000000000), // log2(16) = 4.0
    f64::from_bits(0x4010598FDBEB244C), // log2(17) = 4.087462841250339
    f64::from_bits(0x4010AE00D1CFDEB4), // log2(18) = 4.169925001442312
    f64::from_bits(0x4010FDE0B5C81340), // log2(19) = 4.247927513443585
    f64::from_bits(0x401149A784BCD1B9), // log2(20) = 4.321928094887363
    f64::from_bits(0x401191BBA891F171), // log2(21) = 4.392317422778761
    f64::from_bits(0x4011D6753E032EA1), // log2(22) = 4.459431618637297
    f64::from_bits(0x40121820A01AC755), // log2(23) = 4.523561956057013
    f64::from_bits(0x4012570068E7EF5A), // log2(24) = 4.584962500721156
    f64::from_bits(0x4012934F0979A371), // log2(25) = 4.643856189774724
];

/// Pinned base-2 logarithm for small integer counts (0..=25).
///
/// # Panics
/// Panics if `k > 25`. Callers only pass histogram counts of a 5×5 window.
#[inline]
pub fn det_log2_count(k: usize) -> f64 {
    LOG2_TABLE[k]
}

/// Shannon entropy (bits) of a histogram over exactly [`WINDOW_SAMPLES`] samples.
///
/// Uses the identity `H = log2(N) - (1/N) · Σ kᵢ·log2(kᵢ)`, so the only
/// logarithms needed are the pinned integer ones. Bins are summed in index
/// order, which keeps the floating-point accumulation order fixed.
pub fn window_entropy(counts: &[u8]) -> f64 {
    if counts.iter().any(|&k| k as usize == WINDOW_SAMPLES) {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for &k in counts {
        if k > 1 {
            acc += k as f64 * det_log2_count(k as usize);
        }
    }
    let h = det_log2_count(WINDOW_SAMPLES) - acc / WINDOW_SAMPLES as f64;
    if h < 0.0 { 0.0 } else { h }
}

/// Deterministic hypotenuse: `sqrt(x² + y²)`.
///
/// `f64::hypot` calls libm; `sqrt` is correctly rounded by IEEE 754.
/// The operands here are bounded Sobel responses, so overflow is impossible.
#[inline]
pub fn det_hypot(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log2_table_matches_powers_of_two() {
        assert_eq!(det_log2_count(1), 0.0);
        assert_eq!(det_log2_count(2), 1.0);
        assert_eq!(det_log2_count(4), 2.0);
        assert_eq!(det_log2_count(8), 3.0);
        assert_eq!(det_log2_count(16), 4.0);
    }

    #[test]
    fn log2_table_close_to_libm() {
        for k in 1..=WINDOW_SAMPLES {
            let diff = (det_log2_count(k) - (k as f64).log2()).abs();
            assert!(diff < 1e-15, "log2({k}) off by {diff}");
        }
    }

    #[test]
    fn single_bin_entropy_is_zero() {
        let mut counts = [0u8; 16];
        counts[3] = 25;
        assert_eq!(window_entropy(&counts), 0.0);
    }

    #[test]
    fn spread_entropy_is_positive_and_bounded() {
        // 25 samples spread as evenly as possible over 16 bins.
        let mut counts = [1u8; 16];
        for c in counts.iter_mut().take(9) {
            *c = 2;
        }
        assert_eq!(counts.iter().map(|&c| c as usize).sum::<usize>(), 25);
        let h = window_entropy(&counts);
        assert!(h > 3.8 && h <= 4.0, "entropy {h}");
    }

    #[test]
    fn two_equal_halves() {
        // 12 + 13 split is just under one bit.
        let mut counts = [0u8; 16];
        counts[0] = 12;
        counts[1] = 13;
        let h = window_entropy(&counts);
        assert!((h - 0.9988).abs() < 1e-3, "entropy {h}");
    }

    #[test]
    fn hypot_matches_pythagoras() {
        assert_eq!(det_hypot(3.0, 4.0), 5.0);
        assert_eq!(det_hypot(0.0, 0.0), 0.0);
    }
}
