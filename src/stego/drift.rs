// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Drift controller: per-block statistical guard on the capacity map.
//!
//! The image is tiled into 8×8 blocks (partial blocks at the right and
//! bottom edges included). For every block the controller simulates a
//! worst-case embedding at the block's current capacities and compares the
//! block's luma statistics before and after. Blocks whose statistics move
//! too far shrink by one bit per pixel and are simulated again; after
//! [`MAX_FAILURES`] failed attempts a block is locked at capacity 0.
//!
//! The simulation never looks at the real payload. It works on the analysis
//! plane with seeded random bits, so the extractor reproduces every decision
//! without knowing the message:
//!
//! - reference channel value: `plane | 0b100` (midpoint of the 3 low bits)
//! - simulated channel value: reference with its low `k` bits replaced by
//!   random bits, `k` being the pixel's capacity
//!
//! Each block draws from its own ChaCha20 stream (see [`seed::block_rng`]),
//! so blocks are evaluated independently and in parallel.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rand::RngCore;

use crate::carrier::{luma_of, CarrierImage, CHANNELS};
use crate::stego::capacity::CapacityMap;
use crate::stego::seed;

/// Block side length.
pub const BLOCK_SIZE: usize = 8;

/// Histogram bins for the block luma comparison.
pub const HIST_BINS: usize = 32;

/// Maximum L1 distance between normalized block histograms.
pub const MAX_HIST_DRIFT: f64 = 0.25;

/// Maximum absolute change of block luma variance.
pub const MAX_VARIANCE_DELTA: f64 = 40.0;

/// Maximum Pearson chi-square between the simulated and reference bin counts.
///
/// For a full 64-pixel block this never binds before [`MAX_HIST_DRIFT`]
/// does (at most 8 samples may move, giving at most 64 + 64/9); it rejects
/// concentrated moves in larger sequences.
pub const MAX_CHI_SQUARE: f64 = 120.0;

/// Failed simulations after which a block is locked.
pub const MAX_FAILURES: u8 = 3;

/// Fill for the low bits of the reference block.
const REFERENCE_FILL: u8 = 0b100;

/// Statistics of one simulated block against its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStats {
    pub hist_drift: f64,
    pub variance_delta: f64,
    pub chi_square: f64,
}

impl BlockStats {
    /// Compare two equally sized luma sequences.
    pub fn compare(reference: &[f64], simulated: &[f64]) -> Self {
        debug_assert_eq!(reference.len(), simulated.len());
        let n = reference.len() as f64;

        let hr = histogram(reference);
        let hs = histogram(simulated);
        let hist_drift = hr
            .iter()
            .zip(&hs)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum::<f64>()
            / n;

        let variance_delta = (variance(simulated) - variance(reference)).abs();

        let chi_square = hr
            .iter()
            .zip(&hs)
            .map(|(&r, &s)| {
                let d = s as f64 - r as f64;
                d * d / (r as f64 + 1.0)
            })
            .sum();

        Self { hist_drift, variance_delta, chi_square }
    }

    pub fn is_safe(&self) -> bool {
        self.hist_drift <= MAX_HIST_DRIFT
            && self.variance_delta <= MAX_VARIANCE_DELTA
            && self.chi_square <= MAX_CHI_SQUARE
    }
}

fn histogram(luma: &[f64]) -> [u32; HIST_BINS] {
    let width = 256.0 / HIST_BINS as f64;
    let mut h = [0u32; HIST_BINS];
    for &l in luma {
        let bin = ((l / width) as usize).min(HIST_BINS - 1);
        h[bin] += 1;
    }
    h
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Controller state of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockState {
    /// Failed simulations so far.
    pub failures: u8,
    /// Block carries nothing.
    pub locked: bool,
}

/// Summary of one drift-control pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    /// Blocks that passed on the first simulation.
    pub accepted: usize,
    /// Blocks that passed after shrinking.
    pub shrunk: usize,
    /// Blocks locked at capacity 0 after failing.
    pub locked: usize,
    /// Blocks whose capacity was already 0 everywhere.
    pub empty: usize,
    /// Final state per block, row-major over the block grid.
    pub states: Vec<BlockState>,
}

/// Geometry of the 8×8 block grid over an image.
#[derive(Debug, Clone, Copy)]
pub struct BlockGrid {
    width: usize,
    height: usize,
    pub blocks_wide: usize,
    pub blocks_tall: usize,
}

impl BlockGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            blocks_wide: width.div_ceil(BLOCK_SIZE),
            blocks_tall: height.div_ceil(BLOCK_SIZE),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    /// Flat pixel indices of block `b`, row-major inside the block.
    pub fn pixels(&self, b: usize) -> Vec<usize> {
        let bx = (b % self.blocks_wide) * BLOCK_SIZE;
        let by = (b / self.blocks_wide) * BLOCK_SIZE;
        let x1 = (bx + BLOCK_SIZE).min(self.width);
        let y1 = (by + BLOCK_SIZE).min(self.height);
        let mut out = Vec::with_capacity((x1 - bx) * (y1 - by));
        for y in by..y1 {
            for x in bx..x1 {
                out.push(y * self.width + x);
            }
        }
        out
    }
}

/// Simulate a worst-case embedding of one block and return its statistics.
///
/// `caps[i]` is the capacity of `pixels[i]`. Random bits are drawn only for
/// channels with non-zero capacity, in pixel then channel order.
pub fn simulate_block<R: RngCore>(
    plane: &CarrierImage,
    pixels: &[usize],
    caps: &[u8],
    rng: &mut R,
) -> BlockStats {
    let mut reference = Vec::with_capacity(pixels.len());
    let mut simulated = Vec::with_capacity(pixels.len());
    for (&idx, &cap) in pixels.iter().zip(caps) {
        let mut r = [0u8; CHANNELS];
        let mut s = [0u8; CHANNELS];
        for c in 0..CHANNELS {
            r[c] = plane.channel(idx, c) | REFERENCE_FILL;
            s[c] = if cap == 0 {
                r[c]
            } else {
                let mask = (1u8 << cap) - 1;
                (r[c] & !mask) | (rng.next_u32() as u8 & mask)
            };
        }
        reference.push(luma_of(r[0], r[1], r[2]));
        simulated.push(luma_of(s[0], s[1], s[2]));
    }
    BlockStats::compare(&reference, &simulated)
}

/// Run the shrink-and-retry loop for one block, updating `caps` in place.
pub fn control_block(
    plane: &CarrierImage,
    pixels: &[usize],
    caps: &mut [u8],
    drift_seed: &[u8; 32],
    block_index: usize,
) -> BlockState {
    let mut rng = seed::block_rng(drift_seed, block_index);
    let mut state = BlockState::default();
    loop {
        if caps.iter().all(|&c| c == 0) {
            state.locked = state.failures > 0;
            return state;
        }
        let stats = simulate_block(plane, pixels, caps, &mut rng);
        if stats.is_safe() {
            return state;
        }
        state.failures += 1;
        log::trace!("block {block_index} failed drift check #{}: {:?}", state.failures, stats);
        if state.failures >= MAX_FAILURES {
            caps.fill(0);
            state.locked = true;
            return state;
        }
        for c in caps.iter_mut() {
            *c = c.saturating_sub(1);
        }
    }
}

/// Apply drift control to every block of `capacity`.
///
/// `plane` must be the analysis plane of the image `capacity` was built for.
pub fn control(plane: &CarrierImage, capacity: &mut CapacityMap, seed: &str) -> DriftReport {
    let grid = BlockGrid::new(plane.width(), plane.height());
    let drift_seed = seed::drift_seed(seed);
    let current: &CapacityMap = capacity;

    let run = |b: usize| {
        let pixels = grid.pixels(b);
        let mut caps: Vec<u8> = pixels.iter().map(|&i| current.get(i)).collect();
        let was_empty = caps.iter().all(|&c| c == 0);
        let state = control_block(plane, &pixels, &mut caps, &drift_seed, b);
        (pixels, caps, state, was_empty)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = (0..grid.block_count()).into_par_iter().map(run).collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = (0..grid.block_count()).map(run).collect();

    let mut report = DriftReport {
        states: Vec::with_capacity(results.len()),
        ..Default::default()
    };
    for (pixels, caps, state, was_empty) in results {
        for (&idx, &c) in pixels.iter().zip(&caps) {
            capacity.set(idx, c);
        }
        if was_empty {
            report.empty += 1;
        } else if state.locked {
            report.locked += 1;
        } else if state.failures > 0 {
            report.shrunk += 1;
        } else {
            report.accepted += 1;
        }
        report.states.push(state);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_partial_blocks() {
        let grid = BlockGrid::new(10, 9);
        assert_eq!((grid.blocks_wide, grid.blocks_tall), (2, 2));
        assert_eq!(grid.pixels(0).len(), 64);
        assert_eq!(grid.pixels(1).len(), 2 * 8);
        assert_eq!(grid.pixels(2).len(), 8);
        assert_eq!(grid.pixels(3), vec![8 * 10 + 8, 8 * 10 + 9]);
        let total: usize = (0..grid.block_count()).map(|b| grid.pixels(b).len()).sum();
        assert_eq!(total, 90);
    }

    #[test]
    fn identical_luma_is_safe() {
        let l = vec![10.0, 50.0, 200.0];
        let stats = BlockStats::compare(&l, &l);
        assert_eq!(stats.hist_drift, 0.0);
        assert_eq!(stats.variance_delta, 0.0);
        assert_eq!(stats.chi_square, 0.0);
        assert!(stats.is_safe());
    }

    #[test]
    fn histogram_shift_is_unsafe() {
        // Every sample crosses a bin boundary: L1 distance 2.
        let r = vec![7.0; 16];
        let s = vec![8.0; 16];
        let stats = BlockStats::compare(&r, &s);
        assert_eq!(stats.hist_drift, 2.0);
        assert!(!stats.is_safe());
    }

    #[test]
    fn permuted_values_have_equal_histograms() {
        let stats = BlockStats::compare(&[0.0, 64.0], &[64.0, 0.0]);
        assert_eq!(stats.hist_drift, 0.0);
        assert_eq!(stats.chi_square, 0.0);
        assert!(stats.is_safe());
    }

    #[test]
    fn chi_square_is_on_bin_counts() {
        // Same values per bin, only the level differs: no histogram change.
        let dark: Vec<f64> = (0..64).map(|i| (i % 2) as f64).collect();
        let bright: Vec<f64> = (0..64).map(|i| 200.0 + (i % 2) as f64).collect();
        let flipped = |v: &[f64]| -> Vec<f64> {
            v.iter().map(|&x| if x as u32 % 2 == 0 { x + 1.0 } else { x - 1.0 }).collect()
        };
        assert_eq!(BlockStats::compare(&dark, &flipped(&dark)).chi_square, 0.0);
        assert_eq!(BlockStats::compare(&bright, &flipped(&bright)).chi_square, 0.0);
    }

    #[test]
    fn chi_square_threshold() {
        // 25 of 200 samples move from bin 0 into empty bin 1: histogram
        // drift sits exactly on its limit, chi-square far above its own.
        let r = vec![7.0; 200];
        let mut s = r.clone();
        s[..25].fill(8.0);
        let stats = BlockStats::compare(&r, &s);
        assert_eq!(stats.hist_drift, MAX_HIST_DRIFT);
        assert!(stats.variance_delta < 1.0);
        assert!((stats.chi_square - (625.0 / 201.0 + 625.0)).abs() < 1e-9);
        assert!(!stats.is_safe());
    }

    #[test]
    fn variance_change_alone_is_unsafe() {
        // Bins 1 and 2 keep 32 samples each, but the values spread from
        // 15/16 to 8/23: variance 0.25 -> 56.25.
        let r: Vec<f64> = (0..64).map(|i| if i < 32 { 15.0 } else { 16.0 }).collect();
        let s: Vec<f64> = (0..64).map(|i| if i < 32 { 8.0 } else { 23.0 }).collect();
        let stats = BlockStats::compare(&r, &s);
        assert_eq!(stats.hist_drift, 0.0);
        assert_eq!(stats.chi_square, 0.0);
        assert_eq!(stats.variance_delta, 56.0);
        assert!(stats.variance_delta > MAX_VARIANCE_DELTA);
        assert!(!stats.is_safe());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let at_limit = BlockStats {
            hist_drift: MAX_HIST_DRIFT,
            variance_delta: MAX_VARIANCE_DELTA,
            chi_square: MAX_CHI_SQUARE,
        };
        assert!(at_limit.is_safe());
        assert!(!BlockStats { hist_drift: MAX_HIST_DRIFT + 1e-9, ..at_limit }.is_safe());
        assert!(!BlockStats { variance_delta: MAX_VARIANCE_DELTA + 1e-9, ..at_limit }.is_safe());
        assert!(!BlockStats { chi_square: MAX_CHI_SQUARE + 1e-9, ..at_limit }.is_safe());
    }

    #[test]
    fn mid_gray_block_accepts_full_capacity() {
        // 128 | 0b100 = 132 sits in the middle of bin 16 (128..136); any low
        // bit pattern stays inside it.
        let plane = CarrierImage::filled(8, 8, [128, 128, 128]).unwrap();
        let mut cap = CapacityMap::uniform(8, 8, 3);
        let report = control(&plane, &mut cap, "t1");
        assert_eq!(report.accepted, 1);
        assert_eq!(cap.total_bits(), 64 * 3 * 3);
    }

    #[test]
    fn boundary_block_locks_after_repeated_failure() {
        // Reference luma of [4, 100, 36] lies just below 64, so nearly any
        // simulated bit pushes a pixel into the next histogram bin.
        let plane = CarrierImage::filled(8, 8, [0, 96, 32]).unwrap();
        let mut cap = CapacityMap::uniform(8, 8, 3);
        let report = control(&plane, &mut cap, "x");
        assert_eq!(report.locked, 1);
        assert_eq!(report.states[0], BlockState { failures: MAX_FAILURES, locked: true });
        assert_eq!(cap.total_bits(), 0);
    }

    #[test]
    fn dark_block_passes_at_full_capacity() {
        let plane = CarrierImage::filled(8, 8, [0, 0, 0]).unwrap();
        let grid = BlockGrid::new(8, 8);
        let mut caps = vec![3u8; 64];
        let state = control_block(&plane, &grid.pixels(0), &mut caps, &seed::drift_seed("x"), 0);
        assert_eq!(state, BlockState::default());
        assert!(caps.iter().all(|&c| c == 3));
    }

    #[test]
    fn control_is_deterministic_and_never_raises() {
        let plane = CarrierImage::from_fn(20, 13, |x, y| {
            [((x * 41 + y * 13) % 256) as u8, ((x * y) % 256) as u8, ((x + 3 * y) * 17 % 256) as u8]
        })
        .unwrap()
        .analysis_plane();
        let base = CapacityMap::from_bits(20, 13, (0..260).map(|i| (i % 4) as u8).collect());
        let mut a = base.clone();
        let mut b = base.clone();
        let ra = control(&plane, &mut a, "seed");
        let rb = control(&plane, &mut b, "seed");
        assert_eq!(a, b);
        assert_eq!(ra, rb);
        assert_eq!(ra.states.len(), 3 * 2);
        assert_eq!(ra.accepted + ra.shrunk + ra.locked + ra.empty, 6);
        for i in 0..260 {
            assert!(a.get(i) <= base.get(i));
        }
    }

    #[test]
    fn empty_block_is_not_locked() {
        let plane = CarrierImage::filled(8, 8, [64, 64, 64]).unwrap();
        let mut cap = CapacityMap::uniform(8, 8, 0);
        let report = control(&plane, &mut cap, "s");
        assert_eq!(report.empty, 1);
        assert_eq!(report.states[0], BlockState::default());
    }
}
