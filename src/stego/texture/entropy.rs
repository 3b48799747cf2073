// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Local Shannon entropy over a 5×5 luma window.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::det_math::{window_entropy, WINDOW_SAMPLES};
use super::reflect;

/// Side length of the entropy window.
pub const WINDOW: usize = 5;

/// Number of intensity bins in the window histogram.
pub const BINS: usize = 16;

/// Histogram bin of a luma value: 16 equal bins over [0, 256).
#[inline]
fn bin_of(luma: f64) -> u8 {
    let b = (luma / 16.0) as usize;
    b.min(BINS - 1) as u8
}

/// Raw (unnormalized) entropy in bits for every pixel.
pub fn raw_entropy_map(luma: &[f64], width: usize, height: usize) -> Vec<f64> {
    debug_assert_eq!(luma.len(), width * height);
    let bins: Vec<u8> = luma.iter().map(|&l| bin_of(l)).collect();
    let half = (WINDOW / 2) as isize;

    let mut out = vec![0.0f64; width * height];
    let fill_row = |(y, row): (usize, &mut [f64])| {
        for (x, cell) in row.iter_mut().enumerate() {
            let mut counts = [0u8; BINS];
            for dy in -half..=half {
                let sy = reflect(y as isize + dy, height);
                for dx in -half..=half {
                    let sx = reflect(x as isize + dx, width);
                    counts[bins[sy * width + sx] as usize] += 1;
                }
            }
            debug_assert_eq!(counts.iter().map(|&c| c as usize).sum::<usize>(), WINDOW_SAMPLES);
            *cell = window_entropy(&counts);
        }
    };

    #[cfg(feature = "parallel")]
    out.par_chunks_mut(width).enumerate().for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(width).enumerate().for_each(fill_row);

    out
}

/// Entropy map min/max-rescaled to [0, 1]. A constant map becomes all zeros.
pub fn entropy_map(luma: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut map = raw_entropy_map(luma, width, height);
    let min = map.iter().copied().fold(f64::INFINITY, f64::min);
    let max = map.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span > 0.0 {
        for v in map.iter_mut() {
            *v = (*v - min) / span;
        }
    } else {
        map.iter_mut().for_each(|v| *v = 0.0);
    }
    map
}
