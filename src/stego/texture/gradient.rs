// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Sobel gradient magnitude.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::det_math::det_hypot;
use super::reflect;

/// Sobel responses `(gx, gy)` at `(x, y)` with reflect padding.
///
/// `gx` differentiates along x and smooths along y with `[1, 2, 1]`;
/// `gy` is the transpose.
#[inline]
fn sobel_at(luma: &[f64], width: usize, height: usize, x: usize, y: usize) -> (f64, f64) {
    let xm = reflect(x as isize - 1, width);
    let xp = reflect(x as isize + 1, width);
    let ym = reflect(y as isize - 1, height);
    let yp = reflect(y as isize + 1, height);
    let p = |xx: usize, yy: usize| luma[yy * width + xx];

    let gx = (p(xp, ym) - p(xm, ym))
        + 2.0 * (p(xp, y) - p(xm, y))
        + (p(xp, yp) - p(xm, yp));
    let gy = (p(xm, yp) - p(xm, ym))
        + 2.0 * (p(x, yp) - p(x, ym))
        + (p(xp, yp) - p(xp, ym));
    (gx, gy)
}

/// Raw Sobel magnitude for every pixel.
pub fn raw_gradient_map(luma: &[f64], width: usize, height: usize) -> Vec<f64> {
    debug_assert_eq!(luma.len(), width * height);
    let mut out = vec![0.0f64; width * height];
    let fill_row = |(y, row): (usize, &mut [f64])| {
        for (x, cell) in row.iter_mut().enumerate() {
            let (gx, gy) = sobel_at(luma, width, height, x, y);
            *cell = det_hypot(gx, gy);
        }
    };

    #[cfg(feature = "parallel")]
    out.par_chunks_mut(width).enumerate().for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(width).enumerate().for_each(fill_row);

    out
}

/// Sobel magnitude divided by its maximum. An all-zero map stays zero.
pub fn gradient_map(luma: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut map = raw_gradient_map(luma, width, height);
    let max = map.iter().copied().fold(0.0f64, f64::max);
    if max > 0.0 {
        for v in map.iter_mut() {
            *v /= max;
        }
    }
    map
}
