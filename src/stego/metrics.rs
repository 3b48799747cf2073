// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Global quality metrics and the embed-time quality gate.
//!
//! - PSNR over all RGB samples (infinite for identical images)
//! - SSIM on luma with an 11×11 Gaussian window (σ = 1.5, Wang et al. 2004);
//!   images smaller than the window use a single global window
//! - histogram drift: L1 distance between the 256-bin histograms of all
//!   channel values, divided by the number of values
//!
//! These run on the final stego image only, never during extraction, so
//! they may use the platform `log10`/`exp`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::carrier::CarrierImage;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const L: f64 = 255.0;
const C1: f64 = (K1 * L) * (K1 * L);
const C2: f64 = (K2 * L) * (K2 * L);

const WINDOW_SIZE: usize = 11;
const WINDOW_SIGMA: f64 = 1.5;

/// Minimum quality a stego image must reach to be returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    pub min_psnr: f64,
    pub min_ssim: f64,
    pub max_histogram_drift: f64,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self { min_psnr: 48.0, min_ssim: 0.985, max_histogram_drift: 0.02 }
    }
}

/// Measured quality of a stego image against its cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    pub psnr: f64,
    pub ssim: f64,
    pub histogram_drift: f64,
}

impl QualityReport {
    pub fn measure(cover: &CarrierImage, stego: &CarrierImage) -> Self {
        Self {
            psnr: psnr(cover, stego),
            ssim: ssim(cover, stego),
            histogram_drift: histogram_drift(cover, stego),
        }
    }

    pub fn passes(&self, gate: &QualityGate) -> bool {
        self.psnr >= gate.min_psnr
            && self.ssim >= gate.min_ssim
            && self.histogram_drift <= gate.max_histogram_drift
    }
}

/// Peak signal-to-noise ratio in dB over all channel values.
pub fn psnr(a: &CarrierImage, b: &CarrierImage) -> f64 {
    debug_assert_eq!(a.as_bytes().len(), b.as_bytes().len());
    let sq: u64 = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum();
    if sq == 0 {
        return f64::INFINITY;
    }
    let mse = sq as f64 / a.as_bytes().len() as f64;
    10.0 * (L * L / mse).log10()
}

/// Normalized L1 distance between the channel-value histograms.
pub fn histogram_drift(a: &CarrierImage, b: &CarrierImage) -> f64 {
    let mut ha = [0i64; 256];
    let mut hb = [0i64; 256];
    for &v in a.as_bytes() {
        ha[v as usize] += 1;
    }
    for &v in b.as_bytes() {
        hb[v as usize] += 1;
    }
    let l1: i64 = ha.iter().zip(&hb).map(|(x, y)| (x - y).abs()).sum();
    l1 as f64 / a.as_bytes().len() as f64
}

fn gaussian_window() -> [[f64; WINDOW_SIZE]; WINDOW_SIZE] {
    let mut window = [[0.0f64; WINDOW_SIZE]; WINDOW_SIZE];
    let center = (WINDOW_SIZE / 2) as f64;
    let mut sum = 0.0;
    for (i, row) in window.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            let x = i as f64 - center;
            let y = j as f64 - center;
            let g = (-((x * x + y * y) / (2.0 * WINDOW_SIGMA * WINDOW_SIGMA))).exp();
            *cell = g;
            sum += g;
        }
    }
    for row in &mut window {
        for cell in row.iter_mut() {
            *cell /= sum;
        }
    }
    window
}

/// Mean SSIM of the luma planes.
pub fn ssim(a: &CarrierImage, b: &CarrierImage) -> f64 {
    let (w, h) = (a.width(), a.height());
    let la = a.luma();
    let lb = b.luma();
    if w < WINDOW_SIZE || h < WINDOW_SIZE {
        return ssim_global(&la, &lb);
    }

    let window = gaussian_window();
    let valid_w = w - WINDOW_SIZE + 1;
    let valid_h = h - WINDOW_SIZE + 1;

    let row_sum = |y: usize| -> f64 {
        (0..valid_w).map(|x| window_ssim(&la, &lb, w, x, y, &window)).sum::<f64>()
    };

    #[cfg(feature = "parallel")]
    let total: f64 = (0..valid_h).into_par_iter().map(row_sum).sum();

    #[cfg(not(feature = "parallel"))]
    let total: f64 = (0..valid_h).map(row_sum).sum();

    total / (valid_w * valid_h) as f64
}

fn window_ssim(
    a: &[f64],
    b: &[f64],
    stride: usize,
    x: usize,
    y: usize,
    window: &[[f64; WINDOW_SIZE]; WINDOW_SIZE],
) -> f64 {
    let mut mean_a = 0.0;
    let mut mean_b = 0.0;
    for (i, row) in window.iter().enumerate() {
        let o = (y + i) * stride + x;
        for (j, &wt) in row.iter().enumerate() {
            mean_a += wt * a[o + j];
            mean_b += wt * b[o + j];
        }
    }

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut cov = 0.0;
    for (i, row) in window.iter().enumerate() {
        let o = (y + i) * stride + x;
        for (j, &wt) in row.iter().enumerate() {
            let da = a[o + j] - mean_a;
            let db = b[o + j] - mean_b;
            var_a += wt * da * da;
            var_b += wt * db * db;
            cov += wt * da * db;
        }
    }

    let numerator = (2.0 * mean_a * mean_b + C1) * (2.0 * cov + C2);
    let denominator = (mean_a * mean_a + mean_b * mean_b + C1) * (var_a + var_b + C2);
    numerator / denominator
}

/// One window covering the whole (small) image.
fn ssim_global(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let luminance = (2.0 * mean_a * mean_b + C1) / (mean_a * mean_a + mean_b * mean_b + C1);
    if a.len() < 2 {
        return luminance;
    }

    let n1 = n - 1.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut cov = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        var_a += (x - mean_a) * (x - mean_a);
        var_b += (y - mean_b) * (y - mean_b);
        cov += (x - mean_a) * (y - mean_b);
    }
    var_a /= n1;
    var_b /= n1;
    cov /= n1;

    luminance * (2.0 * cov + C2) / (var_a + var_b + C2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(w: usize, h: usize) -> CarrierImage {
        CarrierImage::from_fn(w, h, |x, y| {
            [((x * 13 + y * 7) % 256) as u8, ((x * y + 40) % 256) as u8, ((x + y) * 5 % 256) as u8]
        })
        .unwrap()
    }

    #[test]
    fn identical_images() {
        let img = textured(32, 24);
        let r = QualityReport::measure(&img, &img);
        assert!(r.psnr.is_infinite());
        assert!((r.ssim - 1.0).abs() < 1e-12);
        assert_eq!(r.histogram_drift, 0.0);
        assert!(r.passes(&QualityGate::default()));
    }

    #[test]
    fn gaussian_window_sums_to_one() {
        let w = gaussian_window();
        let s: f64 = w.iter().flatten().sum();
        assert!((s - 1.0).abs() < 1e-12);
        assert!(w[5][5] > w[0][0]);
    }

    #[test]
    fn psnr_of_single_unit_change() {
        let a = CarrierImage::filled(10, 10, [100, 100, 100]).unwrap();
        let mut b = a.clone();
        b.set_channel(0, 0, 101);
        // MSE = 1/300.
        let expected = 10.0 * (255.0f64 * 255.0 * 300.0).log10();
        assert!((psnr(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn histogram_drift_counts_moves_twice() {
        let a = CarrierImage::filled(2, 2, [128, 128, 128]).unwrap();
        let mut b = a.clone();
        b.set_channel(0, 1, 129);
        // One value leaves bin 128 and enters bin 129: L1 = 2 over 12 values.
        assert!((histogram_drift(&a, &b) - 2.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn small_image_uses_global_window() {
        let a = CarrierImage::from_fn(6, 6, |x, y| [(x * 40) as u8, (y * 40) as u8, 0]).unwrap();
        let s = ssim(&a, &a);
        assert!((s - 1.0).abs() < 1e-12);
        let one = CarrierImage::filled(1, 1, [50, 50, 50]).unwrap();
        assert!((ssim(&one, &one) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn noise_lowers_ssim() {
        let a = CarrierImage::from_fn(40, 40, |x, y| [(x * 4) as u8, (y * 4) as u8, 100]).unwrap();
        let b = CarrierImage::from_fn(40, 40, |x, y| {
            let p = a.pixel_at(x, y);
            let n = if (x * 7 + y * 3) % 2 == 0 { 60 } else { 0 };
            [p[0].wrapping_add(n), p[1], p[2]]
        })
        .unwrap();
        let r = QualityReport::measure(&a, &b);
        assert!(r.ssim < 0.985);
        assert!(!r.passes(&QualityGate::default()));
    }
}
