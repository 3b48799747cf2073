// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Noise predictor: shrinks capacity where a pixel stands out from its
//! neighbourhood.
//!
//! For each channel the predicted value is the mean of the up-to-8
//! neighbours that exist (no padding; border pixels simply have fewer).
//! The pixel's deviation is the largest absolute channel residual. Large
//! residuals mean an isolated feature that LSB noise would make more
//! conspicuous, so capacity is reduced by band:
//!
//! | deviation     | effect          |
//! |---------------|-----------------|
//! | `< 30`        | unchanged       |
//! | `[30, 60)`    | −1 bit          |
//! | `[60, 120)`   | −2 bits         |
//! | `≥ 120`       | forced to 0     |

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::carrier::{CarrierImage, CHANNELS};
use crate::stego::capacity::CapacityMap;

/// Deviation at which capacity starts to drop.
pub const MODERATE_DEVIATION: f64 = 30.0;
/// Deviation at which capacity drops by two bits.
pub const HIGH_DEVIATION: f64 = 60.0;
/// Deviation at which the pixel is excluded.
pub const EXTREME_DEVIATION: f64 = 120.0;

/// Capacity adjustment for a deviation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Keep,
    Reduce(u8),
    Exclude,
}

impl Adjustment {
    pub fn for_deviation(deviation: f64) -> Self {
        if deviation < MODERATE_DEVIATION {
            Self::Keep
        } else if deviation < HIGH_DEVIATION {
            Self::Reduce(1)
        } else if deviation < EXTREME_DEVIATION {
            Self::Reduce(2)
        } else {
            Self::Exclude
        }
    }

    /// Apply to a base capacity. Never raises it.
    pub fn apply(self, base: u8) -> u8 {
        match self {
            Self::Keep => base,
            Self::Reduce(n) => base.saturating_sub(n),
            Self::Exclude => 0,
        }
    }
}

/// Maximum per-channel |value − neighbour mean| for every pixel.
pub fn deviation_map(image: &CarrierImage) -> Vec<f64> {
    let (w, h) = (image.width(), image.height());
    let data = image.as_bytes();
    let mut out = vec![0.0f64; w * h];

    let fill_row = |(y, row): (usize, &mut [f64])| {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for (x, cell) in row.iter_mut().enumerate() {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let mut sums = [0u32; CHANNELS];
            let mut count = 0u32;
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    if nx == x && ny == y {
                        continue;
                    }
                    let o = (ny * w + nx) * CHANNELS;
                    for c in 0..CHANNELS {
                        sums[c] += data[o + c] as u32;
                    }
                    count += 1;
                }
            }
            if count == 0 {
                *cell = 0.0;
                continue;
            }
            let o = (y * w + x) * CHANNELS;
            let mut dev = 0.0f64;
            for c in 0..CHANNELS {
                let mean = sums[c] as f64 / count as f64;
                dev = dev.max((data[o + c] as f64 - mean).abs());
            }
            *cell = dev;
        }
    };

    #[cfg(feature = "parallel")]
    out.par_chunks_mut(w).enumerate().for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(w).enumerate().for_each(fill_row);

    out
}

/// Adjust `base` by the noise residual of every pixel of `image`.
pub fn predict(image: &CarrierImage, base: &CapacityMap) -> CapacityMap {
    let deviation = deviation_map(image);
    let bits = deviation
        .iter()
        .zip(base.as_slice())
        .map(|(&d, &b)| Adjustment::for_deviation(d).apply(b))
        .collect();
    CapacityMap::from_bits(base.width(), base.height(), bits)
}
