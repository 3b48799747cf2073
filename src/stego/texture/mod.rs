// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Texture analysis: entropy, gradient, surface score and region classes.
//!
//! The analyzer is a pure function of pixel data. The pipeline always feeds
//! it the analysis plane (low bits cleared), so embedding and extraction see
//! exactly the same maps.
//!
//! ```text
//! surface = clip(0.6 · gradient + 0.4 · entropy, 0, 1)
//! ```

pub mod entropy;
pub mod gradient;
pub mod region;

pub use region::RegionClass;

use crate::carrier::CarrierImage;
use crate::stego::capacity::CapacityMap;

/// Weight of the normalized gradient in the surface score.
pub const GRADIENT_WEIGHT: f64 = 0.6;

/// Weight of the normalized entropy in the surface score.
pub const ENTROPY_WEIGHT: f64 = 0.4;

/// Per-pixel texture maps for one image, raster order.
pub struct TextureMaps {
    width: usize,
    height: usize,
    /// Normalized local entropy in [0, 1].
    pub entropy: Vec<f64>,
    /// Normalized Sobel magnitude in [0, 1].
    pub gradient: Vec<f64>,
    /// Combined surface score in [0, 1].
    pub surface: Vec<f64>,
    /// Region class per pixel.
    pub classes: Vec<RegionClass>,
}

impl TextureMaps {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Base capacity map derived from the region classes.
    pub fn base_capacity(&self) -> CapacityMap {
        let bits = self.classes.iter().map(|c| c.base_capacity()).collect();
        CapacityMap::from_bits(self.width, self.height, bits)
    }
}

/// Reflect an out-of-range index back into `0..n` (`d c b a | a b c d | d c b a`).
#[inline]
pub(crate) fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Run the full texture analysis on `image`.
pub fn analyze(image: &CarrierImage) -> TextureMaps {
    let (w, h) = (image.width(), image.height());
    let luma = image.luma();

    let entropy = entropy::entropy_map(&luma, w, h);
    let gradient = gradient::gradient_map(&luma, w, h);

    let surface: Vec<f64> = gradient
        .iter()
        .zip(&entropy)
        .map(|(&g, &e)| (GRADIENT_WEIGHT * g + ENTROPY_WEIGHT * e).clamp(0.0, 1.0))
        .collect();
    let classes = surface.iter().map(|&s| RegionClass::from_surface(s)).collect();

    TextureMaps { width: w, height: h, entropy, gradient, surface, classes }
}
