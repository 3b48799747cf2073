// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-pixel capacity maps and the capacity planning pass.
//!
//! A [`CapacityMap`] holds, for every pixel, how many low-order bits (0..=3)
//! may be rewritten in each of its three channels. Planning runs the texture
//! analyzer, the noise predictor, the pixel sequencer and the drift controller
//! on the analysis plane, in that order:
//!
//! ```text
//! analysis plane ─► texture ─► base capacity ─► noise ─► drift ─► final map
//!                      └──────► entropy ─► pixel order
//! ```
//!
//! Because every input is the analysis plane, planning a cover and planning
//! its stego image give the same map and the same order.

use crate::carrier::{CarrierImage, CHANNELS, MAX_BITS_PER_CHANNEL};
use crate::stego::drift::{self, DriftReport};
use crate::stego::noise;
use crate::stego::permute::{self, PixelOrder};
use crate::stego::progress::{Phase, Progress};
use crate::stego::texture::{self, TextureMaps};

/// Bits per channel for every pixel, raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityMap {
    width: usize,
    height: usize,
    bits: Vec<u8>,
}

impl CapacityMap {
    /// Wrap a per-pixel bit-count vector.
    pub fn from_bits(width: usize, height: usize, bits: Vec<u8>) -> Self {
        debug_assert_eq!(bits.len(), width * height);
        debug_assert!(bits.iter().all(|&b| b <= MAX_BITS_PER_CHANNEL));
        Self { width, height, bits }
    }

    /// A map with every pixel at `bits`.
    pub fn uniform(width: usize, height: usize, bits: u8) -> Self {
        Self::from_bits(width, height, vec![bits.min(MAX_BITS_PER_CHANNEL); width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u8 {
        self.bits[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, bits: u8) {
        self.bits[idx] = bits.min(MAX_BITS_PER_CHANNEL);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Total embeddable bits: Σ capacity × 3 channels.
    pub fn total_bits(&self) -> usize {
        self.bits.iter().map(|&b| b as usize).sum::<usize>() * CHANNELS
    }

    /// Number of pixels at each capacity level 0..=3.
    pub fn histogram(&self) -> [usize; 4] {
        let mut h = [0usize; 4];
        for &b in &self.bits {
            h[b as usize] += 1;
        }
        h
    }
}

/// Everything the embedder and extractor need to walk the bit stream.
pub struct CapacityPlan {
    pub texture: TextureMaps,
    /// Final per-pixel capacity after noise and drift control.
    pub capacity: CapacityMap,
    /// Pixel visit order.
    pub order: PixelOrder,
    pub drift: DriftReport,
}

impl CapacityPlan {
    pub fn total_bits(&self) -> usize {
        self.capacity.total_bits()
    }
}

/// Run the full planning pass for `image` under `seed`.
///
/// `image` may be a cover or a stego image; only its analysis plane is read.
pub fn plan(image: &CarrierImage, seed: &str, progress: Option<&Progress>) -> CapacityPlan {
    let plane = image.analysis_plane();

    enter(progress, Phase::Analyze);
    let texture = texture::analyze(&plane);
    let base = texture.base_capacity();

    enter(progress, Phase::Predict);
    let mut capacity = noise::predict(&plane, &base);

    enter(progress, Phase::Order);
    let order = permute::pixel_order(&texture.entropy, seed);

    enter(progress, Phase::Drift);
    let drift = drift::control(&plane, &mut capacity, seed);

    log::debug!(
        "capacity plan {}x{}: base={} final={} bits, levels={:?}, {:?}",
        image.width(),
        image.height(),
        base.total_bits(),
        capacity.total_bits(),
        capacity.histogram(),
        drift,
    );

    CapacityPlan { texture, capacity, order, drift }
}

fn enter(progress: Option<&Progress>, phase: Phase) {
    if let Some(p) = progress {
        p.enter(phase);
    }
}
