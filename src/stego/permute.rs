// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel sequencer: the order in which pixels receive payload bits.
//!
//! Pixels are sorted by descending quantized entropy, so the busiest regions
//! are filled first. Ties within a level are broken by a ChaCha20 draw made
//! for every pixel in raster order, which scatters the payload across each
//! level in a seed-dependent way. The raster index is the final key, which
//! makes the order a strict total order and independent of sort stability.
//!
//! # Cross-platform portability
//!
//! Tie-break values are drawn as `u32` with `next_u32`, never as `usize`.
//! `usize` is 32-bit on WASM but 64-bit on native, and drawing it would
//! consume a different amount of the ChaCha20 stream per pixel.

use std::cmp::Reverse;

use rand::RngCore;

use crate::stego::seed;

/// Number of levels the normalized entropy is quantized into.
pub const ENTROPY_LEVELS: u32 = 32;

/// Quantize a normalized entropy value in [0, 1] to `0..ENTROPY_LEVELS`.
#[inline]
pub fn entropy_level(entropy: f64) -> u32 {
    let level = (entropy * ENTROPY_LEVELS as f64) as u32;
    level.min(ENTROPY_LEVELS - 1)
}

/// A permutation of the flat pixel indices `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelOrder {
    indices: Vec<usize>,
}

impl PixelOrder {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// Build the visit order for a normalized entropy map under `seed`.
pub fn pixel_order(entropy: &[f64], seed: &str) -> PixelOrder {
    let mut rng = seed::order_rng(seed);
    let mut keys: Vec<(Reverse<u32>, u32, usize)> = entropy
        .iter()
        .enumerate()
        .map(|(idx, &e)| (Reverse(entropy_level(e)), rng.next_u32(), idx))
        .collect();
    keys.sort_unstable();

    log::trace!("pixel order: {} pixels", keys.len());
    PixelOrder { indices: keys.into_iter().map(|(_, _, idx)| idx).collect() }
}
