// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Writing and reading bits along the pixel order.
//!
//! For every pixel in order with capacity `k > 0`, channels R, G, B each take
//! the next `k` bits, most significant first, in their low `k` bits. When
//! fewer than `k` bits remain, they fill the high end of the `k`-bit field and
//! the cover's remaining low bits are kept.

use crate::carrier::{CarrierImage, CHANNELS};
use crate::stego::capacity::CapacityMap;
use crate::stego::permute::PixelOrder;

/// Write `bits` (one bit per byte, MSB-first) into `image`. Returns the
/// number of bits written, which is less than `bits.len()` only when the
/// capacity runs out.
pub fn write_bits(
    image: &mut CarrierImage,
    order: &PixelOrder,
    capacity: &CapacityMap,
    bits: &[u8],
) -> usize {
    let mut pos = 0usize;
    'pixels: for idx in order.iter() {
        let cap = capacity.get(idx) as usize;
        if cap == 0 {
            continue;
        }
        for c in 0..CHANNELS {
            if pos >= bits.len() {
                break 'pixels;
            }
            let take = cap.min(bits.len() - pos);
            let mut chunk = 0u8;
            for &bit in &bits[pos..pos + take] {
                chunk = (chunk << 1) | (bit & 1);
            }
            let shift = cap - take;
            let mask = (((1u16 << take) - 1) << shift) as u8;
            let old = image.channel(idx, c);
            image.set_channel(idx, c, (old & !mask) | (chunk << shift));
            pos += take;
        }
    }
    pos
}

/// Read every capacity bit of `image` in order.
pub fn read_bits(image: &CarrierImage, order: &PixelOrder, capacity: &CapacityMap) -> Vec<u8> {
    let mut bits = Vec::with_capacity(capacity.total_bits());
    for idx in order.iter() {
        let cap = capacity.get(idx);
        if cap == 0 {
            continue;
        }
        for c in 0..CHANNELS {
            let v = image.channel(idx, c);
            for bit_pos in (0..cap).rev() {
                bits.push((v >> bit_pos) & 1);
            }
        }
    }
    bits
}
