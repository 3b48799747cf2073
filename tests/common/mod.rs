// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use adaptive_stego::{
    embed_with_options, generate_keypair, CarrierImage, EmbedOptions, EmbedOutcome, KdfParams,
    Protection, RsaPrivateKey, RsaPublicKey, StegoError,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Cheap Argon2id parameters so tests stay fast.
pub const FAST_KDF: KdfParams = KdfParams::Argon2id { m_cost_kib: 64, t_cost: 1, p_cost: 1 };

/// Diagonal color ramp with ±20 deterministic noise per channel.
pub fn noisy_image(w: usize, h: usize, seed: u64) -> CarrierImage {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    CarrierImage::from_fn(w, h, |x, y| {
        let base = [
            (x * 200 / w) as i32 + 20,
            (y * 200 / h) as i32 + 20,
            ((x + y) * 100 / (w + h)) as i32 + 80,
        ];
        let mut px = [0u8; 3];
        for (c, v) in px.iter_mut().enumerate() {
            let n = (rng.next_u32() % 41) as i32 - 20;
            *v = (base[c] + n).clamp(0, 255) as u8;
        }
        px
    })
    .unwrap()
}

pub fn crypto_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Embed with default options and a deterministic crypto RNG.
pub fn embed_seeded(
    cover: &CarrierImage,
    payload: &[u8],
    seed: Option<&str>,
    protection: &Protection,
    rng_seed: u64,
) -> Result<EmbedOutcome, StegoError> {
    let options = EmbedOptions::default();
    embed_with_options(cover, payload, seed, protection, &options, &mut crypto_rng(rng_seed))
}

/// Deterministic 1024-bit key pairs, generated once per test binary.
pub fn keypair(which: usize) -> &'static (RsaPrivateKey, RsaPublicKey) {
    static KEYS: OnceLock<Vec<(RsaPrivateKey, RsaPublicKey)>> = OnceLock::new();
    &KEYS.get_or_init(|| {
        (0..2u64)
            .map(|i| generate_keypair(&mut ChaCha20Rng::seed_from_u64(500 + i), 1024).unwrap())
            .collect()
    })[which]
}
