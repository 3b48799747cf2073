// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Seed derivation for the structural generators.
//!
//! Every pseudo-random decision that embedding and extraction must agree on
//! (pixel order tie-breaks, drift simulation bits) comes from a ChaCha20
//! generator whose 32-byte seed is a domain-separated SHA-256 of the seed
//! string. Generators are plain values created per call; there is no shared
//! RNG state between invocations.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Seed used in plain mode when the caller does not supply one.
pub const DEFAULT_SEED: &str = "default-seed";

/// Domain label for the pixel-order generator.
const ORDER_DOMAIN: &[u8] = b"adaptive-stego/order/v1";

/// Domain label for the drift-simulation generators.
const DRIFT_DOMAIN: &[u8] = b"adaptive-stego/drift/v1";

/// Domain label for password fingerprints.
const PASSWORD_DOMAIN: &[u8] = b"adaptive-stego/password/v1";

/// Number of hex characters kept from a fingerprint digest.
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// SHA-256 over `domain ∥ 0x00 ∥ seed`.
pub fn derive_seed(domain: &[u8], seed: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update([0u8]);
    hasher.update(seed.as_bytes());
    hasher.finalize().into()
}

/// Generator for the pixel-order tie-break values.
pub fn order_rng(seed: &str) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(derive_seed(ORDER_DOMAIN, seed))
}

/// Seed bytes shared by all drift-simulation generators of one pass.
pub fn drift_seed(seed: &str) -> [u8; 32] {
    derive_seed(DRIFT_DOMAIN, seed)
}

/// Independent drift-simulation generator for one 8×8 block.
///
/// Each block reads its own ChaCha20 stream, so blocks can be simulated in
/// any order (or in parallel) and still draw the same bits.
pub fn block_rng(drift_seed: &[u8; 32], block_index: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::from_seed(*drift_seed);
    rng.set_stream(block_index as u64);
    rng
}

/// Short, stable fingerprint of a password used to derive its default seed.
pub fn password_fingerprint(password: &str) -> String {
    let digest = derive_seed(PASSWORD_DOMAIN, password);
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}
