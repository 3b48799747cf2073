// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RSA key handling for public-key packages.
//!
//! Session keys are wrapped with RSA-OAEP (SHA-256). Keys travel as PEM:
//! PKCS#8 for private keys, SubjectPublicKeyInfo for public keys. The key
//! fingerprint (first 32 hex characters of SHA-256 over the SPKI DER) is the
//! default seed for public-key mode, so sender and recipient agree on the
//! pixel order without sharing anything but the key pair.

use rand::{CryptoRng, RngCore};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::stego::error::StegoError;
use crate::stego::seed::FINGERPRINT_HEX_LEN;

/// Default modulus size for [`generate_keypair`].
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted for generation.
pub const MIN_KEY_BITS: usize = 1024;

/// Generate a fresh RSA key pair.
pub fn generate_keypair<R: RngCore + CryptoRng>(
    rng: &mut R,
    bits: usize,
) -> Result<(RsaPrivateKey, RsaPublicKey), StegoError> {
    if bits < MIN_KEY_BITS {
        return Err(StegoError::InvalidKey(format!("{bits}-bit modulus is too small")));
    }
    let private = RsaPrivateKey::new(rng, bits).map_err(|e| StegoError::InvalidKey(e.to_string()))?;
    let public = private.to_public_key();
    Ok((private, public))
}

pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, StegoError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| StegoError::InvalidKey(e.to_string()))
}

pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, StegoError> {
    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| StegoError::InvalidKey(e.to_string()))
}

pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, StegoError> {
    key.to_public_key_pem(LineEnding::LF).map_err(|e| StegoError::InvalidKey(e.to_string()))
}

pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<Zeroizing<String>, StegoError> {
    key.to_pkcs8_pem(LineEnding::LF).map_err(|e| StegoError::InvalidKey(e.to_string()))
}

/// First 32 hex characters of SHA-256 over the SubjectPublicKeyInfo DER.
pub fn fingerprint(key: &RsaPublicKey) -> Result<String, StegoError> {
    let der = key.to_public_key_der().map_err(|e| StegoError::InvalidKey(e.to_string()))?;
    let mut hex = hex::encode(Sha256::digest(der.as_bytes()));
    hex.truncate(FINGERPRINT_HEX_LEN);
    Ok(hex)
}

/// Encrypt a session key to `key` with RSA-OAEP-SHA256.
pub fn wrap_session_key<R: RngCore + CryptoRng>(
    key: &RsaPublicKey,
    session_key: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, StegoError> {
    key.encrypt(rng, Oaep::new::<Sha256>(), session_key)
        .map_err(|e| StegoError::InvalidKey(e.to_string()))
}

/// Recover a session key. Any OAEP failure is an authentication failure.
pub fn unwrap_session_key(
    key: &RsaPrivateKey,
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, StegoError> {
    key.decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| StegoError::AuthenticationFailure)
}
