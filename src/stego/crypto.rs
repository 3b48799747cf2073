// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Password-based key derivation and authenticated encryption.
//!
//! A password is stretched with the KDF described in the package (Argon2id
//! or PBKDF2-HMAC-SHA256) into 64 bytes: a 32-byte cipher key followed by a
//! 32-byte MAC key. The MAC key is only used by the CTR+HMAC mode.
//!
//! Three cipher modes are supported, all with detached nonce and tag so the
//! package can lay the fields out explicitly:
//!
//! | id | mode                      | nonce | tag |
//! |----|---------------------------|-------|-----|
//! | 1  | AES-256-GCM               | 12    | 16  |
//! | 2  | AES-256-CTR + HMAC-SHA256 | 16    | 32  |
//! | 3  | AES-256-GCM-SIV           | 12    | 16  |
//!
//! For CTR+HMAC the tag is `HMAC(mac_key, u64 len(aad) ∥ aad ∥ iv ∥ ciphertext)`
//! and is verified before any decryption happens.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use aes_gcm_siv::Aes256GcmSiv;
use argon2::{Algorithm, Argon2, Params, Version};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::stego::error::StegoError;

type HmacSha256 = Hmac<Sha256>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// KDF salt length in bytes.
pub const SALT_LEN: usize = 16;
/// Derived key material: cipher key ∥ MAC key.
pub const DERIVED_KEY_LEN: usize = 64;
/// Cipher key length in bytes.
pub const CIPHER_KEY_LEN: usize = 32;

/// Upper bound on Argon2 memory accepted from a package (256 MiB).
pub const MAX_ARGON2_M_COST_KIB: u32 = 256 * 1024;
/// Upper bound on Argon2 passes accepted from a package.
pub const MAX_ARGON2_T_COST: u32 = 64;
/// Upper bound on Argon2 lanes accepted from a package.
pub const MAX_ARGON2_P_COST: u32 = 16;
/// Upper bound on PBKDF2 rounds accepted from a package.
pub const MAX_PBKDF2_ROUNDS: u32 = 10_000_000;

/// Authenticated cipher used for password-protected packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMode {
    #[default]
    AesGcm,
    AesCtrHmac,
    AesGcmSiv,
}

impl CipherMode {
    pub fn id(self) -> u8 {
        match self {
            Self::AesGcm => 1,
            Self::AesCtrHmac => 2,
            Self::AesGcmSiv => 3,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, StegoError> {
        match id {
            1 => Ok(Self::AesGcm),
            2 => Ok(Self::AesCtrHmac),
            3 => Ok(Self::AesGcmSiv),
            other => Err(StegoError::UnsupportedMode(other)),
        }
    }

    pub fn nonce_len(self) -> usize {
        match self {
            Self::AesCtrHmac => 16,
            Self::AesGcm | Self::AesGcmSiv => 12,
        }
    }

    pub fn tag_len(self) -> usize {
        match self {
            Self::AesCtrHmac => 32,
            Self::AesGcm | Self::AesGcmSiv => 16,
        }
    }
}

/// Password KDF and its cost parameters, stored in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfParams {
    Argon2id { m_cost_kib: u32, t_cost: u32, p_cost: u32 },
    Pbkdf2Sha256 { rounds: u32 },
}

impl Default for KdfParams {
    /// Argon2id with the OWASP baseline (19 MiB, 2 passes, 1 lane).
    fn default() -> Self {
        Self::Argon2id { m_cost_kib: 19 * 1024, t_cost: 2, p_cost: 1 }
    }
}

impl KdfParams {
    pub const ARGON2ID_ID: u8 = 1;
    pub const PBKDF2_ID: u8 = 2;

    pub fn id(&self) -> u8 {
        match self {
            Self::Argon2id { .. } => Self::ARGON2ID_ID,
            Self::Pbkdf2Sha256 { .. } => Self::PBKDF2_ID,
        }
    }

    /// Encoded size including the id byte.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Argon2id { .. } => 1 + 12,
            Self::Pbkdf2Sha256 { .. } => 1 + 4,
        }
    }

    /// Append `id ∥ u32 BE params` to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.id());
        match *self {
            Self::Argon2id { m_cost_kib, t_cost, p_cost } => {
                out.extend_from_slice(&m_cost_kib.to_be_bytes());
                out.extend_from_slice(&t_cost.to_be_bytes());
                out.extend_from_slice(&p_cost.to_be_bytes());
            }
            Self::Pbkdf2Sha256 { rounds } => out.extend_from_slice(&rounds.to_be_bytes()),
        }
    }

    /// Decode a KDF block from the start of `bytes`; returns the params and
    /// the number of bytes consumed. Parameters are range-checked.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), StegoError> {
        let id = *bytes.first().ok_or_else(|| StegoError::truncated(1, 0))?;
        let params = match id {
            Self::ARGON2ID_ID => {
                let f = read_u32s::<3>(&bytes[1..])?;
                Self::Argon2id { m_cost_kib: f[0], t_cost: f[1], p_cost: f[2] }
            }
            Self::PBKDF2_ID => {
                let f = read_u32s::<1>(&bytes[1..])?;
                Self::Pbkdf2Sha256 { rounds: f[0] }
            }
            other => return Err(StegoError::UnsupportedMode(other)),
        };
        params.validate()?;
        Ok((params, params.encoded_len()))
    }

    /// Reject parameters that are unusable or too expensive to honour.
    pub fn validate(&self) -> Result<(), StegoError> {
        match *self {
            Self::Argon2id { m_cost_kib, t_cost, p_cost } => {
                if p_cost == 0 || p_cost > MAX_ARGON2_P_COST {
                    return Err(StegoError::InvalidKdfParams(format!("argon2 p_cost {p_cost}")));
                }
                if t_cost == 0 || t_cost > MAX_ARGON2_T_COST {
                    return Err(StegoError::InvalidKdfParams(format!("argon2 t_cost {t_cost}")));
                }
                if m_cost_kib < 8 * p_cost || m_cost_kib > MAX_ARGON2_M_COST_KIB {
                    return Err(StegoError::InvalidKdfParams(format!(
                        "argon2 m_cost {m_cost_kib} KiB"
                    )));
                }
            }
            Self::Pbkdf2Sha256 { rounds } => {
                if rounds == 0 || rounds > MAX_PBKDF2_ROUNDS {
                    return Err(StegoError::InvalidKdfParams(format!("pbkdf2 rounds {rounds}")));
                }
            }
        }
        Ok(())
    }

    /// Derive the 64-byte key material for `password` and `salt`.
    pub fn derive(
        &self,
        password: &str,
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; DERIVED_KEY_LEN]>, StegoError> {
        self.validate()?;
        let mut out = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        match *self {
            Self::Argon2id { m_cost_kib, t_cost, p_cost } => {
                let params = Params::new(m_cost_kib, t_cost, p_cost, Some(DERIVED_KEY_LEN))
                    .map_err(|e| StegoError::InvalidKdfParams(e.to_string()))?;
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                    .hash_password_into(password.as_bytes(), salt, &mut *out)
                    .map_err(|e| StegoError::InvalidKdfParams(e.to_string()))?;
            }
            Self::Pbkdf2Sha256 { rounds } => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut *out);
            }
        }
        Ok(out)
    }
}

fn read_u32s<const N: usize>(bytes: &[u8]) -> Result<[u32; N], StegoError> {
    if bytes.len() < N * 4 {
        return Err(StegoError::truncated(N * 4, bytes.len()));
    }
    let mut out = [0u32; N];
    for (i, v) in out.iter_mut().enumerate() {
        let b = &bytes[i * 4..i * 4 + 4];
        *v = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    }
    Ok(out)
}

/// Ciphertext with its detached nonce and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal<R: RngCore + CryptoRng>(
    mode: CipherMode,
    key: &[u8; DERIVED_KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
    rng: &mut R,
) -> Sealed {
    let mut nonce = vec![0u8; mode.nonce_len()];
    rng.fill_bytes(&mut nonce);
    let mut buf = plaintext.to_vec();
    let cipher_key = &key[..CIPHER_KEY_LEN];

    let tag = match mode {
        CipherMode::AesGcm => {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cipher_key));
            cipher
                .encrypt_in_place_detached(Nonce::from_slice(&nonce), aad, &mut buf)
                .expect("AES-GCM encrypt should not fail")
                .to_vec()
        }
        CipherMode::AesGcmSiv => {
            let cipher = Aes256GcmSiv::new_from_slice(cipher_key).expect("valid key length");
            cipher
                .encrypt_in_place_detached(aes_gcm_siv::Nonce::from_slice(&nonce), aad, &mut buf)
                .expect("AES-GCM-SIV encrypt should not fail")
                .to_vec()
        }
        CipherMode::AesCtrHmac => {
            let mut ctr = Aes256Ctr::new(cipher_key.into(), nonce.as_slice().into());
            ctr.apply_keystream(&mut buf);
            ctr_hmac_tag(&key[CIPHER_KEY_LEN..], aad, &nonce, &buf)
        }
    };

    Sealed { nonce, tag, ciphertext: buf }
}

/// Verify and decrypt. Any mismatch is [`StegoError::AuthenticationFailure`].
pub fn open(
    mode: CipherMode,
    key: &[u8; DERIVED_KEY_LEN],
    nonce: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, StegoError> {
    if nonce.len() != mode.nonce_len() || tag.len() != mode.tag_len() {
        return Err(StegoError::HeaderMismatch("nonce or tag length does not match cipher"));
    }
    let mut buf = ciphertext.to_vec();
    let cipher_key = &key[..CIPHER_KEY_LEN];

    match mode {
        CipherMode::AesGcm => {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cipher_key));
            cipher
                .decrypt_in_place_detached(
                    Nonce::from_slice(nonce),
                    aad,
                    &mut buf,
                    Tag::from_slice(tag),
                )
                .map_err(|_| StegoError::AuthenticationFailure)?;
        }
        CipherMode::AesGcmSiv => {
            let cipher = Aes256GcmSiv::new_from_slice(cipher_key).expect("valid key length");
            cipher
                .decrypt_in_place_detached(
                    aes_gcm_siv::Nonce::from_slice(nonce),
                    aad,
                    &mut buf,
                    aes_gcm_siv::Tag::from_slice(tag),
                )
                .map_err(|_| StegoError::AuthenticationFailure)?;
        }
        CipherMode::AesCtrHmac => {
            let mut mac = <HmacSha256 as Mac>::new_from_slice(&key[CIPHER_KEY_LEN..])
                .expect("HMAC accepts any key length");
            mac_input(&mut mac, aad, nonce, ciphertext);
            mac.verify_slice(tag).map_err(|_| StegoError::AuthenticationFailure)?;
            let mut ctr = Aes256Ctr::new(cipher_key.into(), nonce.into());
            ctr.apply_keystream(&mut buf);
        }
    }
    Ok(buf)
}

fn ctr_hmac_tag(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac_input(&mut mac, aad, iv, ciphertext);
    mac.finalize().into_bytes().to_vec()
}

fn mac_input(mac: &mut HmacSha256, aad: &[u8], iv: &[u8], ciphertext: &[u8]) {
    mac.update(&(aad.len() as u64).to_be_bytes());
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
}
