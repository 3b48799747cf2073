// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Package construction and parsing.
//!
//! The package is the self-describing byte stream written into the pixel
//! LSBs. Its first byte selects the protection mode; the 9-byte plain header
//! (`"STEGO"` + big-endian u32 payload length) is always present, encrypted
//! in the protected modes.
//!
//! ```text
//! plain:      [0] [header 9] [payload]
//!
//! password:   [1] [cipher id] [kdf block] [u8 len|salt]
//!             [u8 len|header nonce] [u8 len|header tag] [u8 len|header ct]
//!             [payload flag 0|1] ([u8 len|payload nonce] [u8 len|payload tag])
//!             [u32 len|payload bytes]
//!
//! public key: [2] [u16 len|RSA-OAEP(session key)] [nonce 12]
//!             [AES-256-GCM(header ∥ payload) ∥ tag 16]
//! ```
//!
//! In password mode the header ciphertext is bound to everything before it
//! (mode, cipher, KDF block, salt) as associated data, and an encrypted
//! payload is bound to the plain header.
//!
//! The public-key ciphertext has no explicit length. The parser decrypts the
//! first 9 bytes with the GCM keystream directly (counter block 2, the one
//! after the tag mask) to read the declared payload length, then
//! authenticates the whole ciphertext before releasing anything.
//!
//! Parsers accept trailing bytes: the extractor reads every capacity bit of
//! the image and hands over far more than the package.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::stego::crypto::{self, CipherMode, KdfParams, SALT_LEN};
use crate::stego::error::StegoError;
use crate::stego::keys;
use crate::stego::seed::{self, DEFAULT_SEED};

type Aes256Ctr32 = ctr::Ctr32BE<aes::Aes256>;

/// Header magic.
pub const MAGIC: [u8; 5] = *b"STEGO";
/// Plain header length: magic + u32 payload length.
pub const HEADER_LEN: usize = 9;

pub const MODE_PLAIN: u8 = 0;
pub const MODE_PASSWORD: u8 = 1;
pub const MODE_PUBLIC_KEY: u8 = 2;

/// AES-256 session key length for public-key packages.
pub const SESSION_KEY_LEN: usize = 32;
/// GCM nonce length for public-key packages.
pub const PK_NONCE_LEN: usize = 12;
/// GCM tag length for public-key packages.
pub const PK_TAG_LEN: usize = 16;

/// The 9-byte plain header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub payload_len: u32,
}

impl Header {
    pub fn for_payload(payload: &[u8]) -> Result<Self, StegoError> {
        let payload_len =
            u32::try_from(payload.len()).map_err(|_| StegoError::EmptyOrOversizedPayload {
                required_bits: payload.len().saturating_mul(8),
                available_bits: (u32::MAX as usize).saturating_mul(8),
            })?;
        Ok(Self { payload_len })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..5].copy_from_slice(&MAGIC);
        out[5..].copy_from_slice(&self.payload_len.to_be_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, StegoError> {
        if bytes.len() < HEADER_LEN {
            return Err(StegoError::truncated(HEADER_LEN, bytes.len()));
        }
        if bytes[..5] != MAGIC {
            return Err(StegoError::HeaderMismatch("bad magic"));
        }
        let payload_len = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
        Ok(Self { payload_len })
    }
}

/// Protection mode recorded in a parsed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageMode {
    Plain,
    Password { cipher: CipherMode, kdf: KdfParams },
    PublicKey,
}

impl PackageMode {
    pub fn mode_byte(&self) -> u8 {
        match self {
            Self::Plain => MODE_PLAIN,
            Self::Password { .. } => MODE_PASSWORD,
            Self::PublicKey => MODE_PUBLIC_KEY,
        }
    }
}

/// How the embedder protects the payload.
#[derive(Debug, Clone, Copy)]
pub enum Protection<'a> {
    Plain,
    Password {
        password: &'a str,
        cipher: CipherMode,
        kdf: KdfParams,
        /// Encrypt the payload as well as the header.
        encrypt_payload: bool,
    },
    PublicKey(&'a RsaPublicKey),
}

impl<'a> Protection<'a> {
    /// Password protection with default cipher and KDF, payload encrypted.
    pub fn password(password: &'a str) -> Self {
        Self::Password {
            password,
            cipher: CipherMode::default(),
            kdf: KdfParams::default(),
            encrypt_payload: true,
        }
    }

    /// Package bytes added on top of the payload.
    pub fn overhead(&self) -> usize {
        match *self {
            Self::Plain => 1 + HEADER_LEN,
            Self::Password { cipher, kdf, encrypt_payload, .. } => {
                let sealed = (1 + cipher.nonce_len()) + (1 + cipher.tag_len());
                let mut n =
                    2 + kdf.encoded_len() + (1 + SALT_LEN) + sealed + (1 + HEADER_LEN) + 1 + 4;
                if encrypt_payload {
                    n += sealed;
                }
                n
            }
            Self::PublicKey(key) => 1 + 2 + key.size() + PK_NONCE_LEN + HEADER_LEN + PK_TAG_LEN,
        }
    }

    /// Seed used when the caller does not supply one.
    pub fn default_seed(&self) -> Result<String, StegoError> {
        match self {
            Self::Plain => Ok(DEFAULT_SEED.to_string()),
            Self::Password { password, .. } => Ok(seed::password_fingerprint(password)),
            Self::PublicKey(key) => keys::fingerprint(key),
        }
    }
}

/// What the extractor holds to open a package.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    None,
    Password(&'a str),
    PrivateKey(&'a RsaPrivateKey),
}

impl Credential<'_> {
    /// Seed used when the caller does not supply one; matches
    /// [`Protection::default_seed`] for the corresponding protection.
    pub fn default_seed(&self) -> Result<String, StegoError> {
        match self {
            Self::None => Ok(DEFAULT_SEED.to_string()),
            Self::Password(password) => Ok(seed::password_fingerprint(password)),
            Self::PrivateKey(key) => keys::fingerprint(&key.to_public_key()),
        }
    }
}

/// A successfully opened package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub header: Header,
    pub payload: Vec<u8>,
    /// Whether the payload bytes were encrypted in the stream.
    pub encrypted: bool,
    pub mode: PackageMode,
}

/// Build the package for `payload` under `protection`.
pub fn build_package<R: RngCore + CryptoRng>(
    payload: &[u8],
    protection: &Protection,
    rng: &mut R,
) -> Result<Vec<u8>, StegoError> {
    let header = Header::for_payload(payload)?;
    let mut out = Vec::with_capacity(protection.overhead() + payload.len());

    match *protection {
        Protection::Plain => {
            out.push(MODE_PLAIN);
            out.extend_from_slice(&header.to_bytes());
            out.extend_from_slice(payload);
        }
        Protection::Password { password, cipher, kdf, encrypt_payload } => {
            let mut salt = [0u8; SALT_LEN];
            rng.fill_bytes(&mut salt);
            let key = kdf.derive(password, &salt)?;

            out.push(MODE_PASSWORD);
            out.push(cipher.id());
            kdf.encode(&mut out);
            push_prefixed_u8(&mut out, &salt);

            let plain_header = header.to_bytes();
            let sealed_header = crypto::seal(cipher, &key, &plain_header, &out, rng);
            push_prefixed_u8(&mut out, &sealed_header.nonce);
            push_prefixed_u8(&mut out, &sealed_header.tag);
            push_prefixed_u8(&mut out, &sealed_header.ciphertext);

            if encrypt_payload {
                let sealed = crypto::seal(cipher, &key, payload, &plain_header, rng);
                out.push(1);
                push_prefixed_u8(&mut out, &sealed.nonce);
                push_prefixed_u8(&mut out, &sealed.tag);
                push_prefixed_u32(&mut out, &sealed.ciphertext);
            } else {
                out.push(0);
                push_prefixed_u32(&mut out, payload);
            }
        }
        Protection::PublicKey(public) => {
            let mut session_key = Zeroizing::new([0u8; SESSION_KEY_LEN]);
            rng.fill_bytes(&mut *session_key);
            let mut nonce = [0u8; PK_NONCE_LEN];
            rng.fill_bytes(&mut nonce);

            let mut body = Vec::with_capacity(HEADER_LEN + payload.len() + PK_TAG_LEN);
            body.extend_from_slice(&header.to_bytes());
            body.extend_from_slice(payload);
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&*session_key));
            let tag = cipher
                .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut body)
                .expect("AES-GCM encrypt should not fail");
            body.extend_from_slice(&tag);

            let wrapped = keys::wrap_session_key(public, &*session_key, rng)?;
            let wrapped_len = u16::try_from(wrapped.len())
                .map_err(|_| {
                    StegoError::InvalidKey(format!("wrapped key of {} bytes", wrapped.len()))
                })?;

            out.push(MODE_PUBLIC_KEY);
            out.extend_from_slice(&wrapped_len.to_be_bytes());
            out.extend_from_slice(&wrapped);
            out.extend_from_slice(&nonce);
            out.extend_from_slice(&body);
        }
    }

    debug_assert_eq!(out.len(), protection.overhead() + payload.len());
    Ok(out)
}

/// Parse and, where needed, decrypt and authenticate a package.
pub fn open_package(data: &[u8], credential: &Credential) -> Result<Package, StegoError> {
    let mut r = Reader::new(data);
    match r.u8()? {
        MODE_PLAIN => {
            let header = Header::parse(r.take(HEADER_LEN)?)?;
            let payload = r.take(header.payload_len as usize)?.to_vec();
            Ok(Package { header, payload, encrypted: false, mode: PackageMode::Plain })
        }
        MODE_PASSWORD => match credential {
            Credential::Password(password) => open_password(data, r, password),
            _ => Err(StegoError::HeaderMismatch("package is password-protected")),
        },
        MODE_PUBLIC_KEY => match credential {
            Credential::PrivateKey(key) => open_public_key(r, key),
            _ => Err(StegoError::HeaderMismatch("package requires a private key")),
        },
        other => Err(StegoError::UnsupportedMode(other)),
    }
}

fn open_password(data: &[u8], mut r: Reader<'_>, password: &str) -> Result<Package, StegoError> {
    let cipher = CipherMode::from_id(r.u8()?)?;
    let (kdf, used) = KdfParams::decode(r.rest())?;
    r.skip(used)?;
    let salt = r.prefixed_u8()?;
    if salt.len() != SALT_LEN {
        return Err(StegoError::HeaderMismatch("unexpected salt length"));
    }
    let aad = &data[..r.position()];

    let header_nonce = r.prefixed_u8()?;
    let header_tag = r.prefixed_u8()?;
    let header_ct = r.prefixed_u8()?;
    if header_ct.len() != HEADER_LEN {
        return Err(StegoError::HeaderMismatch("unexpected header length"));
    }

    let encrypted = match r.u8()? {
        0 => false,
        1 => true,
        _ => return Err(StegoError::HeaderMismatch("invalid payload flag")),
    };
    let payload_seal = if encrypted { Some((r.prefixed_u8()?, r.prefixed_u8()?)) } else { None };
    let payload_bytes = r.prefixed_u32()?;

    let key = kdf.derive(password, salt)?;
    let plain_header = crypto::open(cipher, &key, header_nonce, header_tag, header_ct, aad)?;
    let header = Header::parse(&plain_header)?;

    let payload = match payload_seal {
        Some((nonce, tag)) => crypto::open(cipher, &key, nonce, tag, payload_bytes, &plain_header)?,
        None => payload_bytes.to_vec(),
    };
    if payload.len() != header.payload_len as usize {
        return Err(StegoError::HeaderMismatch("payload length disagrees with header"));
    }

    Ok(Package { header, payload, encrypted, mode: PackageMode::Password { cipher, kdf } })
}

fn open_public_key(mut r: Reader<'_>, private: &RsaPrivateKey) -> Result<Package, StegoError> {
    let wrapped_len = r.u16()? as usize;
    let wrapped = r.take(wrapped_len)?;
    let nonce = r.take(PK_NONCE_LEN)?;
    let session_key = keys::unwrap_session_key(private, wrapped)?;
    if session_key.len() != SESSION_KEY_LEN {
        return Err(StegoError::AuthenticationFailure);
    }

    let rest = r.rest();
    if rest.len() < HEADER_LEN {
        return Err(StegoError::truncated(HEADER_LEN, rest.len()));
    }
    let declared = peek_header(&session_key, nonce, &rest[..HEADER_LEN])?;
    let body_len = HEADER_LEN
        .checked_add(declared.payload_len as usize)
        .ok_or_else(|| StegoError::truncated(usize::MAX, rest.len()))?;
    let body = r.take(body_len)?;
    let tag = r.take(PK_TAG_LEN)?;

    let mut plain = body.to_vec();
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&session_key));
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut plain, Tag::from_slice(tag))
        .map_err(|_| StegoError::AuthenticationFailure)?;

    let header = Header::parse(&plain)?;
    let payload = plain.split_off(HEADER_LEN);
    Ok(Package { header, payload, encrypted: true, mode: PackageMode::PublicKey })
}

/// Decrypt the leading header bytes of a GCM ciphertext without the tag.
///
/// Used only to learn the declared length; nothing from it is returned to
/// the caller until the full ciphertext authenticates.
fn peek_header(session_key: &[u8], nonce: &[u8], head: &[u8]) -> Result<Header, StegoError> {
    let mut counter_block = [0u8; 16];
    counter_block[..PK_NONCE_LEN].copy_from_slice(nonce);
    counter_block[15] = 2;
    let mut buf = [0u8; HEADER_LEN];
    buf.copy_from_slice(head);
    let mut ctr = Aes256Ctr32::new(session_key.into(), counter_block.as_slice().into());
    ctr.apply_keystream(&mut buf);
    Header::parse(&buf)
}

fn push_prefixed_u8(out: &mut Vec<u8>, bytes: &[u8]) {
    debug_assert!(bytes.len() <= u8::MAX as usize);
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

fn push_prefixed_u32(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Bounds-checked cursor over package bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StegoError> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(StegoError::truncated(n, available));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<(), StegoError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, StegoError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, StegoError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, StegoError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn prefixed_u8(&mut self) -> Result<&'a [u8], StegoError> {
        let n = self.u8()? as usize;
        self.take(n)
    }

    fn prefixed_u32(&mut self) -> Result<&'a [u8], StegoError> {
        let n = self.u32()? as usize;
        self.take(n)
    }
}

/// Convert bytes to a bit vector (MSB first).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::keys::test_keys::pair;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const FAST_KDF: KdfParams = KdfParams::Argon2id { m_cost_kib: 64, t_cost: 1, p_cost: 1 };

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    fn pw(password: &str, cipher: CipherMode, encrypt_payload: bool) -> Protection<'_> {
        Protection::Password { password, cipher, kdf: FAST_KDF, encrypt_payload }
    }

    #[test]
    fn plain_layout() {
        let pkg = build_package(b"hi", &Protection::Plain, &mut rng()).unwrap();
        assert_eq!(pkg, [&[0u8][..], b"STEGO", &[0, 0, 0, 2], b"hi"].concat());
        let opened = open_package(&pkg, &Credential::None).unwrap();
        assert_eq!(opened.payload, b"hi");
        assert_eq!(opened.header.payload_len, 2);
        assert!(!opened.encrypted);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut pkg = build_package(b"abc", &Protection::Plain, &mut rng()).unwrap();
        pkg.extend_from_slice(&[0xAA; 40]);
        assert_eq!(open_package(&pkg, &Credential::None).unwrap().payload, b"abc");
    }

    #[test]
    fn password_roundtrip_all_ciphers() {
        for cipher in [CipherMode::AesGcm, CipherMode::AesCtrHmac, CipherMode::AesGcmSiv] {
            for encrypt_payload in [true, false] {
                let prot = pw("secret", cipher, encrypt_payload);
                let mut pkg = build_package(b"payload bytes", &prot, &mut rng()).unwrap();
                assert_eq!(pkg.len(), prot.overhead() + 13);
                pkg.extend_from_slice(&[0u8; 7]);
                let opened = open_package(&pkg, &Credential::Password("secret")).unwrap();
                assert_eq!(opened.payload, b"payload bytes");
                assert_eq!(opened.encrypted, encrypt_payload);
                assert_eq!(opened.mode, PackageMode::Password { cipher, kdf: FAST_KDF });
            }
        }
    }

    #[test]
    fn pbkdf2_package_roundtrip() {
        let prot = Protection::Password {
            password: "pw",
            cipher: CipherMode::AesGcmSiv,
            kdf: KdfParams::Pbkdf2Sha256 { rounds: 2000 },
            encrypt_payload: true,
        };
        let pkg = build_package(b"x", &prot, &mut rng()).unwrap();
        assert_eq!(open_package(&pkg, &Credential::Password("pw")).unwrap().payload, b"x");
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let prot = pw("right", CipherMode::AesGcm, true);
        let pkg = build_package(b"top secret", &prot, &mut rng()).unwrap();
        assert!(matches!(
            open_package(&pkg, &Credential::Password("wrong")),
            Err(StegoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_prefix_fails_authentication() {
        // Flipping a salt byte changes both the key and the header AAD.
        let mut pkg =
            build_package(b"data", &pw("pw", CipherMode::AesCtrHmac, true), &mut rng()).unwrap();
        let salt_at = 2 + FAST_KDF.encoded_len() + 1;
        pkg[salt_at] ^= 0x01;
        assert!(matches!(
            open_package(&pkg, &Credential::Password("pw")),
            Err(StegoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_raw_payload_detected_by_length_only() {
        // A raw payload is not authenticated, but its length is bound to the
        // encrypted header.
        let prot = pw("pw", CipherMode::AesGcm, false);
        let mut pkg = build_package(b"abcd", &prot, &mut rng()).unwrap();
        let len_at = pkg.len() - 4 - 4;
        pkg[len_at + 3] = 3;
        assert!(matches!(
            open_package(&pkg, &Credential::Password("pw")),
            Err(StegoError::HeaderMismatch(_))
        ));
    }

    #[test]
    fn credential_kind_must_match_mode() {
        let pkg = build_package(b"x", &pw("pw", CipherMode::AesGcm, true), &mut rng()).unwrap();
        assert!(matches!(
            open_package(&pkg, &Credential::None),
            Err(StegoError::HeaderMismatch(_))
        ));

        let (sk, pk) = pair(0);
        let pkg = build_package(b"x", &Protection::PublicKey(pk), &mut rng()).unwrap();
        assert!(matches!(
            open_package(&pkg, &Credential::Password("pw")),
            Err(StegoError::HeaderMismatch(_))
        ));
        assert!(open_package(&pkg, &Credential::PrivateKey(sk)).is_ok());
    }

    #[test]
    fn public_key_roundtrip_with_trailing_bits() {
        let (sk, pk) = pair(0);
        let prot = Protection::PublicKey(pk);
        let payload: Vec<u8> = (0..300u32).map(|i| (i * 7) as u8).collect();
        let mut pkg = build_package(&payload, &prot, &mut rng()).unwrap();
        assert_eq!(pkg.len(), prot.overhead() + payload.len());
        pkg.extend_from_slice(&[0x55; 64]);
        let opened = open_package(&pkg, &Credential::PrivateKey(sk)).unwrap();
        assert_eq!(opened.payload, payload);
        assert_eq!(opened.mode, PackageMode::PublicKey);
        assert!(opened.encrypted);
    }

    #[test]
    fn public_key_wrong_key_and_tamper() {
        let (_, pk) = pair(0);
        let (other_sk, _) = pair(1);
        let pkg = build_package(b"msg", &Protection::PublicKey(pk), &mut rng()).unwrap();
        assert!(matches!(
            open_package(&pkg, &Credential::PrivateKey(other_sk)),
            Err(StegoError::AuthenticationFailure)
        ));

        let (sk, _) = pair(0);
        let mut tampered = pkg.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x80;
        assert!(matches!(
            open_package(&tampered, &Credential::PrivateKey(sk)),
            Err(StegoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn public_key_truncated_body() {
        let (sk, pk) = pair(0);
        let pkg = build_package(&[1u8; 50], &Protection::PublicKey(pk), &mut rng()).unwrap();
        let cut = &pkg[..pkg.len() - 20];
        assert!(matches!(
            open_package(cut, &Credential::PrivateKey(sk)),
            Err(StegoError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn public_key_forged_length_is_truncated() {
        let (sk, pk) = pair(0);
        let mut pkg = build_package(b"hi", &Protection::PublicKey(pk), &mut rng()).unwrap();
        // The header is CTR-encrypted: flipping ciphertext bits flips the
        // declared length from 2 to u32::MAX without touching the magic.
        let len_at = 1 + 2 + pk.size() + PK_NONCE_LEN + 5;
        for (b, x) in pkg[len_at..len_at + 4].iter_mut().zip([0xFF, 0xFF, 0xFF, 0xFD]) {
            *b ^= x;
        }
        assert!(matches!(
            open_package(&pkg, &Credential::PrivateKey(sk)),
            Err(StegoError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn bad_magic_and_mode() {
        let mut pkg = build_package(b"hi", &Protection::Plain, &mut rng()).unwrap();
        pkg[1] = b'X';
        assert!(matches!(
            open_package(&pkg, &Credential::None),
            Err(StegoError::HeaderMismatch(_))
        ));
        assert!(matches!(
            open_package(&[7, 1, 2], &Credential::None),
            Err(StegoError::UnsupportedMode(7))
        ));
        assert!(matches!(
            open_package(&[], &Credential::None),
            Err(StegoError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn plain_truncated_payload() {
        let pkg = build_package(b"hello", &Protection::Plain, &mut rng()).unwrap();
        assert!(matches!(
            open_package(&pkg[..pkg.len() - 1], &Credential::None),
            Err(StegoError::TruncatedStream { needed: 5, available: 4 })
        ));
    }

    #[test]
    fn default_seeds_agree_between_sides() {
        let (sk, pk) = pair(0);
        assert_eq!(
            Protection::Plain.default_seed().unwrap(),
            Credential::None.default_seed().unwrap()
        );
        assert_eq!(
            Protection::password("pw").default_seed().unwrap(),
            Credential::Password("pw").default_seed().unwrap()
        );
        assert_eq!(
            Protection::PublicKey(pk).default_seed().unwrap(),
            Credential::PrivateKey(sk).default_seed().unwrap()
        );
    }

    #[test]
    fn bytes_bits_roundtrip() {
        let bytes = vec![0xA5, 0x00, 0xFF, 0x3C];
        let bits = bytes_to_bits(&bytes);
        assert_eq!(&bits[..8], &[1, 0, 1, 0, 0, 1, 0, 1]);
        assert_eq!(bits_to_bytes(&bits), bytes);
    }

    #[test]
    fn bits_to_bytes_partial_byte() {
        assert_eq!(bits_to_bytes(&[1, 1, 0]), vec![0b1100_0000]);
    }
}
