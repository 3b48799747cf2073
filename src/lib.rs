// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # adaptive-stego
//!
//! Content-adaptive LSB steganography for 24-bit RGB images. Each pixel gets
//! 0 to 3 bits per channel depending on local texture, noise and a per-block
//! drift guard, and the payload is written in a seed-dependent order starting
//! with the busiest regions. A stego image is only returned when it passes a
//! PSNR/SSIM/histogram quality gate.
//!
//! Payloads can be stored plain, encrypted with a password (Argon2id or
//! PBKDF2; AES-256-GCM, AES-256-CTR+HMAC or AES-256-GCM-SIV), or encrypted to
//! an RSA public key (RSA-OAEP + AES-256-GCM).
//!
//! All processing is in memory. The library never prints; it emits `log`
//! records at debug and trace level.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use adaptive_stego::{embed, extract, CarrierImage, Credential, Protection};
//!
//! let cover = CarrierImage::from_png(&std::fs::read("cover.png").unwrap()).unwrap();
//! let out = embed(&cover, b"secret message", None, &Protection::password("passphrase")).unwrap();
//! std::fs::write("stego.png", out.stego.to_png().unwrap()).unwrap();
//!
//! let got = extract(&out.stego, None, &Credential::Password("passphrase")).unwrap();
//! assert_eq!(got.payload, b"secret message");
//! ```

pub mod carrier;
pub mod det_math;
pub mod stego;

pub use carrier::{CarrierImage, ImageFormatError, MAX_DIMENSION, MAX_PIXELS};
pub use stego::keys::{
    fingerprint, generate_keypair, private_key_from_pem, private_key_to_pem, public_key_from_pem,
    public_key_to_pem,
};
pub use stego::{
    capacity_bits, embed, embed_with_options, extract, extract_with_progress, max_payload_len,
    progress, CipherMode, Credential, EmbedOptions, EmbedOutcome, Extracted, Header, KdfParams,
    PackageMode, Phase, Progress, Protection, QualityGate, QualityReport, StegoError,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
