// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers all failure modes from image validation through
//! capacity planning, encryption and package parsing. Every variant is
//! terminal for the embed/extract call that produced it.

use thiserror::Error;

use crate::carrier::ImageFormatError;

/// Errors that can occur during steganographic embedding or extraction.
#[derive(Debug, Error)]
pub enum StegoError {
    /// The carrier is not a well-formed 8-bit RGB image.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageFormatError),
    /// The payload is empty where data is required, or needs more bits than the
    /// image can carry after capacity planning.
    #[error("payload needs {required_bits} bits but only {available_bits} are available")]
    EmptyOrOversizedPayload {
        required_bits: usize,
        available_bits: usize,
    },
    /// The candidate stego image failed the global quality gate and was discarded.
    #[error(
        "quality thresholds not met: PSNR={psnr:.2} dB, SSIM={ssim:.4}, drift={histogram_drift:.4}"
    )]
    QualityThresholdNotMet {
        psnr: f64,
        ssim: f64,
        histogram_drift: f64,
    },
    /// Bad magic, inconsistent length, or a package that does not match the
    /// supplied credentials (typically a wrong password, key or seed).
    #[error("header mismatch: {0}")]
    HeaderMismatch(&'static str),
    /// AEAD tag, HMAC or RSA-OAEP verification failed.
    #[error("authentication failed (wrong password or key?)")]
    AuthenticationFailure,
    /// Unknown package mode, cipher mode or KDF identifier.
    #[error("unsupported mode byte 0x{0:02x}")]
    UnsupportedMode(u8),
    /// Not enough bits/bytes to satisfy a declared length.
    #[error("stream truncated: needed {needed} bytes, {available} available")]
    TruncatedStream { needed: usize, available: usize },
    /// RSA key material could not be parsed, generated or used.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// KDF cost parameters outside the accepted range.
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),
}

impl StegoError {
    /// Shorthand for [`StegoError::TruncatedStream`].
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedStream { needed, available }
    }
}
