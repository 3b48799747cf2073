// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for carrier image decoding and validation.

use thiserror::Error;

/// Errors raised while turning raw bytes into a [`CarrierImage`](super::CarrierImage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageFormatError {
    /// Input bytes are not a PNG stream.
    #[error("not a PNG image")]
    NotPng,
    /// The PNG decoder rejected the stream.
    #[error("PNG decode failed: {0}")]
    Decode(String),
    /// The PNG encoder failed to write the stego image.
    #[error("PNG encode failed: {0}")]
    Encode(String),
    /// Only 8-bit RGB without alpha is accepted.
    #[error("unsupported color type {0} (expected 8-bit RGB)")]
    UnsupportedColor(String),
    /// Zero-sized image or dimensions beyond the supported maximum.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Raw buffer length does not match `width * height * 3`.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}
