// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! 24-bit RGB carrier images.
//!
//! A [`CarrierImage`] is a tightly packed `height × width × 3` byte matrix in
//! R, G, B order with no alpha plane. It is the only pixel format the engine
//! understands; PNG decoding lives in [`png`] and rejects anything else.
//!
//! The *analysis plane* is the image with the low [`MAX_BITS_PER_CHANNEL`]
//! bits of every channel cleared. Embedding never touches any other bits, so
//! the analysis plane of a cover and of its stego image are identical, and
//! every capacity/ordering decision is computed from it.

pub mod error;
pub mod png;

pub use error::ImageFormatError;

/// Maximum number of low-order bits the engine may ever modify per channel.
pub const MAX_BITS_PER_CHANNEL: u8 = 3;

/// Mask that clears the low [`MAX_BITS_PER_CHANNEL`] bits.
pub const ANALYSIS_MASK: u8 = !((1u8 << MAX_BITS_PER_CHANNEL) - 1);

/// Maximum pixel dimension (width or height).
pub const MAX_DIMENSION: usize = 8192;

/// Maximum total pixel count (width × height).
pub const MAX_PIXELS: usize = 16_000_000;

/// Number of color channels per pixel.
pub const CHANNELS: usize = 3;

/// BT.601 luma weights.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// An 8-bit RGB image owned by one pipeline invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct CarrierImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl std::fmt::Debug for CarrierImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Validate image dimensions against the supported bounds.
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), ImageFormatError> {
    if width == 0
        || height == 0
        || width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width.checked_mul(height).map_or(true, |p| p > MAX_PIXELS)
    {
        return Err(ImageFormatError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl CarrierImage {
    /// Wrap a packed RGB buffer, checking dimensions and length.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageFormatError> {
        validate_dimensions(width, height)?;
        let expected = width * height * CHANNELS;
        if data.len() != expected {
            return Err(ImageFormatError::BufferSize { expected, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel in raster order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self, ImageFormatError>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        validate_dimensions(width, height)?;
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self { width, height, data })
    }

    /// A single-color image.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Result<Self, ImageFormatError> {
        Self::from_fn(width, height, |_, _| rgb)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Packed RGB bytes in raster order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGB triple at flat pixel index `idx = y * width + x`.
    #[inline]
    pub fn pixel(&self, idx: usize) -> [u8; 3] {
        let o = idx * CHANNELS;
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// RGB triple at `(x, y)`.
    #[inline]
    pub fn pixel_at(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixel(y * self.width + x)
    }

    /// Channel value at flat pixel index `idx`.
    #[inline]
    pub fn channel(&self, idx: usize, c: usize) -> u8 {
        self.data[idx * CHANNELS + c]
    }

    #[inline]
    pub(crate) fn set_channel(&mut self, idx: usize, c: usize, value: u8) {
        self.data[idx * CHANNELS + c] = value;
    }

    /// Copy of the image with the modifiable low bits cleared.
    pub fn analysis_plane(&self) -> CarrierImage {
        CarrierImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| v & ANALYSIS_MASK).collect(),
        }
    }

    /// BT.601 luma per pixel, raster order.
    pub fn luma(&self) -> Vec<f64> {
        self.data.chunks_exact(CHANNELS).map(|p| luma_of(p[0], p[1], p[2])).collect()
    }

    /// Decode a 24-bit RGB PNG.
    pub fn from_png(bytes: &[u8]) -> Result<Self, ImageFormatError> {
        png::decode_png(bytes)
    }

    /// Encode as a 24-bit RGB PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, ImageFormatError> {
        png::encode_png(self)
    }
}

/// BT.601 luma of one RGB triple.
#[inline]
pub fn luma_of(r: u8, g: u8, b: u8) -> f64 {
    LUMA_WEIGHTS[0] * r as f64 + LUMA_WEIGHTS[1] * g as f64 + LUMA_WEIGHTS[2] * b as f64
}
