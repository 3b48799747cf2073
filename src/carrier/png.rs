// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! PNG decode/encode for carrier and stego images.
//!
//! Only 8-bit RGB is accepted. Palette images without transparency are
//! expanded to RGB by the decoder and pass; anything that decodes to an
//! alpha, grayscale or 16-bit layout is rejected rather than silently
//! converted, because dropping alpha would change what the caller saves.

use ::image::codecs::png::PngEncoder;
use ::image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

use super::{CarrierImage, ImageFormatError};

/// Decode PNG bytes into a [`CarrierImage`].
pub fn decode_png(bytes: &[u8]) -> Result<CarrierImage, ImageFormatError> {
    let format = ::image::guess_format(bytes).map_err(|_| ImageFormatError::NotPng)?;
    if format != ImageFormat::Png {
        return Err(ImageFormatError::NotPng);
    }

    let decoded = ::image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| ImageFormatError::Decode(e.to_string()))?;

    match decoded {
        DynamicImage::ImageRgb8(buf) => {
            let (w, h) = buf.dimensions();
            CarrierImage::new(w as usize, h as usize, buf.into_raw())
        }
        other => Err(ImageFormatError::UnsupportedColor(format!("{:?}", other.color()))),
    }
}

/// Encode a [`CarrierImage`] as an 8-bit RGB PNG.
pub fn encode_png(img: &CarrierImage) -> Result<Vec<u8>, ImageFormatError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            img.as_bytes(),
            img.width() as u32,
            img.height() as u32,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImageFormatError::Encode(e.to_string()))?;
    Ok(out)
}
