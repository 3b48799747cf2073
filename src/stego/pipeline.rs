// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embed/extract pipeline.
//!
//! Embedding:
//! 1. Capacity plan on the cover's analysis plane (texture, noise, order, drift)
//! 2. Capacity check against the package size
//! 3. Package build (header, optional encryption) and MSB-first bit expansion
//! 4. Bit walk along the pixel order into a copy of the cover
//! 5. Quality gate (PSNR, SSIM, histogram drift); a failing image is discarded
//!
//! Extraction replays step 1 on the stego image, reads every capacity bit in
//! the same order and hands the bytes to the package parser. Either call
//! returns a complete result or an error, never a partial image or payload.

use rand::{CryptoRng, RngCore};

use crate::carrier::CarrierImage;
use crate::stego::capacity::{self, CapacityPlan};
use crate::stego::error::StegoError;
use crate::stego::frame::{self, Credential, Header, PackageMode, Protection};
use crate::stego::lsb;
use crate::stego::metrics::{QualityGate, QualityReport};
use crate::stego::progress::{Phase, Progress, EMBED_STEPS, EXTRACT_STEPS};

/// Embed-only settings. None of these affect extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbedOptions<'a> {
    pub quality: QualityGate,
    pub progress: Option<&'a Progress>,
}

/// A stego image that passed the quality gate, with its measurements.
#[derive(Debug, Clone)]
pub struct EmbedOutcome {
    pub stego: CarrierImage,
    pub psnr: f64,
    pub ssim: f64,
    pub histogram_drift: f64,
    /// Package bits written.
    pub bits_embedded: usize,
    /// Total capacity of the cover under the seed used.
    pub capacity_bits: usize,
}

/// A recovered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub header: Header,
    pub payload: Vec<u8>,
    pub encrypted: bool,
    pub mode: PackageMode,
}

/// Embed `payload` into `cover` with default options and OS randomness.
///
/// `seed` selects the pixel order and drift simulation; `None` uses the
/// protection's default (a fixed string in plain mode, the password or key
/// fingerprint otherwise).
pub fn embed(
    cover: &CarrierImage,
    payload: &[u8],
    seed: Option<&str>,
    protection: &Protection,
) -> Result<EmbedOutcome, StegoError> {
    embed_with_options(
        cover,
        payload,
        seed,
        protection,
        &EmbedOptions::default(),
        &mut rand::thread_rng(),
    )
}

/// Embed with explicit options and a caller-supplied crypto RNG.
pub fn embed_with_options<R: RngCore + CryptoRng>(
    cover: &CarrierImage,
    payload: &[u8],
    seed: Option<&str>,
    protection: &Protection,
    options: &EmbedOptions,
    rng: &mut R,
) -> Result<EmbedOutcome, StegoError> {
    let progress = options.progress;
    if let Some(p) = progress {
        p.init(EMBED_STEPS);
    }

    let seed = resolve_seed(seed, || protection.default_seed())?;
    let plan = capacity::plan(cover, &seed, progress);
    let available_bits = plan.total_bits();
    let required_bits = (protection.overhead() + payload.len()).saturating_mul(8);
    if required_bits > available_bits {
        log::debug!("embed rejected: {required_bits} bits needed, {available_bits} available");
        return Err(StegoError::EmptyOrOversizedPayload { required_bits, available_bits });
    }

    enter(progress, Phase::Package);
    let package = frame::build_package(payload, protection, rng)?;
    let bits = frame::bytes_to_bits(&package);

    enter(progress, Phase::Write);
    let mut stego = cover.clone();
    let written = write_all(&mut stego, &plan, &bits)?;

    enter(progress, Phase::Validate);
    let report = QualityReport::measure(cover, &stego);
    log::debug!(
        "embedded {written}/{available_bits} bits: PSNR={:.2} SSIM={:.5} drift={:.5}",
        report.psnr,
        report.ssim,
        report.histogram_drift
    );
    if !report.passes(&options.quality) {
        return Err(StegoError::QualityThresholdNotMet {
            psnr: report.psnr,
            ssim: report.ssim,
            histogram_drift: report.histogram_drift,
        });
    }

    if let Some(p) = progress {
        p.finish();
    }
    Ok(EmbedOutcome {
        stego,
        psnr: report.psnr,
        ssim: report.ssim,
        histogram_drift: report.histogram_drift,
        bits_embedded: written,
        capacity_bits: available_bits,
    })
}

fn write_all(
    stego: &mut CarrierImage,
    plan: &CapacityPlan,
    bits: &[u8],
) -> Result<usize, StegoError> {
    let written = lsb::write_bits(stego, &plan.order, &plan.capacity, bits);
    if written < bits.len() {
        return Err(StegoError::EmptyOrOversizedPayload {
            required_bits: bits.len(),
            available_bits: written,
        });
    }
    Ok(written)
}

/// Recover the payload from `stego`.
pub fn extract(
    stego: &CarrierImage,
    seed: Option<&str>,
    credential: &Credential,
) -> Result<Extracted, StegoError> {
    extract_with_progress(stego, seed, credential, None)
}

/// [`extract`] reporting to a progress tracker.
pub fn extract_with_progress(
    stego: &CarrierImage,
    seed: Option<&str>,
    credential: &Credential,
    progress: Option<&Progress>,
) -> Result<Extracted, StegoError> {
    if let Some(p) = progress {
        p.init(EXTRACT_STEPS);
    }

    let seed = resolve_seed(seed, || credential.default_seed())?;
    let plan = capacity::plan(stego, &seed, progress);

    enter(progress, Phase::Read);
    let bits = lsb::read_bits(stego, &plan.order, &plan.capacity);
    let bytes = frame::bits_to_bytes(&bits);

    enter(progress, Phase::Unpack);
    let package = frame::open_package(&bytes, credential)?;
    log::debug!(
        "extracted {} payload bytes ({:?}, encrypted={})",
        package.payload.len(),
        package.mode,
        package.encrypted
    );

    if let Some(p) = progress {
        p.finish();
    }
    Ok(Extracted {
        header: package.header,
        payload: package.payload,
        encrypted: package.encrypted,
        mode: package.mode,
    })
}

/// Total embeddable bits of `image` under `seed`.
pub fn capacity_bits(image: &CarrierImage, seed: &str) -> usize {
    capacity::plan(image, seed, None).total_bits()
}

/// Largest payload (bytes) that fits into `image` under `protection`.
///
/// Quality is not predicted: a payload of this size always fits, but may
/// still fail the quality gate.
pub fn max_payload_len(
    image: &CarrierImage,
    seed: Option<&str>,
    protection: &Protection,
) -> Result<usize, StegoError> {
    let seed = resolve_seed(seed, || protection.default_seed())?;
    Ok((capacity_bits(image, &seed) / 8).saturating_sub(protection.overhead()))
}

fn resolve_seed<F>(seed: Option<&str>, default: F) -> Result<String, StegoError>
where
    F: FnOnce() -> Result<String, StegoError>,
{
    match seed {
        Some(s) => Ok(s.to_string()),
        None => default(),
    }
}

fn enter(progress: Option<&Progress>, phase: Phase) {
    if let Some(p) = progress {
        p.enter(phase);
    }
}
