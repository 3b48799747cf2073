// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Adaptive LSB embedding and extraction.
//!
//! The capacity of every pixel is decided from content alone:
//!
//! - [`texture`]: local entropy and Sobel gradient give a surface score and a
//!   base capacity of 1, 2 or 3 bits per channel
//! - [`noise`]: pixels that stand out from their neighbours lose capacity
//! - [`permute`]: busy pixels are visited first, ties broken by the seed
//! - [`drift`]: 8×8 blocks whose simulated embedding moves their luma
//!   statistics too far shrink or lock
//!
//! All of it runs on the analysis plane (low 3 bits cleared), so extraction
//! reconstructs the same plan from the stego image. The payload travels in a
//! self-describing package ([`frame`]) that is plain, password-encrypted
//! ([`crypto`]) or encrypted to an RSA public key ([`keys`]).

pub mod capacity;
pub mod crypto;
pub mod drift;
pub mod error;
pub mod frame;
pub mod keys;
pub mod lsb;
pub mod metrics;
pub mod noise;
pub mod permute;
mod pipeline;
pub mod progress;
pub mod seed;
pub mod texture;

pub use capacity::{CapacityMap, CapacityPlan};
pub use crypto::{CipherMode, KdfParams};
pub use error::StegoError;
pub use frame::{Credential, Header, PackageMode, Protection};
pub use metrics::{QualityGate, QualityReport};
pub use pipeline::{
    capacity_bits, embed, embed_with_options, extract, extract_with_progress, max_payload_len,
    EmbedOptions, EmbedOutcome, Extracted,
};
pub use progress::{Phase, Progress};
