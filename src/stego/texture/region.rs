// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Region classification from the surface score.

/// Surface score at or below which a pixel is [`RegionClass::Smooth`].
pub const SMOOTH_THRESHOLD: f64 = 0.25;

/// Surface score at or below which a pixel is [`RegionClass::Texture`].
pub const TEXTURE_THRESHOLD: f64 = 0.65;

/// Texture class of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionClass {
    Smooth,
    Texture,
    Edge,
}

impl RegionClass {
    /// Classify a surface score in [0, 1].
    pub fn from_surface(surface: f64) -> Self {
        if surface <= SMOOTH_THRESHOLD {
            Self::Smooth
        } else if surface <= TEXTURE_THRESHOLD {
            Self::Texture
        } else {
            Self::Edge
        }
    }

    /// Bits per channel this class may carry before any reduction.
    pub fn base_capacity(self) -> u8 {
        match self {
            Self::Smooth => 1,
            Self::Texture => 2,
            Self::Edge => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_upper_bounds() {
        assert_eq!(RegionClass::from_surface(0.0), RegionClass::Smooth);
        assert_eq!(RegionClass::from_surface(0.25), RegionClass::Smooth);
        assert_eq!(RegionClass::from_surface(0.2501), RegionClass::Texture);
        assert_eq!(RegionClass::from_surface(0.65), RegionClass::Texture);
        assert_eq!(RegionClass::from_surface(0.66), RegionClass::Edge);
        assert_eq!(RegionClass::from_surface(1.0), RegionClass::Edge);
    }

    #[test]
    fn base_capacities() {
        assert_eq!(RegionClass::Smooth.base_capacity(), 1);
        assert_eq!(RegionClass::Texture.base_capacity(), 2);
        assert_eq!(RegionClass::Edge.base_capacity(), 3);
    }
}
