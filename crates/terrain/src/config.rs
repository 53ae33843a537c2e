//! Terrain configuration with fail-fast validation.
//!
//! All tuning lives in plain data structs with serde derives so a host can
//! load overrides from disk; `validate()` rejects inconsistent setups at
//! construction time instead of surfacing artifacts at query time.

use crate::biome::{BiomeKind, BiomeProfiles};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One entry in the ordered band partition of the selector range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Biome this band selects.
    pub kind: BiomeKind,
    /// Fractional width of the band within `[0, 1]`.
    pub width: f64,
}

/// Configuration for the biome classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Ordered, non-overlapping bands; widths must sum to 1.
    pub bands: Vec<Band>,
    /// Half-width of the smooth transition around interior band
    /// boundaries. `2 * transition_half_width` must fit inside the
    /// narrowest band so transition zones never overlap three-way.
    pub transition_half_width: f64,
    /// Frequency of the regional biome-size field (very low; one region
    /// spans many biomes).
    pub region_frequency: f64,
    /// Selector frequency where the size field reads 0 (largest biomes).
    pub large_biome_frequency: f64,
    /// Selector frequency where the size field reads 1 (smallest biomes).
    pub small_biome_frequency: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            // Order fixes which biomes can border each other: trenches abut
            // sand plains, islands abut the shelf.
            bands: vec![
                Band {
                    kind: BiomeKind::Trench,
                    width: 0.22,
                },
                Band {
                    kind: BiomeKind::FlatSandy,
                    width: 0.34,
                },
                Band {
                    kind: BiomeKind::ContinentalShelf,
                    width: 0.28,
                },
                Band {
                    kind: BiomeKind::Island,
                    width: 0.16,
                },
            ],
            transition_half_width: 0.05,
            region_frequency: 0.00008,
            large_biome_frequency: 0.0005,
            small_biome_frequency: 0.0016,
        }
    }
}

impl ClassifierConfig {
    /// Validate band coverage, widths, transition sizing, and frequencies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut total = 0.0;
        let mut min_width = f64::INFINITY;
        for band in &self.bands {
            if band.width <= 0.0 {
                return Err(ConfigError::BandWidth {
                    kind: band.kind,
                    width: band.width,
                });
            }
            total += band.width;
            min_width = min_width.min(band.width);
        }
        if (total - 1.0).abs() > 1e-9 {
            return Err(ConfigError::BandCoverage { total });
        }
        if self.transition_half_width < 0.0 || 2.0 * self.transition_half_width > min_width {
            return Err(ConfigError::TransitionTooWide {
                half_width: self.transition_half_width,
                min_band_width: min_width,
            });
        }
        for (name, value) in [
            ("region_frequency", self.region_frequency),
            ("large_biome_frequency", self.large_biome_frequency),
            ("small_biome_frequency", self.small_biome_frequency),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Full terrain configuration: seed, height composition constants, biome
/// profile table, and classifier layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed; every derived field salts this.
    pub seed: u32,
    /// Base sampling frequency for the height field, before per-biome
    /// `noise_scale` multipliers.
    pub base_scale: f64,
    /// Base noise amplitude in world units, before per-biome
    /// `height_scale` multipliers.
    pub base_amplitude: f64,
    /// Constant subtracted from the composed height so the average floor
    /// sits below the reference depth.
    pub base_vertical_offset: f64,
    /// Reference seafloor depth (world-space Y, negative = below sea
    /// level) that biome-shaped height is added to.
    pub sea_floor_depth: f64,
    /// Frequency of the amplitude-variation field.
    pub amplitude_frequency: f64,
    /// Per-biome terrain-shaping constants.
    pub profiles: BiomeProfiles,
    /// Biome classifier layout.
    pub classifier: ClassifierConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            base_scale: 0.004,
            base_amplitude: 30.0,
            base_vertical_offset: 15.0,
            sea_floor_depth: -120.0,
            amplitude_frequency: 0.00012,
            profiles: BiomeProfiles::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TerrainConfig {
    /// Default configuration with a specific seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Validate every nested section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("base_scale", self.base_scale),
            ("base_amplitude", self.base_amplitude),
            ("amplitude_frequency", self.amplitude_frequency),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        self.profiles.validate()?;
        self.classifier.validate()
    }
}
