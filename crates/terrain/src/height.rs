//! Height field evaluation.
//!
//! The sole source of truth for terrain elevation. Mesh construction,
//! entity placement, and AI seafloor-proximity queries all go through
//! [`HeightField::height_at`] so rendered geometry and gameplay logic can
//! never disagree about where the floor is.

use crate::biome::{BiomeClassifier, BiomeKind, BiomeWeights};
use crate::config::TerrainConfig;
use crate::error::ConfigError;
use crate::noise::NoiseField;
use crate::params::{BiomeBlender, TerrainParams};

/// Evaluates world-space terrain elevation at arbitrary positions.
///
/// Pure and side-effect free: callable for any `(x, z)` regardless of which
/// chunks are materialized, so wildlife far from loaded geometry can still
/// query the floor. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct HeightField {
    noise: NoiseField,
    blender: BiomeBlender,
    base_scale: f64,
    base_amplitude: f64,
    base_vertical_offset: f64,
    sea_floor_depth: f64,
}

impl HeightField {
    /// Build a height field from a validated configuration.
    pub fn new(cfg: &TerrainConfig) -> Result<Self, ConfigError> {
        let blender = BiomeBlender::new(cfg)?;
        Ok(Self {
            noise: NoiseField::new(cfg.seed),
            blender,
            base_scale: cfg.base_scale,
            base_amplitude: cfg.base_amplitude,
            base_vertical_offset: cfg.base_vertical_offset,
            sea_floor_depth: cfg.sea_floor_depth,
        })
    }

    /// Build a height field with default tuning and the given seed.
    pub fn with_seed(seed: u32) -> Self {
        // Defaults always validate.
        Self::new(&TerrainConfig::with_seed(seed)).expect("default terrain config is valid")
    }

    /// World-space Y of the terrain surface at `(x, z)`.
    ///
    /// More negative is deeper, consistent with the below-sea-level
    /// convention used everywhere in the game.
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        let params = self.blender.parameters_at(x, z);
        self.height_with_params(x, z, &params)
    }

    /// Height composition under already-blended parameters.
    ///
    /// Lets a chunk factory that samples a dense vertex grid reuse the
    /// parameter lookup when it also needs biome weights per vertex.
    pub fn height_with_params(&self, x: f64, z: f64, params: &TerrainParams) -> f64 {
        let freq = self.base_scale * params.noise_scale;
        let n = self
            .noise
            .octave_sample_2d(x * freq, z * freq, params.noise_octaves, params.noise_persistence);
        self.sea_floor_depth + n * self.base_amplitude * params.height_scale + params.height_offset
            - self.base_vertical_offset
    }

    /// Blended biome membership at `(x, z)`.
    pub fn biome_at(&self, x: f64, z: f64) -> BiomeWeights {
        self.blender.classify(x, z)
    }

    /// Kind with the largest membership at `(x, z)`.
    pub fn dominant_biome_at(&self, x: f64, z: f64) -> BiomeKind {
        self.biome_at(x, z).dominant()
    }

    /// Effective terrain parameters at `(x, z)`.
    pub fn parameters_at(&self, x: f64, z: f64) -> TerrainParams {
        self.blender.parameters_at(x, z)
    }

    /// The parameter blender behind this field.
    pub fn blender(&self) -> &BiomeBlender {
        &self.blender
    }

    /// The biome classifier behind this field.
    pub fn classifier(&self) -> &BiomeClassifier {
        self.blender.classifier()
    }

    /// Reference seafloor depth this field composes heights onto.
    pub fn sea_floor_depth(&self) -> f64 {
        self.sea_floor_depth
    }
}
