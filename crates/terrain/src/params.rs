//! Biome parameter blending.
//!
//! Combines per-biome terrain-shaping constants into one effective
//! parameter set per position, weighted by classifier output, with an
//! independent coarse amplitude-variation field layered on top so trenches
//! and islands differ in depth/height across the world.

use crate::biome::{BiomeClassifier, BiomeProfiles, BiomeWeights};
use crate::config::TerrainConfig;
use crate::error::ConfigError;
use crate::noise::{remap_unit, NoiseField};
use tracing::warn;

/// Seed salt for the amplitude-variation field.
const AMPLITUDE_SALT: u32 = 3000;

/// Effective terrain-shaping parameters at one world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    /// Blended multiplier on the base noise amplitude.
    pub height_scale: f64,
    /// Blended elevation offset, world units.
    pub height_offset: f64,
    /// Blended multiplier on the base sampling frequency.
    pub noise_scale: f64,
    /// Blended octave count, rounded to the nearest integer >= 1.
    pub noise_octaves: u32,
    /// Blended persistence.
    pub noise_persistence: f64,
}

/// Blends biome profiles into per-position [`TerrainParams`].
#[derive(Debug, Clone)]
pub struct BiomeBlender {
    classifier: BiomeClassifier,
    amplitude: NoiseField,
    profiles: BiomeProfiles,
    amplitude_frequency: f64,
}

impl BiomeBlender {
    /// Build a blender from a validated configuration.
    pub fn new(cfg: &TerrainConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            classifier: BiomeClassifier::new(cfg.seed, cfg.classifier.clone())?,
            amplitude: NoiseField::with_salt(cfg.seed, AMPLITUDE_SALT),
            profiles: cfg.profiles.clone(),
            amplitude_frequency: cfg.amplitude_frequency,
        })
    }

    /// The classifier this blender weights with.
    pub fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Profile table in effect.
    pub fn profiles(&self) -> &BiomeProfiles {
        &self.profiles
    }

    /// Blended biome membership at `(x, z)`.
    pub fn classify(&self, x: f64, z: f64) -> BiomeWeights {
        self.classifier.classify(x, z)
    }

    /// Effective terrain parameters at `(x, z)`.
    ///
    /// Pure function of position and configuration; recomputed on demand,
    /// never cached against chunk state.
    pub fn parameters_at(&self, x: f64, z: f64) -> TerrainParams {
        let weights = self.classify(x, z);
        self.blend(x, z, &weights)
    }

    /// Blend profiles under already-computed weights.
    pub fn blend(&self, x: f64, z: f64, weights: &BiomeWeights) -> TerrainParams {
        // One coarse sample drives every kind's amplitude remap at this
        // position; each kind maps it into its own configured range.
        let amp_t = self.amplitude.sample_2d(
            x * self.amplitude_frequency,
            z * self.amplitude_frequency,
        );

        let mut height_scale = 0.0;
        let mut height_offset = 0.0;
        let mut noise_scale = 0.0;
        let mut octaves = 0.0;
        let mut persistence = 0.0;
        let mut total = 0.0;

        for (kind, weight) in weights.iter() {
            if weight <= 0.0 {
                continue;
            }
            let profile = self.profiles.get(kind);
            let (scale_mul, offset_mul) = match &profile.amplitude {
                Some(range) => (
                    remap_unit(amp_t, range.scale.0, range.scale.1),
                    remap_unit(amp_t, range.offset.0, range.offset.1),
                ),
                None => (1.0, 1.0),
            };

            height_scale += weight * profile.height_scale * scale_mul;
            height_offset += weight * profile.height_offset * offset_mul;
            noise_scale += weight * profile.noise_scale;
            octaves += weight * profile.noise_octaves as f64;
            persistence += weight * profile.noise_persistence;
            total += weight;
        }

        // Weights sum to 1 by construction; renormalize if a logic bug ever
        // breaks that instead of corrupting the frame.
        if (total - 1.0).abs() > 1e-6 {
            debug_assert!(false, "biome weights sum to {total}, expected 1.0");
            warn!(total, "biome weights off unity, renormalizing");
        }
        let inv = 1.0 / total;

        TerrainParams {
            height_scale: height_scale * inv,
            height_offset: height_offset * inv,
            noise_scale: noise_scale * inv,
            noise_octaves: ((octaves * inv).round() as u32).max(1),
            noise_persistence: persistence * inv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeKind;

    fn blender(seed: u32) -> BiomeBlender {
        BiomeBlender::new(&TerrainConfig::with_seed(seed)).expect("valid default config")
    }

    #[test]
    fn test_params_determinism() {
        let b1 = blender(12345);
        let b2 = blender(12345);

        for x in 0..10 {
            for z in 0..10 {
                let p = (x as f64 * 311.0, z as f64 * 173.0);
                assert_eq!(
                    b1.parameters_at(p.0, p.1),
                    b2.parameters_at(p.0, p.1),
                    "Params not deterministic at {:?}",
                    p
                );
            }
        }
    }

    #[test]
    fn test_params_stay_within_profile_hull() {
        // Without amplitude variation, every blended parameter is a convex
        // combination of the per-kind constants.
        let mut cfg = TerrainConfig::with_seed(9);
        for kind in BiomeKind::ALL {
            cfg.profiles.get_mut(kind).amplitude = None;
        }
        let b = BiomeBlender::new(&cfg).expect("valid config");

        let mut min_scale = f64::INFINITY;
        let mut max_scale = f64::NEG_INFINITY;
        for kind in BiomeKind::ALL {
            let p = cfg.profiles.get(kind);
            min_scale = min_scale.min(p.height_scale);
            max_scale = max_scale.max(p.height_scale);
        }

        for x in 0..40 {
            for z in 0..40 {
                let params = b.parameters_at(x as f64 * 151.0, z as f64 * 167.0);
                assert!(
                    params.height_scale >= min_scale - 1e-9
                        && params.height_scale <= max_scale + 1e-9,
                    "height_scale {} outside profile hull",
                    params.height_scale
                );
                assert!(params.noise_octaves >= 1);
                assert!(params.noise_persistence > 0.0 && params.noise_persistence < 1.0);
            }
        }
    }

    #[test]
    fn test_single_kind_without_amplitude_matches_profile() {
        let b = blender(4);
        let weights = BiomeWeights::single(BiomeKind::FlatSandy);
        let params = b.blend(0.0, 0.0, &weights);
        let profile = b.profiles().get(BiomeKind::FlatSandy);

        // FlatSandy carries no amplitude range, so the blend is exact.
        assert_eq!(params.height_scale, profile.height_scale);
        assert_eq!(params.height_offset, profile.height_offset);
        assert_eq!(params.noise_octaves, profile.noise_octaves);
    }

    #[test]
    fn test_amplitude_variation_varies_regionally() {
        let b = blender(21);
        let weights = BiomeWeights::single(BiomeKind::Trench);

        // Far-apart positions should see different amplitude multipliers.
        let near = b.blend(0.0, 0.0, &weights);
        let mut varied = false;
        for i in 1..40 {
            let far = b.blend(i as f64 * 5_000.0, i as f64 * -7_000.0, &weights);
            if (far.height_offset - near.height_offset).abs() > 1e-6 {
                varied = true;
                break;
            }
        }
        assert!(varied, "Amplitude variation should differ across regions");
    }

    #[test]
    fn test_amplitude_stays_within_configured_range() {
        let b = blender(33);
        let weights = BiomeWeights::single(BiomeKind::Trench);
        let profile = b.profiles().get(BiomeKind::Trench).clone();
        let range = profile.amplitude.expect("trench has amplitude range");

        for x in 0..60 {
            let params = b.blend(x as f64 * 2_345.0, x as f64 * -987.0, &weights);
            let scale_mul = params.height_scale / profile.height_scale;
            // Offset is negative for the trench, dividing flips nothing: the
            // multiplier itself is positive.
            let offset_mul = params.height_offset / profile.height_offset;
            assert!(
                scale_mul >= range.scale.0 - 1e-9 && scale_mul <= range.scale.1 + 1e-9,
                "scale multiplier {} outside {:?}",
                scale_mul,
                range.scale
            );
            assert!(
                offset_mul >= range.offset.0 - 1e-9 && offset_mul <= range.offset.1 + 1e-9,
                "offset multiplier {} outside {:?}",
                offset_mul,
                range.offset
            );
        }
    }

    #[test]
    fn test_octaves_round_to_at_least_one() {
        let mut cfg = TerrainConfig::with_seed(2);
        for kind in BiomeKind::ALL {
            cfg.profiles.get_mut(kind).noise_octaves = 1;
        }
        let b = BiomeBlender::new(&cfg).expect("valid config");
        let params = b.parameters_at(123.0, 456.0);
        assert_eq!(params.noise_octaves, 1);
    }
}
