//! Biome classification for seafloor terrain.
//!
//! Maps world positions to blended biome memberships by partitioning a
//! low-frequency selector field into ordered bands with smooth transition
//! zones. A second, even lower-frequency field varies the regional biome
//! size so the world mixes sprawling and compact biomes.

use crate::config::ClassifierConfig;
use crate::error::ConfigError;
use crate::noise::{remap_unit, smoothstep, NoiseField};
use serde::{Deserialize, Serialize};

/// Octaves used by the biome selector field.
const SELECTOR_OCTAVES: u32 = 2;
/// Persistence used by the biome selector field.
const SELECTOR_PERSISTENCE: f64 = 0.5;

/// Seed salt for the biome selector field.
const SELECTOR_SALT: u32 = 1000;
/// Seed salt for the regional biome-size field.
const REGION_SALT: u32 = 2000;

/// Seafloor biome identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeKind {
    /// Gently undulating open sand plains.
    FlatSandy,
    /// Raised shelf terrain with moderate relief.
    ContinentalShelf,
    /// Deep, steep-walled canyon floor.
    Trench,
    /// Seamounts tall enough to breach the surface.
    Island,
}

impl BiomeKind {
    /// Number of biome kinds.
    pub const COUNT: usize = 4;

    /// All biome kinds (for iteration).
    pub const ALL: [BiomeKind; Self::COUNT] = [
        BiomeKind::FlatSandy,
        BiomeKind::ContinentalShelf,
        BiomeKind::Trench,
        BiomeKind::Island,
    ];

    /// Dense index for array-backed per-kind storage.
    pub fn index(self) -> usize {
        match self {
            BiomeKind::FlatSandy => 0,
            BiomeKind::ContinentalShelf => 1,
            BiomeKind::Trench => 2,
            BiomeKind::Island => 3,
        }
    }
}

/// Regional amplitude variation bounds for a biome kind.
///
/// A very low-frequency field is remapped into these ranges so that, for
/// example, not every trench across the world bottoms out at the same depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeRange {
    /// Multiplier bounds applied to `height_scale`.
    pub scale: (f64, f64),
    /// Multiplier bounds applied to `height_offset`.
    pub offset: (f64, f64),
}

/// Terrain-shaping constants for a single biome kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeProfile {
    /// Multiplier on the base noise amplitude.
    pub height_scale: f64,
    /// Constant elevation offset, world units (negative = deeper).
    pub height_offset: f64,
    /// Multiplier on the base sampling frequency.
    pub noise_scale: f64,
    /// Octave count for the height noise in this biome.
    pub noise_octaves: u32,
    /// Persistence for the height noise in this biome, in (0, 1).
    pub noise_persistence: f64,
    /// Debug/visualization color (R, G, B).
    pub display_color: [u8; 3],
    /// Optional regional amplitude variation.
    pub amplitude: Option<AmplitudeRange>,
}

impl BiomeProfile {
    /// Built-in profile for a biome kind.
    pub fn for_kind(kind: BiomeKind) -> Self {
        match kind {
            BiomeKind::FlatSandy => Self {
                height_scale: 0.5,
                height_offset: 0.0,
                noise_scale: 0.7,
                noise_octaves: 2,
                noise_persistence: 0.4,
                display_color: [214, 196, 138],
                amplitude: None,
            },
            BiomeKind::ContinentalShelf => Self {
                height_scale: 1.5,
                height_offset: 25.0,
                noise_scale: 1.0,
                noise_octaves: 3,
                noise_persistence: 0.5,
                display_color: [134, 160, 112],
                amplitude: None,
            },
            BiomeKind::Trench => Self {
                height_scale: 1.2,
                height_offset: -70.0,
                noise_scale: 1.6,
                noise_octaves: 4,
                noise_persistence: 0.55,
                display_color: [34, 48, 94],
                amplitude: Some(AmplitudeRange {
                    scale: (0.8, 1.6),
                    offset: (0.9, 1.3),
                }),
            },
            BiomeKind::Island => Self {
                height_scale: 3.0,
                height_offset: 110.0,
                noise_scale: 1.2,
                noise_octaves: 5,
                noise_persistence: 0.55,
                display_color: [88, 74, 52],
                amplitude: Some(AmplitudeRange {
                    scale: (0.7, 1.4),
                    offset: (0.9, 1.2),
                }),
            },
        }
    }

    fn validate(&self, kind: BiomeKind) -> Result<(), ConfigError> {
        if self.noise_octaves < 1 {
            return Err(ConfigError::OctavesOutOfRange {
                context: "biome profile",
            });
        }
        if self.noise_persistence <= 0.0 || self.noise_persistence >= 1.0 {
            return Err(ConfigError::PersistenceOutOfRange {
                context: "biome profile",
                value: self.noise_persistence,
            });
        }
        if self.noise_scale <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "noise_scale",
                value: self.noise_scale,
            });
        }
        if let Some(amp) = &self.amplitude {
            for (min, max) in [amp.scale, amp.offset] {
                if min > max {
                    return Err(ConfigError::InvertedRange { kind, min, max });
                }
            }
        }
        Ok(())
    }
}

/// Per-kind constants table, indexed by [`BiomeKind::index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeProfiles([BiomeProfile; BiomeKind::COUNT]);

impl BiomeProfiles {
    /// Profile for a kind.
    pub fn get(&self, kind: BiomeKind) -> &BiomeProfile {
        &self.0[kind.index()]
    }

    /// Mutable profile for a kind (test/tuning use).
    pub fn get_mut(&mut self, kind: BiomeKind) -> &mut BiomeProfile {
        &mut self.0[kind.index()]
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for kind in BiomeKind::ALL {
            self.get(kind).validate(kind)?;
        }
        Ok(())
    }
}

impl Default for BiomeProfiles {
    fn default() -> Self {
        Self([
            BiomeProfile::for_kind(BiomeKind::FlatSandy),
            BiomeProfile::for_kind(BiomeKind::ContinentalShelf),
            BiomeProfile::for_kind(BiomeKind::Trench),
            BiomeProfile::for_kind(BiomeKind::Island),
        ])
    }
}

/// Blended biome membership at a world position.
///
/// Weights are in `[0, 1]` and sum to 1 within floating tolerance; at most
/// two kinds are non-zero at any point (a position is either deep inside one
/// band or inside a single two-way transition zone).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeWeights {
    weights: [f64; BiomeKind::COUNT],
}

impl BiomeWeights {
    /// A single-kind weighting.
    pub fn single(kind: BiomeKind) -> Self {
        let mut weights = [0.0; BiomeKind::COUNT];
        weights[kind.index()] = 1.0;
        Self { weights }
    }

    /// A two-kind blend; `t` is the share of `b`.
    pub fn blend(a: BiomeKind, b: BiomeKind, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut weights = [0.0; BiomeKind::COUNT];
        weights[a.index()] = 1.0 - t;
        weights[b.index()] += t;
        Self { weights }
    }

    /// Weight of a kind.
    pub fn get(&self, kind: BiomeKind) -> f64 {
        self.weights[kind.index()]
    }

    /// Iterate `(kind, weight)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeKind, f64)> + '_ {
        BiomeKind::ALL.iter().map(|&k| (k, self.weights[k.index()]))
    }

    /// Sum of all weights (1.0 up to floating error).
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Kind with the largest weight (first declared wins ties).
    pub fn dominant(&self) -> BiomeKind {
        let mut best = BiomeKind::ALL[0];
        let mut best_weight = self.weights[best.index()];
        for &kind in &BiomeKind::ALL[1..] {
            let w = self.weights[kind.index()];
            if w > best_weight {
                best = kind;
                best_weight = w;
            }
        }
        best
    }

    /// Number of kinds with non-zero weight.
    pub fn active_kinds(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0.0).count()
    }
}

/// Classifies world positions into blended biome memberships.
///
/// Holds its own configuration and noise fields; multiple classifiers with
/// different seeds or band layouts coexist without interference.
#[derive(Debug, Clone)]
pub struct BiomeClassifier {
    selector: NoiseField,
    region: NoiseField,
    cfg: ClassifierConfig,
}

impl BiomeClassifier {
    /// Build a classifier from a world seed and validated configuration.
    pub fn new(seed: u32, cfg: ClassifierConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            selector: NoiseField::with_salt(seed, SELECTOR_SALT),
            region: NoiseField::with_salt(seed, REGION_SALT),
            cfg,
        })
    }

    /// Classifier configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Blended biome membership at world position `(x, z)`.
    pub fn classify(&self, x: f64, z: f64) -> BiomeWeights {
        self.weights_for_scalar(self.selector_scalar(x, z))
    }

    /// The underlying selector scalar in `[0, 1]` at `(x, z)`.
    ///
    /// Exposed so diagnostics and tests can relate positions to band
    /// boundaries.
    pub fn selector_scalar(&self, x: f64, z: f64) -> f64 {
        // Regional size factor: interpolates between the large-biome and
        // small-biome distribution frequencies. Non-uniform biome sizing is
        // a design feature, not an artifact.
        let r = self
            .region
            .sample_2d(x * self.cfg.region_frequency, z * self.cfg.region_frequency);
        let freq = remap_unit(
            r,
            self.cfg.large_biome_frequency,
            self.cfg.small_biome_frequency,
        );
        self.selector
            .octave_sample_2d(x * freq, z * freq, SELECTOR_OCTAVES, SELECTOR_PERSISTENCE)
    }

    /// Map a selector scalar in `[0, 1]` to band weights.
    ///
    /// Deep inside a band the containing kind gets weight 1; within the
    /// transition half-width of an interior boundary, the two adjacent kinds
    /// share weight via smoothstep. Outer edges (0 and 1) have no
    /// transition.
    pub fn weights_for_scalar(&self, n: f64) -> BiomeWeights {
        let n = n.clamp(0.0, 1.0);
        let w = self.cfg.transition_half_width;
        let bands = &self.cfg.bands;

        let mut boundary = 0.0;
        for i in 0..bands.len() - 1 {
            boundary += bands[i].width;
            if (n - boundary).abs() <= w {
                let t = smoothstep((n - (boundary - w)) / (2.0 * w));
                return BiomeWeights::blend(bands[i].kind, bands[i + 1].kind, t);
            }
            if n < boundary {
                return BiomeWeights::single(bands[i].kind);
            }
        }
        BiomeWeights::single(bands[bands.len() - 1].kind)
    }
}
