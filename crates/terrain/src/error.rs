//! Error types for terrain configuration.

use crate::biome::BiomeKind;
use thiserror::Error;

/// Invalid terrain configuration, reported at construction time.
///
/// Configuration problems fail fast when a field is built; query-time
/// operations (`height_at`, `classify`) never return errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Biome band widths must cover the unit interval.
    #[error("biome band widths sum to {total}, expected 1.0")]
    BandCoverage {
        /// Sum of the configured band widths.
        total: f64,
    },

    /// Every band needs a strictly positive width.
    #[error("biome band for {kind:?} has non-positive width {width}")]
    BandWidth {
        /// Band that failed validation.
        kind: BiomeKind,
        /// Offending width.
        width: f64,
    },

    /// Transition zones must not overlap three-way: `2w` must fit inside
    /// the narrowest band.
    #[error("transition half-width {half_width} too wide for narrowest band {min_band_width}")]
    TransitionTooWide {
        /// Configured transition half-width.
        half_width: f64,
        /// Width of the narrowest band.
        min_band_width: f64,
    },

    /// Octave counts below one are meaningless.
    #[error("{context}: octave count must be >= 1")]
    OctavesOutOfRange {
        /// Which profile or field carried the bad value.
        context: &'static str,
    },

    /// Persistence must stay inside the open unit interval.
    #[error("{context}: persistence {value} outside (0, 1)")]
    PersistenceOutOfRange {
        /// Which profile or field carried the bad value.
        context: &'static str,
        /// Offending persistence.
        value: f64,
    },

    /// A scale or frequency that must be strictly positive was not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the configuration field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// An amplitude range with min above max.
    #[error("{kind:?}: amplitude range ({min}, {max}) is inverted")]
    InvertedRange {
        /// Biome carrying the bad range.
        kind: BiomeKind,
        /// Range minimum.
        min: f64,
        /// Range maximum.
        max: f64,
    },
}
