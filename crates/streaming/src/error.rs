//! Error types for streaming configuration.

use thiserror::Error;

/// Invalid streaming configuration, reported when a manager is built.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A field that must be strictly positive was not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the configuration field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A field that must be non-negative was not.
    #[error("{name} must be non-negative, got {value}")]
    Negative {
        /// Name of the configuration field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The per-tick materialization budget cannot be zero.
    #[error("max_chunks_per_tick must be at least 1")]
    ZeroBudget,
}
