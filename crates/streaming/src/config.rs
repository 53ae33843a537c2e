//! Streaming configuration with fail-fast validation.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Predictive chunk loading along the viewpoint's velocity vector.
///
/// Masks pop-in during fast travel by extending the needed set ahead of the
/// viewpoint. The scaling here is tuning, not contract; hosts adjust it to
/// their movement speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictiveConfig {
    /// Speed (world units/second) below which no prediction happens.
    pub speed_threshold: f64,
    /// Extra lookahead chunks added per unit of speed above the threshold.
    pub lookahead_per_speed: f64,
    /// Cap on the predictive extension, in chunks.
    pub max_lookahead: i32,
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 30.0,
            lookahead_per_speed: 0.05,
            max_lookahead: 3,
        }
    }
}

/// Configuration for the chunk grid manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Edge length of one square chunk, world units.
    pub chunk_size: f64,
    /// Chebyshev radius (chunks) within which chunks are visible.
    pub render_distance: i32,
    /// Extra radius beyond `render_distance` kept materialized but hidden,
    /// trading memory for re-creation cost when the viewpoint oscillates.
    pub buffer_distance: i32,
    /// Extra margin beyond render+buffer before a chunk is evicted,
    /// preventing create/destroy thrash at the boundary.
    pub eviction_hysteresis: i32,
    /// Upper bound on factory invocations per tick (backpressure so a
    /// burst of needed chunks cannot stall a frame).
    pub max_chunks_per_tick: usize,
    /// Minimum interval between needed-set recomputations while the
    /// viewpoint stays in the same chunk; crossing into a new chunk forces
    /// an immediate recompute.
    pub min_update_interval: Duration,
    /// Base delay before retrying a failed chunk build; grows linearly
    /// with the attempt count.
    pub retry_backoff: Duration,
    /// Predictive loading tuning.
    pub predictive: PredictiveConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 600.0,
            render_distance: 3,
            buffer_distance: 1,
            eviction_hysteresis: 1,
            max_chunks_per_tick: 2,
            min_update_interval: Duration::from_millis(100),
            retry_backoff: Duration::from_millis(500),
            predictive: PredictiveConfig::default(),
        }
    }
}

impl StreamingConfig {
    /// Chebyshev radius of the needed set, before predictive extension.
    pub fn load_radius(&self) -> i32 {
        self.render_distance + self.buffer_distance
    }

    /// Chebyshev radius beyond which active chunks are torn down.
    pub fn eviction_radius(&self) -> i32 {
        self.load_radius() + self.eviction_hysteresis
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "chunk_size",
                value: self.chunk_size,
            });
        }
        if self.render_distance < 1 {
            return Err(ConfigError::NonPositive {
                name: "render_distance",
                value: self.render_distance as f64,
            });
        }
        for (name, value) in [
            ("buffer_distance", self.buffer_distance as f64),
            ("eviction_hysteresis", self.eviction_hysteresis as f64),
            ("max_lookahead", self.predictive.max_lookahead as f64),
            ("lookahead_per_speed", self.predictive.lookahead_per_speed),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        if self.predictive.speed_threshold <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "speed_threshold",
                value: self.predictive.speed_threshold,
            });
        }
        if self.max_chunks_per_tick == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        Ok(())
    }
}
