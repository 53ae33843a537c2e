//! Chunk coordinates and world-space bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chunk coordinate (X, Z) in chunk space.
///
/// A typed composite key with equality and hashing: no string-formatted
/// keys, no parsing. Implements `Ord` for deterministic iteration in
/// ordered collections (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Coordinate of the chunk containing the world position `(x, z)`.
    pub fn from_world(x: f64, z: f64, chunk_size: f64) -> Self {
        Self {
            x: (x / chunk_size).floor() as i32,
            z: (z / chunk_size).floor() as i32,
        }
    }

    /// World-space bounds of this chunk.
    pub fn bounds(self, chunk_size: f64) -> ChunkBounds {
        ChunkBounds {
            min_x: self.x as f64 * chunk_size,
            min_z: self.z as f64 * chunk_size,
            size: chunk_size,
        }
    }

    /// Chebyshev (king-move) distance to another coordinate.
    ///
    /// The metric used for every streaming decision: needed-set radius,
    /// queue priority, visibility, and eviction.
    pub fn chebyshev_distance(self, other: ChunkCoord) -> i32 {
        let dx = (self.x - other.x).abs();
        let dz = (self.z - other.z).abs();
        dx.max(dz)
    }

    /// This coordinate translated by `(dx, dz)`.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// World-space footprint of a chunk:
/// `[min_x, min_x + size) x [min_z, min_z + size)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    /// Minimum world X of the region.
    pub min_x: f64,
    /// Minimum world Z of the region.
    pub min_z: f64,
    /// Edge length of the square region.
    pub size: f64,
}

impl ChunkBounds {
    /// World-space center of the region.
    pub fn center(&self) -> (f64, f64) {
        (self.min_x + self.size * 0.5, self.min_z + self.size * 0.5)
    }

    /// Whether a world position falls inside the half-open region.
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x < self.min_x + self.size && z >= self.min_z && z < self.min_z + self.size
    }
}
