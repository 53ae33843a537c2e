//! Deterministic seafloor terrain generation.
//!
//! Provides the seeded noise fields, biome classification/blending, and the
//! height field evaluator that all terrain consumers (mesh building, AI
//! seafloor-proximity queries) share as a single source of truth.

mod biome;
mod config;
mod debug;
mod error;
mod height;
mod noise;
mod params;

pub use biome::*;
pub use config::*;
pub use debug::*;
pub use error::*;
pub use height::*;
pub use noise::*;
pub use params::*;
