//! Chunked infinite-world streaming.
//!
//! Partitions the world into fixed-size square cells, queues creation of
//! cells needed around a moving viewpoint, evicts distant cells, and toggles
//! visibility by distance. What a materialized chunk contains (mesh,
//! obstacles, wildlife) is supplied by a [`ChunkFactory`] collaborator.

mod chunk;
mod config;
mod error;
mod factory;
mod manager;

pub use chunk::*;
pub use config::*;
pub use error::*;
pub use factory::*;
pub use manager::*;
