//! Collaborator boundary for chunk content construction.

use crate::chunk::{ChunkBounds, ChunkCoord};

/// Builds the content of a chunk from its bounds.
///
/// Implementors sample the terrain height field and biome classifier per
/// vertex to produce renderable geometry and placed entities; the grid
/// manager neither knows nor cares what `Content` holds. Content owns its
/// resources and releases them on `Drop`, which the manager invokes exactly
/// once per chunk, on eviction or teardown.
///
/// A failed build is a transient condition: the manager logs it, leaves the
/// coordinate un-materialized, and retries on a later tick. Errors must not
/// poison the factory for subsequent coordinates.
pub trait ChunkFactory {
    /// Materialized chunk content (geometry, entities, physics handles).
    type Content;

    /// Build content covering `bounds`.
    fn build(&mut self, coord: ChunkCoord, bounds: ChunkBounds) -> anyhow::Result<Self::Content>;
}

/// Adapter turning a closure into a [`ChunkFactory`].
///
/// Keeps simple factories (tests, prototypes) free of boilerplate without a
/// blanket impl that would block other crates from implementing the trait
/// for their own callable types.
pub struct FnFactory<F>(pub F);

impl<C, F> ChunkFactory for FnFactory<F>
where
    F: FnMut(ChunkCoord, ChunkBounds) -> anyhow::Result<C>,
{
    type Content = C;

    fn build(&mut self, coord: ChunkCoord, bounds: ChunkBounds) -> anyhow::Result<C> {
        (self.0)(coord, bounds)
    }
}
