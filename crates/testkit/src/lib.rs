#![warn(missing_docs)]
//! Deterministic testing surfaces for the terrain and streaming crates.
//!
//! Provides a resource-counting chunk factory double (with scripted
//! failures), a JSONL event sink for worldtest artifacts, and a
//! fingerprint helper for cross-run height-field comparisons.

use abyss_streaming::{ChunkBounds, ChunkCoord, ChunkFactory};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Primary event record captured by worldtests.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Tick index when the event occurred.
    pub tick: u64,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Free-form payload.
    pub payload: &'a str,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

/// Shared build/release counters behind a counting factory.
#[derive(Debug, Default)]
pub struct BuildStats {
    built: AtomicUsize,
    released: AtomicUsize,
}

impl BuildStats {
    /// Number of successful builds so far.
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    /// Number of content drops so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Builds minus releases: content instances currently alive.
    pub fn live(&self) -> usize {
        self.built() - self.released()
    }
}

/// Content produced by [`CountingFactory`]; bumps the release counter
/// exactly once, when dropped.
#[derive(Debug)]
pub struct CountingContent {
    stats: Arc<BuildStats>,
    /// Coordinate this content was built for.
    pub coord: ChunkCoord,
}

impl Drop for CountingContent {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Chunk factory double that counts builds and releases, optionally
/// failing scripted coordinates a fixed number of times.
#[derive(Debug)]
pub struct CountingFactory {
    stats: Arc<BuildStats>,
    failing: HashSet<ChunkCoord>,
    failures_remaining: usize,
}

impl CountingFactory {
    /// A factory that always succeeds.
    pub fn new() -> Self {
        Self {
            stats: Arc::new(BuildStats::default()),
            failing: HashSet::new(),
            failures_remaining: 0,
        }
    }

    /// A factory whose builds for `coords` fail `failures` times in total
    /// before behaving normally.
    pub fn with_failures(coords: impl IntoIterator<Item = ChunkCoord>, failures: usize) -> Self {
        Self {
            stats: Arc::new(BuildStats::default()),
            failing: coords.into_iter().collect(),
            failures_remaining: failures,
        }
    }

    /// Handle to the shared counters (clone before moving the factory
    /// into a manager).
    pub fn stats(&self) -> Arc<BuildStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for CountingFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkFactory for CountingFactory {
    type Content = CountingContent;

    fn build(&mut self, coord: ChunkCoord, _bounds: ChunkBounds) -> Result<CountingContent> {
        if self.failures_remaining > 0 && self.failing.contains(&coord) {
            self.failures_remaining -= 1;
            return Err(anyhow!("scripted build failure at {coord}"));
        }
        self.stats.built.fetch_add(1, Ordering::SeqCst);
        Ok(CountingContent {
            stats: Arc::clone(&self.stats),
            coord,
        })
    }
}

/// Deterministic u64 digest of a height function sampled over a square
/// grid, for cross-run and cross-instance comparisons.
///
/// Takes the sampler as a closure so any height source can be
/// fingerprinted without coupling this crate to it.
pub fn height_fingerprint(
    sample: impl Fn(f64, f64) -> f64,
    min_x: f64,
    min_z: f64,
    extent: f64,
    resolution: usize,
) -> u64 {
    // FNV-1a over the IEEE bit patterns; bit-exact inputs give bit-exact
    // digests.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let steps = resolution.max(1);
    for iz in 0..steps {
        let z = min_z + extent * iz as f64 / steps as f64;
        for ix in 0..steps {
            let x = min_x + extent * ix as f64 / steps as f64;
            let bits = sample(x, z).to_bits();
            for byte in bits.to_le_bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
        }
    }
    hash
}
