//! Chunk grid manager: streaming, eviction, and visibility around a
//! moving viewpoint.
//!
//! Single-threaded and frame-driven: the host calls [`ChunkGridManager::tick`]
//! once per frame with the viewpoint position and the current monotonic
//! time. The per-tick materialization budget stands in for concurrency — a
//! burst of needed chunks is spread across frames instead of stalling one.

use crate::chunk::ChunkCoord;
use crate::config::StreamingConfig;
use crate::error::ConfigError;
use crate::factory::ChunkFactory;
use glam::{DVec2, DVec3};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Retries for a failed build are capped at this attempt count for backoff
/// scaling; the coordinate itself stays eligible forever.
const MAX_BACKOFF_STEPS: u32 = 5;

/// A materialized chunk entry.
struct ActiveChunk<C> {
    content: C,
    visible: bool,
}

/// Pending retry state for a coordinate whose build failed.
struct RetryState {
    attempts: u32,
    next_attempt: Duration,
}

/// Owns the active-chunk map and creation queue for an infinite chunked
/// world.
///
/// Invariant (checked in debug builds after every tick): a coordinate is in
/// the active map, or in the creation queue, or in neither — never both.
pub struct ChunkGridManager<F: ChunkFactory> {
    cfg: StreamingConfig,
    factory: F,
    active: HashMap<ChunkCoord, ActiveChunk<F::Content>>,
    queue: VecDeque<ChunkCoord>,
    queued: HashSet<ChunkCoord>,
    retry: HashMap<ChunkCoord, RetryState>,
    center: Option<ChunkCoord>,
    last_recompute: Option<Duration>,
    force_recompute: bool,
}

impl<F: ChunkFactory> ChunkGridManager<F> {
    /// Build a manager from a validated configuration and a content
    /// factory.
    pub fn new(cfg: StreamingConfig, factory: F) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            factory,
            active: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            retry: HashMap::new(),
            center: None,
            last_recompute: None,
            force_recompute: false,
        })
    }

    /// Configuration in effect.
    pub fn config(&self) -> &StreamingConfig {
        &self.cfg
    }

    /// The content factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Advance streaming by one frame.
    ///
    /// Recomputes the needed set when the viewpoint enters a new chunk (or
    /// the throttle interval elapses, or a refresh was forced), then
    /// materializes up to `max_chunks_per_tick` queued chunks. `now` is
    /// host-supplied monotonic time; it only ever moves forward.
    #[instrument(skip_all, fields(viewpoint = ?viewpoint))]
    pub fn tick(&mut self, viewpoint: DVec3, velocity: Option<DVec2>, now: Duration) {
        let center = ChunkCoord::from_world(viewpoint.x, viewpoint.z, self.cfg.chunk_size);

        let center_changed = self.center != Some(center);
        let throttle_elapsed = match self.last_recompute {
            Some(last) => now.saturating_sub(last) >= self.cfg.min_update_interval,
            None => true,
        };

        if center_changed || throttle_elapsed || self.force_recompute {
            self.center = Some(center);
            self.last_recompute = Some(now);
            self.force_recompute = false;
            self.recompute(center, velocity);
        }

        self.materialize(now);

        debug_assert!(self.invariants_hold(), "active/queue sets overlap");
    }

    /// Request a full needed-set recompute on the next tick regardless of
    /// throttling.
    pub fn force_refresh(&mut self) {
        self.force_recompute = true;
    }

    /// Number of materialized chunks.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of coordinates waiting in the creation queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether a coordinate is materialized.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// Whether a coordinate is waiting in the creation queue.
    pub fn is_queued(&self, coord: ChunkCoord) -> bool {
        self.queued.contains(&coord)
    }

    /// Content of a materialized chunk.
    pub fn get(&self, coord: ChunkCoord) -> Option<&F::Content> {
        self.active.get(&coord).map(|entry| &entry.content)
    }

    /// Iterate `(coord, content, visible)` over all materialized chunks.
    ///
    /// Iteration order is unspecified; collect and sort by coordinate when
    /// determinism matters.
    pub fn chunks(&self) -> impl Iterator<Item = (ChunkCoord, &F::Content, bool)> {
        self.active
            .iter()
            .map(|(&coord, entry)| (coord, &entry.content, entry.visible))
    }

    /// Number of materialized chunks currently marked visible.
    pub fn visible_count(&self) -> usize {
        self.active.values().filter(|entry| entry.visible).count()
    }

    /// Tear down every chunk and clear the queue, releasing all content.
    pub fn clear(&mut self) {
        debug!(count = self.active.len(), "clearing chunk grid");
        self.active.clear();
        self.queue.clear();
        self.queued.clear();
        self.retry.clear();
        self.center = None;
        self.last_recompute = None;
    }

    /// Recompute the needed set, queue membership, eviction, and
    /// visibility around `center`.
    fn recompute(&mut self, center: ChunkCoord, velocity: Option<DVec2>) {
        let needed = self.needed_set(center, velocity);

        // Queued coords that left the needed set are stale: drop them
        // before they waste factory budget.
        let queued = &mut self.queued;
        self.queue.retain(|coord| {
            let keep = needed.contains(coord);
            if !keep {
                queued.remove(coord);
            }
            keep
        });
        self.retry.retain(|coord, _| needed.contains(coord));

        // Queue anything needed that is neither materialized nor pending.
        for &coord in &needed {
            if !self.active.contains_key(&coord) && !self.queued.contains(&coord) {
                self.queue.push_back(coord);
                self.queued.insert(coord);
            }
        }

        // Nearest chunks first; coordinate order breaks ties so identical
        // inputs replay identically.
        self.queue
            .make_contiguous()
            .sort_by_key(|&coord| (center.chebyshev_distance(coord), coord));

        // Eviction with hysteresis: beyond the margin and not needed.
        let eviction_radius = self.cfg.eviction_radius();
        let doomed: Vec<ChunkCoord> = self
            .active
            .keys()
            .copied()
            .filter(|&coord| {
                center.chebyshev_distance(coord) > eviction_radius && !needed.contains(&coord)
            })
            .collect();
        for coord in doomed {
            // Dropping the entry releases the content's resources.
            self.active.remove(&coord);
            debug!(%coord, "evicted chunk");
        }

        // Within render distance: visible. Within buffer: retained but
        // hidden.
        for (&coord, entry) in self.active.iter_mut() {
            entry.visible = center.chebyshev_distance(coord) <= self.cfg.render_distance;
        }
    }

    /// All coordinates that should be materialized around `center`,
    /// including the predictive extension along the travel direction.
    fn needed_set(&self, center: ChunkCoord, velocity: Option<DVec2>) -> HashSet<ChunkCoord> {
        let radius = self.cfg.load_radius();
        let mut needed = HashSet::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                needed.insert(center.offset(dx, dz));
            }
        }

        if let Some(v) = velocity {
            let speed = v.length();
            let predictive = &self.cfg.predictive;
            if speed > predictive.speed_threshold {
                let dir = v / speed;
                let lookahead = ((speed * predictive.lookahead_per_speed) as i32)
                    .min(predictive.max_lookahead);
                for step in 1..=lookahead {
                    let reach = (radius + step) as f64;
                    let ahead = ChunkCoord::new(
                        center.x + (dir.x * reach).round() as i32,
                        center.z + (dir.y * reach).round() as i32,
                    );
                    // A small pad around the projected cell covers slightly
                    // curved trajectories.
                    for dx in -1..=1 {
                        for dz in -1..=1 {
                            needed.insert(ahead.offset(dx, dz));
                        }
                    }
                }
            }
        }

        needed
    }

    /// Dequeue and build up to `max_chunks_per_tick` chunks. Each factory
    /// invocation counts against the budget whether or not it succeeds;
    /// coordinates still in backoff are requeued without consuming budget.
    fn materialize(&mut self, now: Duration) {
        let Some(center) = self.center else { return };

        let mut budget = self.cfg.max_chunks_per_tick;
        let mut deferred = Vec::new();

        while budget > 0 {
            let Some(coord) = self.queue.pop_front() else { break };
            self.queued.remove(&coord);

            if let Some(retry) = self.retry.get(&coord) {
                if now < retry.next_attempt {
                    deferred.push(coord);
                    continue;
                }
            }

            budget -= 1;
            let bounds = coord.bounds(self.cfg.chunk_size);
            match self.factory.build(coord, bounds) {
                Ok(content) => {
                    let visible =
                        center.chebyshev_distance(coord) <= self.cfg.render_distance;
                    self.retry.remove(&coord);
                    self.active.insert(coord, ActiveChunk { content, visible });
                    debug!(%coord, visible, "materialized chunk");
                }
                Err(err) => {
                    // Transient failure: leave the coordinate absent from
                    // the active map so a later recompute re-queues it, and
                    // push the next attempt out by a growing delay.
                    let attempts = self
                        .retry
                        .get(&coord)
                        .map(|r| r.attempts)
                        .unwrap_or(0)
                        .saturating_add(1);
                    let steps = attempts.min(MAX_BACKOFF_STEPS);
                    self.retry.insert(
                        coord,
                        RetryState {
                            attempts,
                            next_attempt: now + self.cfg.retry_backoff * steps,
                        },
                    );
                    warn!(%coord, attempts, error = %err, "chunk build failed, backing off");
                }
            }
        }

        for coord in deferred {
            self.queue.push_back(coord);
            self.queued.insert(coord);
        }
    }

    fn invariants_hold(&self) -> bool {
        self.queue.len() == self.queued.len()
            && self.queue.iter().all(|coord| self.queued.contains(coord))
            && self.queued.iter().all(|coord| !self.active.contains_key(coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Factory yielding the coordinate itself as content.
    fn echo_factory() -> impl ChunkFactory<Content = ChunkCoord> {
        crate::FnFactory(|coord: ChunkCoord, _bounds: crate::ChunkBounds| {
            anyhow::Ok(coord)
        })
    }

    fn manager_with_budget(
        budget: usize,
    ) -> ChunkGridManager<impl ChunkFactory<Content = ChunkCoord>> {
        let cfg = StreamingConfig {
            max_chunks_per_tick: budget,
            ..Default::default()
        };
        ChunkGridManager::new(cfg, echo_factory()).expect("valid config")
    }

    fn drain(mgr: &mut ChunkGridManager<impl ChunkFactory<Content = ChunkCoord>>, ticks: usize) {
        for i in 0..ticks {
            mgr.tick(
                DVec3::ZERO,
                None,
                Duration::from_millis(200 * (i as u64 + 1)),
            );
            if mgr.queue_len() == 0 {
                break;
            }
        }
    }

    #[test]
    fn test_first_tick_queues_full_needed_set() {
        let mut mgr = manager_with_budget(1);
        mgr.tick(DVec3::ZERO, None, Duration::ZERO);

        let radius = mgr.config().load_radius();
        let expected = (2 * radius as usize + 1).pow(2);
        assert_eq!(mgr.active_len() + mgr.queue_len(), expected);
        // Budget bounds the first tick's materialization.
        assert_eq!(mgr.active_len(), 1);
    }

    #[test]
    fn test_budget_bounds_materialization_per_tick() {
        let mut mgr = manager_with_budget(3);

        let mut previous = 0;
        for i in 0..40 {
            mgr.tick(DVec3::ZERO, None, Duration::from_millis(200 * i));
            let grown = mgr.active_len() - previous;
            assert!(grown <= 3, "materialized {grown} chunks in one tick");
            previous = mgr.active_len();
        }
    }

    #[test]
    fn test_steady_state_covers_needed_set() {
        let mut mgr = manager_with_budget(64);
        drain(&mut mgr, 10);

        let radius = mgr.config().load_radius();
        assert_eq!(mgr.active_len(), (2 * radius as usize + 1).pow(2));
        assert_eq!(mgr.queue_len(), 0);

        // Every chunk within render distance is visible; buffer chunks are
        // retained but hidden.
        let render = mgr.config().render_distance;
        for (coord, _, visible) in mgr.chunks() {
            let dist = ChunkCoord::new(0, 0).chebyshev_distance(coord);
            assert_eq!(visible, dist <= render, "visibility wrong at {coord}");
        }
        assert_eq!(mgr.visible_count(), (2 * render as usize + 1).pow(2));
    }

    #[test]
    fn test_queue_prioritizes_near_chunks() {
        let mut mgr = manager_with_budget(1);
        // One build per tick: the first materialized chunk must be the
        // viewpoint's own cell.
        mgr.tick(DVec3::ZERO, None, Duration::ZERO);
        assert!(mgr.contains(ChunkCoord::new(0, 0)));

        // The next few are all adjacent cells.
        mgr.tick(DVec3::ZERO, None, Duration::from_millis(200));
        let farthest = mgr
            .chunks()
            .map(|(c, _, _)| ChunkCoord::new(0, 0).chebyshev_distance(c))
            .max()
            .unwrap();
        assert!(farthest <= 1);
    }

    #[test]
    fn test_throttle_skips_recompute_but_not_materialization() {
        let mut mgr = manager_with_budget(1);
        mgr.tick(DVec3::ZERO, None, Duration::ZERO);
        let after_first = mgr.active_len();

        // Well inside the throttle window, same chunk: no recompute, but
        // the queue keeps draining.
        mgr.tick(DVec3::new(1.0, 0.0, 1.0), None, Duration::from_millis(10));
        assert_eq!(mgr.active_len(), after_first + 1);
    }

    #[test]
    fn test_crossing_chunk_boundary_forces_recompute() {
        let mut mgr = manager_with_budget(256);
        mgr.tick(DVec3::ZERO, None, Duration::ZERO);

        // Move one chunk over within the throttle window; the needed set
        // must still shift immediately.
        let chunk_size = mgr.config().chunk_size;
        mgr.tick(
            DVec3::new(chunk_size * 1.5, 0.0, 0.0),
            None,
            Duration::from_millis(1),
        );
        let radius = mgr.config().load_radius();
        assert!(mgr.contains(ChunkCoord::new(1 + radius, 0)));
    }

    #[test]
    fn test_eviction_beyond_hysteresis() {
        let mut mgr = manager_with_budget(256);
        drain(&mut mgr, 4);
        assert!(mgr.contains(ChunkCoord::new(-4, -4)));

        // Jump far away: everything around the origin exceeds the eviction
        // radius and must be torn down.
        let chunk_size = mgr.config().chunk_size;
        mgr.tick(
            DVec3::new(chunk_size * 20.0, 0.0, 0.0),
            None,
            Duration::from_secs(10),
        );
        assert!(!mgr.contains(ChunkCoord::new(-4, -4)));
        assert!(!mgr.contains(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_hysteresis_retains_boundary_chunks() {
        let mut mgr = manager_with_budget(256);
        drain(&mut mgr, 4);

        // One chunk of movement: chunks now at distance load_radius + 1
        // are outside the needed set but inside the eviction margin, so
        // they stay materialized (hidden).
        let chunk_size = mgr.config().chunk_size;
        mgr.tick(
            DVec3::new(chunk_size * 1.5, 0.0, 0.0),
            None,
            Duration::from_secs(1),
        );
        let trailing = ChunkCoord::new(-4, 0);
        assert_eq!(
            ChunkCoord::new(1, 0).chebyshev_distance(trailing),
            mgr.config().load_radius() + 1
        );
        assert!(mgr.contains(trailing), "hysteresis should retain the chunk");
    }

    #[test]
    fn test_failed_build_is_skipped_and_retried() {
        let mut calls = 0u32;
        let factory = crate::FnFactory(move |coord: ChunkCoord, _bounds: crate::ChunkBounds| {
            calls += 1;
            if coord == ChunkCoord::new(0, 0) && calls <= 2 {
                Err(anyhow!("allocation failed"))
            } else {
                Ok(coord)
            }
        });
        let cfg = StreamingConfig {
            max_chunks_per_tick: 1,
            retry_backoff: Duration::from_millis(100),
            ..Default::default()
        };
        let mut mgr = ChunkGridManager::new(cfg, factory).expect("valid config");

        // First attempt fails; the tick completes and the coordinate is
        // left un-materialized.
        mgr.tick(DVec3::ZERO, None, Duration::ZERO);
        assert!(!mgr.contains(ChunkCoord::new(0, 0)));

        // Later ticks re-queue and eventually rebuild it.
        for i in 1..30 {
            mgr.tick(DVec3::ZERO, None, Duration::from_millis(200 * i));
        }
        assert!(mgr.contains(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_predictive_loading_extends_along_velocity() {
        let mut mgr = manager_with_budget(512);
        let velocity = DVec2::new(200.0, 0.0); // fast, +X
        mgr.tick(DVec3::ZERO, Some(velocity), Duration::ZERO);

        let radius = mgr.config().load_radius();
        let ahead = ChunkCoord::new(radius + 1, 0);
        assert!(
            mgr.contains(ahead) || mgr.is_queued(ahead),
            "predicted chunk {ahead} missing"
        );
        // Nothing extends behind the viewpoint.
        let behind = ChunkCoord::new(-(radius + 1), 0);
        assert!(!mgr.contains(behind) && !mgr.is_queued(behind));
    }

    #[test]
    fn test_slow_movement_skips_prediction() {
        let mut mgr = manager_with_budget(512);
        mgr.tick(DVec3::ZERO, Some(DVec2::new(1.0, 0.0)), Duration::ZERO);

        let radius = mgr.config().load_radius();
        let expected = (2 * radius as usize + 1).pow(2);
        assert_eq!(mgr.active_len() + mgr.queue_len(), expected);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut mgr = manager_with_budget(64);
        drain(&mut mgr, 10);
        assert!(mgr.active_len() > 0);

        mgr.clear();
        assert_eq!(mgr.active_len(), 0);
        assert_eq!(mgr.queue_len(), 0);
    }

    #[test]
    fn test_no_coord_in_both_active_and_queue() {
        let mut mgr = manager_with_budget(2);
        for i in 0..30 {
            let t = Duration::from_millis(150 * i);
            let pos = DVec3::new(i as f64 * 400.0, 0.0, i as f64 * 250.0);
            mgr.tick(pos, None, t);

            for (coord, _, _) in mgr.chunks() {
                assert!(!mgr.is_queued(coord), "{coord} active and queued");
            }
        }
    }
}
