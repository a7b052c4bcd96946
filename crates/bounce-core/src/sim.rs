// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulation driver: owns the bodies, the contact latch, and the worker pool.
//!
//! A tick is two barrier-separated phases:
//! 1. integration over static per-worker body ranges;
//! 2. pairwise contacts over the shared pair cursor, either canonical
//!    (detect, then body-disjoint resolution rounds) or eager (single pass).
//!
//! `step` takes `&mut self`, so exactly one thread drives ticks and nothing
//! can observe the bodies while a tick is in flight.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::body::{Body, BodyId, BodyInit, Bounds};
use crate::config::{ConfigError, ContactOrdering, Placement, SimConfig};
use crate::contact::PairKey;
use crate::error::SimError;
use crate::math::Vec2;
use crate::par::exec::{
    detect_job, eager_job, integrate_job, resolve_round_job, schedule_rounds, World,
};
use crate::par::{pair_count, partition_ranges, PairRange, WorkerPool, WorkerState};
use crate::placement;
use crate::store::BodyStore;

/// Rounds this small are resolved on the driving thread instead of waking the pool.
const INLINE_ROUND: usize = 8;

/// Summary of one completed tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick counter after this tick (the first tick reports `1`).
    pub tick: u64,
    /// Pairs resolved this tick.
    pub new_contacts: usize,
    /// Pairs latched after this tick, i.e. currently overlapping.
    pub active_contacts: usize,
    /// Body-disjoint resolution rounds (canonical ordering only; otherwise `0`).
    pub rounds: usize,
}

/// A running simulation.
#[derive(Debug)]
pub struct Simulation {
    world: Arc<World>,
    pool: WorkerPool,
    ranges: Arc<[Range<usize>]>,
    frozen: Arc<Vec<Body>>,
    found: Arc<[Mutex<Vec<PairKey>>]>,
    ordering: ContactOrdering,
    claim_batch: usize,
    tick: u64,
}

impl Simulation {
    /// Builds `body_count` randomly placed bodies inside `bounds` with default
    /// settings for everything else.
    ///
    /// # Errors
    /// See [`Simulation::new`].
    pub fn initialize(body_count: usize, bounds: Bounds, seed: u64) -> Result<Self, SimError> {
        Self::new(&SimConfig::new(body_count, bounds, seed))
    }

    /// Validates `config`, lays out the bodies, and starts the worker pool.
    ///
    /// # Errors
    /// Returns [`SimError::Config`] for an invalid config (no thread is started)
    /// or [`SimError::Spawn`] if a worker cannot be started.
    #[instrument(skip_all, fields(bodies = config.body_count, workers = config.workers))]
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        let bodies = placement::layout(config)?;
        Self::build(config, bodies)
    }

    /// Starts a simulation from explicit bodies; ids follow list order.
    ///
    /// `body_count` and `placement` in `config` are ignored.
    ///
    /// # Errors
    /// As [`Simulation::new`], plus [`ConfigError::InvalidBody`] for a body
    /// with a non-positive radius, a radius too large for the bounds, or
    /// non-finite state.
    pub fn with_bodies(config: &SimConfig, bodies: Vec<BodyInit>) -> Result<Self, SimError> {
        let config =
            SimConfig { body_count: bodies.len(), placement: Placement::Random, ..config.clone() };
        config.validate()?;
        for (index, b) in bodies.iter().enumerate() {
            if !(b.radius.is_finite() && b.radius > 0.0) {
                let reason = "radius must be finite and positive";
                return Err(ConfigError::InvalidBody { index, reason }.into());
            }
            if !config.bounds.fits(b.radius) {
                let reason = "radius does not fit inside the bounds";
                return Err(ConfigError::InvalidBody { index, reason }.into());
            }
            if !(b.position.is_finite() && b.velocity.is_finite()) {
                let reason = "position and velocity must be finite";
                return Err(ConfigError::InvalidBody { index, reason }.into());
            }
        }
        Self::build(&config, bodies)
    }

    fn build(config: &SimConfig, bodies: Vec<BodyInit>) -> Result<Self, SimError> {
        let n = bodies.len();
        let records = bodies
            .into_iter()
            .zip(0u32..)
            .map(|(b, id)| b.with_id(BodyId(id)))
            .collect();
        let world = Arc::new(World::new(BodyStore::new(config.bounds, records)));
        let pool = WorkerPool::new(config.workers)?;
        info!(
            bodies = n,
            workers = config.workers,
            ordering = ?config.ordering,
            "simulation initialized"
        );
        Ok(Self {
            world,
            pool,
            ranges: partition_ranges(n, config.workers).into(),
            frozen: Arc::new(Vec::with_capacity(n)),
            found: (0..config.workers).map(|_| Mutex::new(Vec::new())).collect(),
            ordering: config.ordering,
            claim_batch: config.claim_batch,
            tick: 0,
        })
    }

    /// Advances one tick on the worker pool.
    ///
    /// # Panics
    /// Re-raises any panic from a worker (an invariant violation).
    #[instrument(level = "debug", skip_all, fields(tick = self.tick + 1))]
    pub fn step(&mut self) -> TickReport {
        self.pool.run_phase(integrate_job(Arc::clone(&self.world), Arc::clone(&self.ranges)));
        let (new_contacts, rounds) = match self.ordering {
            ContactOrdering::Canonical => self.canonical_contacts(),
            ContactOrdering::Eager => {
                let counter = Arc::new(AtomicUsize::new(0));
                self.pool.run_phase(eager_job(
                    Arc::clone(&self.world),
                    Arc::clone(&counter),
                    self.claim_batch,
                ));
                (counter.load(Ordering::Relaxed), 0)
            }
        };
        self.finish_tick(new_contacts, rounds)
    }

    fn canonical_contacts(&mut self) -> (usize, usize) {
        self.world.store.fill_snapshot(Arc::make_mut(&mut self.frozen));
        self.pool.run_phase(detect_job(
            Arc::clone(&self.world),
            Arc::clone(&self.frozen),
            Arc::clone(&self.found),
            self.claim_batch,
        ));

        let mut fresh = Vec::new();
        for slot in self.found.iter() {
            fresh.append(&mut slot.lock().unwrap_or_else(PoisonError::into_inner));
        }
        fresh.sort_unstable();

        let rounds = schedule_rounds(&fresh, self.world.store.len());
        for round in &rounds {
            if round.len() <= INLINE_ROUND {
                for &key in round {
                    self.world.resolve_pair(key);
                }
            } else {
                let job = resolve_round_job(Arc::clone(&self.world), round.as_slice().into());
                self.pool.run_phase(job);
            }
        }
        (fresh.len(), rounds.len())
    }

    /// Advances one tick on the calling thread, resolving new contacts in
    /// canonical `(lo, hi)` order. Produces the same bodies as [`Self::step`]
    /// under [`ContactOrdering::Canonical`], for any worker count.
    pub fn step_serial(&mut self) -> TickReport {
        let n = self.world.store.len();
        self.world.integrate_range(0..n);
        let mut new_contacts = 0;
        for (i, j) in PairRange::new(0..pair_count(n), n) {
            new_contacts += usize::from(self.world.check_and_resolve(i, j));
        }
        self.finish_tick(new_contacts, 0)
    }

    fn finish_tick(&mut self, new_contacts: usize, rounds: usize) -> TickReport {
        self.tick += 1;
        let report = TickReport {
            tick: self.tick,
            new_contacts,
            active_contacts: self.world.latch.len(),
            rounds,
        };
        debug!(
            tick = report.tick,
            new_contacts,
            active_contacts = report.active_contacts,
            rounds,
            "tick complete"
        );
        report
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.world.store.len()
    }

    /// Always `false` for a constructed simulation.
    pub fn is_empty(&self) -> bool {
        self.world.store.is_empty()
    }

    /// Plane extents.
    pub fn bounds(&self) -> Bounds {
        self.world.store.bounds()
    }

    /// Contact resolution order in use.
    pub fn ordering(&self) -> ContactOrdering {
        self.ordering
    }

    /// Worker threads in the pool.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Lifecycle state of each worker.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.pool.worker_states()
    }

    /// Copies every body in id order.
    pub fn snapshot(&self) -> Vec<Body> {
        self.world.store.snapshot()
    }

    /// Copy of one body.
    pub fn body(&self, id: BodyId) -> Option<Body> {
        self.world.store.body(id)
    }

    /// Moves body `id` and replaces its velocity between ticks.
    ///
    /// # Errors
    /// Returns [`SimError::BodyOutOfRange`] for an unknown id.
    pub fn set_body(&mut self, id: BodyId, position: Vec2, velocity: Vec2) -> Result<(), SimError> {
        if self.world.store.place(id, position, velocity) {
            Ok(())
        } else {
            Err(SimError::BodyOutOfRange { id: id.0, len: self.len() })
        }
    }

    /// Latched pairs in canonical order.
    pub fn contacts(&self) -> Vec<PairKey> {
        self.world.latch.keys()
    }

    /// Returns `true` if the pair `(a, b)` is currently latched.
    ///
    /// # Panics
    /// Panics if `a == b` or either id is out of range.
    pub fn in_contact(&self, a: BodyId, b: BodyId) -> bool {
        self.world.latch.contains(PairKey::new(a, b))
    }

    /// Sum of radius-weighted kinetic energy.
    pub fn kinetic_energy(&self) -> f64 {
        self.world.store.kinetic_energy()
    }

    /// Stops and joins every worker. Dropping the simulation does the same.
    pub fn shutdown(mut self) {
        self.pool.shutdown();
    }
}
