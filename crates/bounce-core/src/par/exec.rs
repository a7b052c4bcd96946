// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Phase jobs for one tick.
//!
//! # Canonical ordering
//!
//! Detection runs in parallel over the pair cursor against a frozen copy of
//! the bodies, so its outcome does not depend on which worker checks which
//! pair. Newly armed pairs are sorted and split into body-disjoint rounds;
//! rounds run one after another and pairs inside a round never share a body.
//! Every body therefore sees its new contacts resolved in canonical `(lo, hi)`
//! order, which is exactly what a serial pass over sorted pairs produces.
//!
//! # Eager ordering
//!
//! One pass: each claimed pair locks both bodies, checks, and resolves on the
//! spot. Race-free, but the order in which a body's contacts are resolved
//! follows the schedule.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::body::Body;
use crate::contact::{ContactLatch, PairKey};
use crate::physics::{detect, integrate, resolve};
use crate::store::BodyStore;

use super::partition::{pair_count, PairRange};
use super::pool::Job;

/// Pairs claimed per cursor increment while resolving a round.
const RESOLVE_BATCH: usize = 16;

/// State shared with every worker for the lifetime of a simulation.
#[derive(Debug)]
pub(crate) struct World {
    pub(crate) store: BodyStore,
    pub(crate) latch: ContactLatch,
}

impl World {
    pub(crate) fn new(store: BodyStore) -> Self {
        let latch = ContactLatch::new(store.len());
        Self { store, latch }
    }

    /// Integrates the bodies in `range`.
    pub(crate) fn integrate_range(&self, range: Range<usize>) {
        let bounds = self.store.bounds();
        for ix in range {
            integrate(&mut self.store.lock(ix), bounds);
        }
    }

    /// Locks `(lo, hi)`, checks it, and resolves it if it is a new contact.
    pub(crate) fn check_and_resolve(&self, lo: usize, hi: usize) -> bool {
        let (mut a, mut b) = self.store.lock_pair(lo, hi);
        let fresh = detect(&a, &b, &self.latch).is_new();
        if fresh {
            resolve(&mut a, &mut b);
        }
        fresh
    }

    /// Resolves a pair already known to be a new contact.
    pub(crate) fn resolve_pair(&self, key: PairKey) {
        let (mut a, mut b) = self.store.lock_pair(key.lo().index(), key.hi().index());
        resolve(&mut a, &mut b);
    }
}

/// Claims `[start, start + batch)` blocks from `cursor` until `total` is reached.
fn claim_blocks(
    cursor: &AtomicUsize,
    batch: usize,
    total: usize,
    mut f: impl FnMut(Range<usize>),
) {
    loop {
        let start = cursor.fetch_add(batch, Ordering::Relaxed);
        if start >= total {
            break;
        }
        f(start..(start + batch).min(total));
    }
}

/// Phase 1: every worker integrates its static range.
pub(crate) fn integrate_job(world: Arc<World>, ranges: Arc<[Range<usize>]>) -> Job {
    Arc::new(move |worker| world.integrate_range(ranges[worker].clone()))
}

/// Phase 2a (canonical): detect over the pair cursor against `frozen`,
/// appending newly armed pairs to `found[worker]`.
pub(crate) fn detect_job(
    world: Arc<World>,
    frozen: Arc<Vec<Body>>,
    found: Arc<[Mutex<Vec<PairKey>>]>,
    claim_batch: usize,
) -> Job {
    let cursor = AtomicUsize::new(0);
    Arc::new(move |worker| {
        let n = frozen.len();
        let mut local = Vec::new();
        claim_blocks(&cursor, claim_batch, pair_count(n), |block| {
            for (i, j) in PairRange::new(block, n) {
                let (a, b) = (&frozen[i], &frozen[j]);
                if detect(a, b, &world.latch).is_new() {
                    local.push(PairKey::new(a.id, b.id));
                }
            }
        });
        found[worker]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(local);
    })
}

/// Phase 2b (canonical): resolve one body-disjoint round.
pub(crate) fn resolve_round_job(world: Arc<World>, round: Arc<[PairKey]>) -> Job {
    let cursor = AtomicUsize::new(0);
    Arc::new(move |_| {
        claim_blocks(&cursor, RESOLVE_BATCH, round.len(), |block| {
            for &key in &round[block] {
                world.resolve_pair(key);
            }
        });
    })
}

/// Phase 2 (eager): detect and resolve in a single pass over the pair cursor.
pub(crate) fn eager_job(
    world: Arc<World>,
    new_contacts: Arc<AtomicUsize>,
    claim_batch: usize,
) -> Job {
    let cursor = AtomicUsize::new(0);
    Arc::new(move |_| {
        let n = world.store.len();
        let mut fresh = 0usize;
        claim_blocks(&cursor, claim_batch, pair_count(n), |block| {
            for (i, j) in PairRange::new(block, n) {
                fresh += usize::from(world.check_and_resolve(i, j));
            }
        });
        new_contacts.fetch_add(fresh, Ordering::Relaxed);
    })
}

/// Splits sorted new contacts into rounds in which no body appears twice.
///
/// A pair lands in the round after the latest round that already touches
/// either of its bodies, so per body the canonical order is preserved.
pub(crate) fn schedule_rounds(pairs: &[PairKey], bodies: usize) -> Vec<Vec<PairKey>> {
    debug_assert!(pairs.windows(2).all(|w| w[0] < w[1]), "pairs must be sorted and unique");
    let mut last = vec![0usize; bodies];
    let mut rounds: Vec<Vec<PairKey>> = Vec::new();
    for &key in pairs {
        let (lo, hi) = (key.lo().index(), key.hi().index());
        let round = last[lo].max(last[hi]) + 1;
        if rounds.len() < round {
            rounds.push(Vec::new());
        }
        rounds[round - 1].push(key);
        last[lo] = round;
        last[hi] = round;
    }
    rounds
}
