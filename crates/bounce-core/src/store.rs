// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed-size body store with one lock per body.
//!
//! The store never grows or shrinks after construction. Each body sits behind
//! its own mutex, which is the unit of exclusion during collision resolution:
//! a pair `(lo, hi)` is handled while holding `lo` then `hi`, so two pairs
//! contend only when they share a body and the global index order rules out
//! deadlock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::body::{Body, BodyId, Bounds};
use crate::math::Vec2;

/// Shared array of body records owned by a [`crate::Simulation`].
#[derive(Debug)]
pub struct BodyStore {
    slots: Box<[Mutex<Body>]>,
    bounds: Bounds,
}

impl BodyStore {
    /// Builds a store from bodies whose ids already match their positions.
    ///
    /// # Panics
    /// Panics if any body's id differs from its index.
    pub(crate) fn new(bounds: Bounds, bodies: Vec<Body>) -> Self {
        for (ix, body) in bodies.iter().enumerate() {
            assert_eq!(body.id.index(), ix, "body id must equal its store index");
        }
        let slots = bodies.into_iter().map(Mutex::new).collect();
        Self { slots, bounds }
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` for an empty store (never the case for a validated config).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Plane extents.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Locks a single body.
    ///
    /// A poisoned lock means a worker panicked mid-phase; that panic is re-raised
    /// on the driving thread at the phase barrier, so the guard is recovered here.
    ///
    /// # Panics
    /// Panics if `ix` is out of range.
    pub(crate) fn lock(&self, ix: usize) -> MutexGuard<'_, Body> {
        self.slots[ix].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks two distinct bodies, lower index first, returning guards in `(lo, hi)` order.
    ///
    /// # Panics
    /// Panics unless `lo < hi < len`.
    pub(crate) fn lock_pair(
        &self,
        lo: usize,
        hi: usize,
    ) -> (MutexGuard<'_, Body>, MutexGuard<'_, Body>) {
        assert!(
            lo < hi && hi < self.slots.len(),
            "invalid body pair ({lo}, {hi}) for store of {}",
            self.slots.len()
        );
        let a = self.lock(lo);
        let b = self.lock(hi);
        (a, b)
    }

    /// Copy of one body, or `None` if `id` is out of range.
    pub fn body(&self, id: BodyId) -> Option<Body> {
        self.slots
            .get(id.index())
            .map(|slot| *slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copies every body in id order.
    pub fn snapshot(&self) -> Vec<Body> {
        (0..self.slots.len()).map(|ix| *self.lock(ix)).collect()
    }

    /// Refills `out` with every body, for lock-free reads in a phase that does
    /// not move bodies.
    pub(crate) fn fill_snapshot(&self, out: &mut Vec<Body>) {
        out.clear();
        out.extend((0..self.slots.len()).map(|ix| *self.lock(ix)));
    }

    /// Overwrites position and velocity of body `id`, keeping its id and radius.
    ///
    /// Returns `false` if `id` is out of range.
    pub(crate) fn place(&self, id: BodyId, position: Vec2, velocity: Vec2) -> bool {
        let Some(slot) = self.slots.get(id.index()) else {
            return false;
        };
        let mut body = slot.lock().unwrap_or_else(PoisonError::into_inner);
        body.position = position;
        body.velocity = velocity;
        true
    }

    /// Sum of radius-weighted kinetic energy over all bodies.
    pub fn kinetic_energy(&self) -> f64 {
        (0..self.slots.len())
            .map(|ix| f64::from(self.lock(ix).kinetic_energy()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> BodyStore {
        BodyStore::new(
            Bounds::default(),
            vec![
                Body::new(BodyId(0), Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 2.0),
                Body::new(BodyId(1), Vec2::new(20.0, 10.0), Vec2::new(0.0, 2.0), 4.0),
            ],
        )
    }

    #[test]
    fn snapshot_preserves_id_order() {
        let store = two();
        let ids: Vec<_> = store.snapshot().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BodyId(0), BodyId(1)]);
    }

    #[test]
    fn place_keeps_radius_and_rejects_unknown_ids() {
        let store = two();
        assert!(store.place(BodyId(1), Vec2::new(5.0, 5.0), Vec2::ZERO));
        let b = store.body(BodyId(1));
        assert_eq!(b.map(|b| b.radius), Some(4.0));
        assert_eq!(b.map(|b| b.position), Some(Vec2::new(5.0, 5.0)));
        assert!(!store.place(BodyId(9), Vec2::ZERO, Vec2::ZERO));
        assert!(store.body(BodyId(9)).is_none());
    }

    #[test]
    fn kinetic_energy_is_radius_weighted() {
        let store = two();
        // 0.5*2*1 + 0.5*4*4
        assert!((store.kinetic_energy() - 9.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "invalid body pair")]
    fn lock_pair_rejects_reversed_order() {
        let store = two();
        let _guards = store.lock_pair(1, 0);
    }

    #[test]
    #[should_panic(expected = "body id must equal its store index")]
    fn new_rejects_misnumbered_bodies() {
        let _ = BodyStore::new(
            Bounds::default(),
            vec![Body::new(BodyId(3), Vec2::ZERO, Vec2::ZERO, 1.0)],
        );
    }
}
