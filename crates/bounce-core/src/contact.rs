// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pair identity and the contact latch.
//!
//! Latch contract:
//! - A [`PairKey`] is present iff the pair's last checked distance was within
//!   the sum of radii.
//! - It is removed on the first check that finds the pair separated, which
//!   re-arms detection for that exact pair.
//! - Contact memory is per pair, never per body, so one body's contacts
//!   cannot clear each other.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;

use crate::body::BodyId;

/// Canonical identity of an unordered body pair: `lo < hi`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    lo: u32,
    hi: u32,
}

impl PairKey {
    /// Normalizes `(a, b)` so the lower id comes first.
    ///
    /// # Panics
    /// Panics if `a == b`; a body never pairs with itself.
    pub fn new(a: BodyId, b: BodyId) -> Self {
        assert_ne!(a, b, "a body cannot pair with itself: {a:?}");
        if a.0 < b.0 {
            Self { lo: a.0, hi: b.0 }
        } else {
            Self { lo: b.0, hi: a.0 }
        }
    }

    /// Lower body id.
    pub fn lo(self) -> BodyId {
        BodyId(self.lo)
    }

    /// Higher body id.
    pub fn hi(self) -> BodyId {
        BodyId(self.hi)
    }
}

/// Set of pairs that have been resolved and have not separated since.
///
/// Entries are sharded by the pair's lower index. Workers checking `(i, j)`
/// and `(i, k)` share a shard; pairs with distinct lower bodies never contend.
#[derive(Debug)]
pub struct ContactLatch {
    shards: Box<[Mutex<FxHashSet<u32>>]>,
}

impl ContactLatch {
    /// Creates an empty latch for a store of `len` bodies.
    pub fn new(len: usize) -> Self {
        let shards = (0..len).map(|_| Mutex::new(FxHashSet::default())).collect();
        Self { shards }
    }

    fn shard(&self, key: PairKey) -> MutexGuard<'_, FxHashSet<u32>> {
        assert!(
            (key.hi as usize) < self.shards.len(),
            "pair {key:?} out of range for latch of {} bodies",
            self.shards.len()
        );
        self.shards[key.lo as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if `key` is latched.
    pub fn contains(&self, key: PairKey) -> bool {
        self.shard(key).contains(&key.hi)
    }

    /// Latches `key`. Returns `true` if it was not already latched.
    pub fn arm(&self, key: PairKey) -> bool {
        self.shard(key).insert(key.hi)
    }

    /// Clears `key`. Returns `true` if it was latched.
    pub fn release(&self, key: PairKey) -> bool {
        self.shard(key).remove(&key.hi)
    }

    /// Number of latched pairs.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Returns `true` when no pair is latched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All latched pairs in canonical order.
    pub fn keys(&self) -> Vec<PairKey> {
        let mut out = Vec::new();
        for (lo, shard) in self.shards.iter().enumerate() {
            let shard = shard.lock().unwrap_or_else(PoisonError::into_inner);
            #[allow(clippy::cast_possible_truncation)]
            out.extend(shard.iter().map(|&hi| PairKey { lo: lo as u32, hi }));
        }
        out.sort_unstable();
        out
    }
}
