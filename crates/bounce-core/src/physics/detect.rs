// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Level-triggered overlap test gated by the contact latch.

use crate::body::Body;
use crate::contact::{ContactLatch, PairKey};

/// Outcome of checking one pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Contact {
    /// Overlapping and not latched: the pair must be resolved now.
    New,
    /// Overlapping but already resolved; left alone until it separates.
    Held,
    /// Not touching. Any latch entry for the pair has been cleared.
    Apart,
}

impl Contact {
    /// Returns `true` for [`Contact::New`].
    pub fn is_new(self) -> bool {
        matches!(self, Self::New)
    }
}

/// Checks bodies `a` and `b` and updates the latch entry for their pair.
///
/// Touching counts as overlap (`distance <= ra + rb`). Argument order does not
/// matter: the pair is normalized before the latch is consulted and the
/// distance is symmetric.
///
/// # Panics
/// Panics if `a` and `b` share an id or either id is outside the latch.
pub fn detect(a: &Body, b: &Body, latch: &ContactLatch) -> Contact {
    let key = PairKey::new(a.id, b.id);
    if a.overlaps(b) {
        if latch.arm(key) {
            Contact::New
        } else {
            Contact::Held
        }
    } else {
        latch.release(key);
        Contact::Apart
    }
}
