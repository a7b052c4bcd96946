// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::expect_used)]

use bounce_core::math::Vec2;
use bounce_core::{
    Body, BodyId, BodyInit, Bounds, ContactOrdering, PairKey, SimConfig, Simulation,
};

/// Worker counts to prove results don't depend on the pool size.
pub const WORKER_COUNTS: &[usize] = &[1, 2, 3, 4, 8];

/// Seeds for scenario variety.
pub const SEEDS: &[u64] = &[1, 7, 42, 0xDEAD_BEEF];

/// Shorthand for an initial body.
pub fn disc(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> BodyInit {
    BodyInit::new(Vec2::new(x, y), Vec2::new(vx, vy), radius)
}

/// Config for hand-placed scenes in a 1000×1000 box.
pub fn scene_config(workers: usize, ordering: ContactOrdering) -> SimConfig {
    SimConfig { workers, ordering, ..SimConfig::new(1, Bounds::new(1000.0, 1000.0), 0) }
}

/// Starts a simulation from explicit bodies.
pub fn scene(bodies: Vec<BodyInit>, workers: usize) -> Simulation {
    Simulation::with_bodies(&scene_config(workers, ContactOrdering::Canonical), bodies)
        .expect("scene should build")
}

/// A crowded box: lots of simultaneous and multi-body contacts.
pub fn dense_config(workers: usize, ordering: ContactOrdering, seed: u64) -> SimConfig {
    SimConfig {
        radius: 4.0,
        radius_max: Some(9.0),
        max_speed: 3.0,
        workers,
        ordering,
        claim_batch: 64,
        ..SimConfig::new(160, Bounds::new(220.0, 180.0), seed)
    }
}

/// Brute-force set of overlapping pairs, canonical order.
pub fn overlapping_pairs(bodies: &[Body]) -> Vec<PairKey> {
    let mut out = Vec::new();
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            if a.overlaps(b) {
                out.push(PairKey::new(a.id, b.id));
            }
        }
    }
    out
}

/// Bit pattern of every body's state, for exact comparisons.
pub fn state_bits(bodies: &[Body]) -> Vec<[u32; 5]> {
    bodies
        .iter()
        .map(|b| {
            let [px, py] = b.position.to_array();
            let [vx, vy] = b.velocity.to_array();
            [px.to_bits(), py.to_bits(), vx.to_bits(), vy.to_bits(), b.radius.to_bits()]
        })
        .collect()
}

/// Asserts two vectors agree within `eps` per component.
#[track_caller]
pub fn assert_vec_close(actual: Vec2, expected: Vec2, eps: f32) {
    assert!(
        (actual.x() - expected.x()).abs() <= eps && (actual.y() - expected.y()).abs() <= eps,
        "expected {expected:?}, got {actual:?}"
    );
}

/// Velocity of body `id`.
pub fn velocity(sim: &Simulation, id: u32) -> Vec2 {
    sim.body(BodyId(id)).expect("body exists").velocity
}
