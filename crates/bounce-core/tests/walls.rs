// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wall reflection and long-run stability.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use bounce_core::math::Vec2;
use bounce_core::{BodyId, Bounds, ContactOrdering, Placement, SimConfig, Simulation};
use common::{dense_config, disc, scene};

#[test]
fn body_crossing_a_wall_turns_back() {
    let mut sim = scene(vec![disc(6.0, 500.0, -2.0, 0.5, 5.0)], 2);
    sim.step();
    let b = sim.body(BodyId(0)).unwrap();
    assert_eq!(b.position, Vec2::new(4.0, 500.5));
    assert_eq!(b.velocity, Vec2::new(2.0, 0.5));

    sim.step();
    let b = sim.body(BodyId(0)).unwrap();
    assert_eq!(b.position, Vec2::new(6.0, 501.0));
    assert_eq!(b.velocity, Vec2::new(2.0, 0.5));
}

#[test]
fn far_corner_flips_both_axes() {
    let mut sim = scene(vec![disc(994.0, 994.0, 1.5, 1.5, 5.0)], 1);
    sim.step();
    assert_eq!(sim.body(BodyId(0)).unwrap().velocity, Vec2::new(-1.5, -1.5));
}

#[test]
fn overshoot_never_exceeds_one_tick_of_travel() {
    // One body per horizontal lane, lanes far enough apart that nothing collides.
    let speeds = [0.7_f32, -1.3, 2.9, -4.0, 3.3];
    let bodies = speeds
        .iter()
        .zip(0u8..)
        .map(|(&vx, lane)| disc(60.0, 20.0 + 30.0 * f32::from(lane), vx, 0.0, 5.0))
        .collect();
    let config = SimConfig { workers: 3, ..SimConfig::new(1, Bounds::new(120.0, 200.0), 0) };
    let mut sim = Simulation::with_bodies(&config, bodies).unwrap();
    for _ in 0..1_000 {
        assert_eq!(sim.step().new_contacts, 0);
        for b in sim.snapshot() {
            let x = b.position.x();
            let travel = b.velocity.x().abs();
            assert!(x - b.radius >= -travel && x + b.radius <= 120.0 + travel, "{b:?}");
            assert_eq!(b.velocity.x().abs(), speeds[b.id.index()].abs());
        }
    }
}

#[test]
fn radius_weighted_energy_is_conserved() {
    let mut sim = Simulation::new(&dense_config(4, ContactOrdering::Canonical, 42)).unwrap();
    let before = sim.kinetic_energy();
    for _ in 0..200 {
        sim.step();
    }
    let after = sim.kinetic_energy();
    assert!((after - before).abs() / before < 1e-2, "before {before}, after {after}");
}

#[test]
fn grid_layout_starts_without_contacts() {
    let config = SimConfig {
        placement: Placement::grid(),
        workers: 2,
        ..SimConfig::new(400, Bounds::new(1000.0, 1000.0), 5)
    };
    let mut sim = Simulation::new(&config).unwrap();
    assert_eq!(sim.step().active_contacts, 0);
}
