// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction-time failures are reported before any worker starts.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use bounce_core::math::Vec2;
use bounce_core::{BodyId, Bounds, ConfigError, ContactOrdering, SimConfig, SimError, Simulation};
use common::{disc, scene, scene_config};

#[test]
fn zero_bodies_is_a_config_error() {
    let err = Simulation::initialize(0, Bounds::new(10.0, 10.0), 1).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::NoBodies)), "{err}");
}

#[test]
fn degenerate_bounds_are_rejected() {
    let err = Simulation::initialize(5, Bounds::new(10.0, -1.0), 1).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::InvalidBounds { .. })), "{err}");
}

#[test]
fn discs_wider_than_the_plane_are_rejected() {
    let config = SimConfig { radius: 10.0, ..SimConfig::new(3, Bounds::new(8.0, 8.0), 1) };
    let err = Simulation::new(&config).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::RadiusExceedsBounds { .. })), "{err}");

    let ranged = SimConfig {
        radius: 2.0,
        radius_max: Some(30.0),
        ..SimConfig::new(3, Bounds::new(100.0, 50.0), 1)
    };
    let err = Simulation::new(&ranged).unwrap_err();
    assert_eq!(err.to_string(), "radius 30 does not fit inside 100x50");

    let snug = SimConfig { radius: 4.0, ..SimConfig::new(3, Bounds::new(8.0, 8.0), 1) };
    let sim = Simulation::new(&snug).unwrap();
    for b in sim.snapshot() {
        assert_eq!(b.position, Vec2::new(4.0, 4.0));
    }

    let err = Simulation::with_bodies(
        &scene_config(1, ContactOrdering::Canonical),
        vec![disc(500.0, 500.0, 0.0, 0.0, 1.0), disc(500.0, 500.0, 0.0, 0.0, 600.0)],
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::InvalidBody { index: 1, .. })), "{err}");
}

#[test]
fn zero_workers_are_rejected() {
    let config = SimConfig { workers: 0, ..SimConfig::new(5, Bounds::new(100.0, 100.0), 1) };
    let err = Simulation::new(&config).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::NoWorkers)));
    assert_eq!(err.to_string(), "workers must be at least 1");
}

#[test]
fn explicit_bodies_are_checked() {
    let config = scene_config(2, ContactOrdering::Eager);
    let err = Simulation::with_bodies(
        &config,
        vec![disc(1.0, 1.0, 0.0, 0.0, 1.0), disc(5.0, 5.0, 0.0, 0.0, 0.0)],
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::InvalidBody { index: 1, .. })), "{err}");

    let err =
        Simulation::with_bodies(&config, vec![disc(f32::NAN, 1.0, 0.0, 0.0, 1.0)]).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::InvalidBody { index: 0, .. })), "{err}");

    let err = Simulation::with_bodies(&config, Vec::new()).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::NoBodies)), "{err}");
}

#[test]
fn unknown_body_ids_are_reported() {
    let mut sim = scene(vec![disc(1.0, 1.0, 0.0, 0.0, 1.0)], 1);
    let err = sim.set_body(BodyId(4), Vec2::ZERO, Vec2::ZERO).unwrap_err();
    assert!(matches!(err, SimError::BodyOutOfRange { id: 4, len: 1 }), "{err}");
    assert!(sim.body(BodyId(4)).is_none());
}

#[test]
fn config_file_round_trip_drives_the_same_simulation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.json");
    let config = SimConfig { workers: 2, ..SimConfig::new(30, Bounds::new(100.0, 100.0), 99) };
    config.save(&path).unwrap();

    let mut a = Simulation::new(&config).unwrap();
    let mut b = Simulation::new(&SimConfig::load(&path).unwrap()).unwrap();
    for _ in 0..20 {
        assert_eq!(a.step(), b.step());
    }
    assert_eq!(a.snapshot(), b.snapshot());
}
