// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bounce-core: parallel pairwise elastic collisions of circular bodies.
//!
//! A fixed set of discs moves inside a rectangle with reflective walls. Each
//! tick integrates every body, then checks every unordered pair once and
//! resolves newly overlapping pairs with an elastic response that uses the
//! radius as mass. A per-pair contact latch keeps a pair from being resolved
//! again until it has separated.
//!
//! Work runs on a persistent pool of worker threads. Integration is split
//! into static ranges; pairs are claimed from a shared atomic cursor. Each
//! body has its own lock and pairs always lock the lower index first.
//!
//! ```no_run
//! use bounce_core::{Bounds, Simulation};
//!
//! # fn main() -> Result<(), bounce_core::SimError> {
//! let mut sim = Simulation::initialize(500, Bounds::new(800.0, 600.0), 7)?;
//! for _ in 0..100 {
//!     let report = sim.step();
//!     assert_eq!(report.active_contacts, sim.contacts().len());
//! }
//! sim.shutdown();
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions
)]

/// Planar math and seeded randomness.
pub mod math;
/// Parallel execution: partitioning, worker pool, phase jobs.
pub mod par;
/// Per-tick body kernels: integration, detection, resolution.
pub mod physics;

mod body;
mod config;
mod contact;
mod error;
mod placement;
mod sim;
mod store;

pub use body::{Body, BodyId, BodyInit, Bounds};
pub use config::{ConfigError, ContactOrdering, Placement, SimConfig, MAX_BODIES};
pub use contact::{ContactLatch, PairKey};
pub use error::SimError;
pub use placement::{grid_capacity, layout};
pub use sim::{Simulation, TickReport};
pub use store::BodyStore;
