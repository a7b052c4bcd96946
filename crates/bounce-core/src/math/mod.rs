// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Planar math and seeded randomness for the simulation.

mod prng;
mod vec2;

pub use prng::Prng;
pub use vec2::Vec2;
