// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Body records and the plane they move in.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Stable identity of a body: its index in the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Returns the store index for this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Extent of the simulated plane. The walls sit at `0` and at `width`/`height`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Extent along X.
    pub width: f32,
    /// Extent along Y.
    pub height: f32,
}

impl Bounds {
    /// Creates bounds without validation; see [`crate::SimConfig::validate`].
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Returns `true` if a disc of `radius` fits between both pairs of walls.
    pub fn fits(&self, radius: f32) -> bool {
        2.0 * radius <= self.width && 2.0 * radius <= self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(1000.0, 1000.0)
    }
}

/// A circular body.
///
/// `radius` doubles as the body's mass in the collision response; it is fixed
/// for the life of the store and must be strictly positive.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Index of this body in the store.
    pub id: BodyId,
    /// Center position.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Radius (and mass proxy).
    pub radius: f32,
}

impl Body {
    /// Creates a body record.
    pub const fn new(id: BodyId, position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self { id, position, velocity, radius }
    }

    /// Center-to-center distance to `other`.
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.sub(&other.position).length()
    }

    /// Returns `true` when the two discs touch or overlap (inclusive).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.distance_to(other) <= self.radius + other.radius
    }

    /// Radius-weighted kinetic energy, `½·r·|v|²`.
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.radius * self.velocity.length_squared()
    }
}

/// Initial state of a body before it is assigned an id.
///
/// Ids are positions in the list handed to [`crate::Simulation::with_bodies`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BodyInit {
    /// Center position.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Radius (and mass proxy).
    pub radius: f32,
}

impl BodyInit {
    /// Creates an initial body state.
    pub const fn new(position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self { position, velocity, radius }
    }

    /// Assigns `id`, producing a store record.
    pub const fn with_id(self, id: BodyId) -> Body {
        Body::new(id, self.position, self.velocity, self.radius)
    }
}
