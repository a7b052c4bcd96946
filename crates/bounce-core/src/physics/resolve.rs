// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Elastic collision response by rotation into the contact frame.
//!
//! Steps:
//! 1. `phi = atan2(dy, dx)` for the center offset `p1 - p2`.
//! 2. Each velocity is split into speed and heading, then rotated into the
//!    contact frame: normal `s·cos(θ - phi)`, tangential `s·sin(θ - phi)`.
//! 3. Normal components are exchanged with the 1-D elastic formula, using the
//!    radius as the mass of each body.
//! 4. `(normal', tangential)` is rotated back using `phi` and `phi + π/2`.
//!
//! Radius stands in for mass unconditionally. Callers that want true mass
//! semantics must pick radii proportional to mass.

use core::f32::consts::FRAC_PI_2;

use crate::body::Body;
use crate::math::Vec2;

/// Post-collision velocities for two discs.
///
/// `r1 + r2` must be non-zero; stores only admit strictly positive radii.
pub fn elastic_response(
    p1: Vec2,
    v1: Vec2,
    r1: f32,
    p2: Vec2,
    v2: Vec2,
    r2: f32,
) -> (Vec2, Vec2) {
    let phi = p1.sub(&p2).angle();

    let (n1, t1) = to_contact_frame(v1, phi);
    let (n2, t2) = to_contact_frame(v2, phi);

    let total = r1 + r2;
    let n1_out = ((r1 - r2) * n1 + (2.0 * r2) * n2) / total;
    let n2_out = ((2.0 * r1) * n1 + (r2 - r1) * n2) / total;

    (from_contact_frame(n1_out, t1, phi), from_contact_frame(n2_out, t2, phi))
}

fn to_contact_frame(v: Vec2, phi: f32) -> (f32, f32) {
    let speed = v.length();
    let rel = v.angle() - phi;
    (speed * rel.cos(), speed * rel.sin())
}

fn from_contact_frame(normal: f32, tangential: f32, phi: f32) -> Vec2 {
    let side = phi + FRAC_PI_2;
    Vec2::new(
        phi.cos() * normal + side.cos() * tangential,
        phi.sin() * normal + side.sin() * tangential,
    )
}

/// Applies the elastic response to a pair of bodies in place.
///
/// The pair is evaluated in canonical id order, so `resolve(a, b)` and
/// `resolve(b, a)` write bit-identical velocities.
///
/// # Panics
/// Panics if both references carry the same id.
pub fn resolve(a: &mut Body, b: &mut Body) {
    assert_ne!(a.id, b.id, "cannot resolve a body against itself");
    let (lo, hi) = if a.id < b.id { (a, b) } else { (b, a) };
    let (v_lo, v_hi) = elastic_response(
        lo.position,
        lo.velocity,
        lo.radius,
        hi.position,
        hi.velocity,
        hi.radius,
    );
    lo.velocity = v_lo;
    hi.velocity = v_hi;
}
