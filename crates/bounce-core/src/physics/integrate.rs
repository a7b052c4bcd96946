// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Position update with reflective walls.

use crate::body::{Body, Bounds};
use crate::math::Vec2;

/// Advances `body` by one tick (`dt = 1`) and reflects velocity at the walls.
///
/// Per axis, a velocity component is inverted when the body's edge lies past a
/// wall *and* the component still points outward. Position is never clamped:
/// overshoot within one step is kept, and the inward velocity carries the body
/// back on following ticks.
pub fn integrate(body: &mut Body, bounds: Bounds) {
    body.position = body.position.add(&body.velocity);

    let [x, y] = body.position.to_array();
    let [mut vx, mut vy] = body.velocity.to_array();
    let r = body.radius;

    if (x - r < 0.0 && vx < 0.0) || (x + r > bounds.width && vx > 0.0) {
        vx = -vx;
    }
    if (y - r < 0.0 && vy < 0.0) || (y + r > bounds.height && vy > 0.0) {
        vy = -vy;
    }
    body.velocity = Vec2::new(vx, vy);
}
