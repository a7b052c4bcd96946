// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded initial layout.
//!
//! Draw order per body is fixed: radius (only when a range is configured),
//! then position (random layout only), then `vx`, then `vy`. The layout is a
//! pure function of the config.

use crate::body::{BodyInit, Bounds};
use crate::config::{ConfigError, Placement, SimConfig};
use crate::math::{Prng, Vec2};

/// Lattice points per axis: `margin + k·spacing < extent`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn lattice_points(extent: f32, spacing: f32, margin: f32) -> usize {
    if margin >= extent {
        return 0;
    }
    ((extent - margin) / spacing).ceil() as usize
}

/// Number of bodies a grid layout can hold inside `bounds`.
///
/// # Errors
/// Returns [`ConfigError::InvalidGrid`] for non-finite or non-positive
/// spacing, or a negative margin.
pub fn grid_capacity(bounds: Bounds, spacing: f32, margin: f32) -> Result<usize, ConfigError> {
    if !(spacing.is_finite() && spacing > 0.0 && margin.is_finite() && margin >= 0.0) {
        return Err(ConfigError::InvalidGrid { spacing, margin });
    }
    let cols = lattice_points(bounds.width, spacing, margin);
    let rows = lattice_points(bounds.height, spacing, margin);
    Ok(cols.saturating_mul(rows))
}

/// Produces `config.body_count` initial bodies.
///
/// # Errors
/// Returns the validation error if `config` is invalid.
#[allow(clippy::cast_precision_loss)]
pub fn layout(config: &SimConfig) -> Result<Vec<BodyInit>, ConfigError> {
    config.validate()?;
    let mut rng = Prng::from_seed_u64(config.seed);
    let bounds = config.bounds;
    let rows = match config.placement {
        Placement::Grid { spacing, margin } => lattice_points(bounds.height, spacing, margin),
        Placement::Random => 0,
    };

    let mut bodies = Vec::with_capacity(config.body_count);
    for ix in 0..config.body_count {
        let radius = match config.radius_max {
            Some(max) if max > config.radius => rng.next_range(config.radius, max),
            _ => config.radius,
        };
        let position = match config.placement {
            Placement::Random => Vec2::new(
                rng.next_range(radius, bounds.width - radius),
                rng.next_range(radius, bounds.height - radius),
            ),
            // Column-major: fill a column of `rows` before stepping along X.
            Placement::Grid { spacing, margin } => Vec2::new(
                margin + (ix / rows) as f32 * spacing,
                margin + (ix % rows) as f32 * spacing,
            ),
        };
        let velocity = Vec2::new(
            rng.next_range(-config.max_speed, config.max_speed),
            rng.next_range(-config.max_speed, config.max_speed),
        );
        bodies.push(BodyInit::new(position, velocity, radius));
    }
    Ok(bodies)
}
