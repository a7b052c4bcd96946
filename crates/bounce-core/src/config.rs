// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulation configuration: JSON load/save and fail-fast validation.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::Bounds;
use crate::placement;

/// Largest accepted body count. Ids are `u32` and the pair index space is
/// quadratic in the count.
pub const MAX_BODIES: usize = 1 << 16;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `body_count` was zero.
    #[error("body_count must be at least 1")]
    NoBodies,
    /// `body_count` exceeded [`MAX_BODIES`].
    #[error("body_count {count} exceeds the maximum of {max}")]
    TooManyBodies {
        /// Requested count.
        count: usize,
        /// Accepted maximum.
        max: usize,
    },
    /// Bounds were non-positive or non-finite.
    #[error("bounds must be finite and positive, got {width}x{height}")]
    InvalidBounds {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
    /// A radius was non-positive or non-finite.
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f32),
    /// `radius_max` was below `radius`.
    #[error("radius_max {max} is below radius {min}")]
    InvalidRadiusRange {
        /// Lower bound (`radius`).
        min: f32,
        /// Upper bound (`radius_max`).
        max: f32,
    },
    /// A disc of this radius cannot fit between opposite walls.
    #[error("radius {radius} does not fit inside {width}x{height}")]
    RadiusExceedsBounds {
        /// Largest radius the config can produce.
        radius: f32,
        /// Plane width.
        width: f32,
        /// Plane height.
        height: f32,
    },
    /// `max_speed` was negative or non-finite.
    #[error("max_speed must be finite and non-negative, got {0}")]
    InvalidSpeed(f32),
    /// `workers` was zero.
    #[error("workers must be at least 1")]
    NoWorkers,
    /// `claim_batch` was zero.
    #[error("claim_batch must be at least 1")]
    InvalidClaimBatch,
    /// Grid spacing or margin was unusable.
    #[error("grid needs finite spacing > 0 and margin >= 0, got spacing {spacing}, margin {margin}")]
    InvalidGrid {
        /// Requested spacing.
        spacing: f32,
        /// Requested margin.
        margin: f32,
    },
    /// The grid lattice cannot hold every body inside the bounds.
    #[error("grid holds {capacity} bodies, {requested} requested")]
    GridTooSmall {
        /// Lattice points available.
        capacity: usize,
        /// Bodies requested.
        requested: usize,
    },
    /// An explicitly supplied body was unusable.
    #[error("body {index}: {reason}")]
    InvalidBody {
        /// Position in the supplied list.
        index: usize,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// How bodies are laid out by [`crate::Simulation::new`].
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Uniform random positions that keep each disc inside the bounds.
    #[default]
    Random,
    /// Lattice starting at `margin` on both axes, stepping `spacing`.
    Grid {
        /// Distance between neighbouring lattice points.
        spacing: f32,
        /// Offset of the first lattice point from the walls at zero.
        margin: f32,
    },
}

impl Placement {
    /// Grid with 50-unit spacing starting 20 units from the walls.
    pub const fn grid() -> Self {
        Self::Grid { spacing: 50.0, margin: 20.0 }
    }
}

/// How newly detected contacts are resolved within a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactOrdering {
    /// Parallel detection, then body-disjoint rounds in `(lo, hi)` order.
    /// Bit-identical for any worker count.
    #[default]
    Canonical,
    /// Detect and resolve in one pass under the pair locks. Race-free, but a
    /// body with several new contacts sees them in scheduling order.
    Eager,
}

/// Everything needed to build a [`crate::Simulation`].
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Number of bodies; fixed for the life of the simulation.
    pub body_count: usize,
    /// Plane extents.
    pub bounds: Bounds,
    /// Body radius, or the lower radius bound when `radius_max` is set.
    pub radius: f32,
    /// Upper radius bound; radii are drawn uniformly when present.
    pub radius_max: Option<f32>,
    /// Velocity components are drawn from `[-max_speed, max_speed]`.
    pub max_speed: f32,
    /// Seed for placement; same seed, same initial state.
    pub seed: u64,
    /// Worker threads in the pool.
    pub workers: usize,
    /// Initial layout.
    pub placement: Placement,
    /// Contact resolution order.
    pub ordering: ContactOrdering,
    /// Pair indices claimed per cursor increment.
    pub claim_batch: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            body_count: 400,
            bounds: Bounds::default(),
            radius: 5.0,
            radius_max: None,
            max_speed: 1.0,
            seed: 42,
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            placement: Placement::Random,
            ordering: ContactOrdering::Canonical,
            claim_batch: 256,
        }
    }
}

impl SimConfig {
    /// Default configuration with the three required inputs filled in.
    pub fn new(body_count: usize, bounds: Bounds, seed: u64) -> Self {
        Self { body_count, bounds, seed, ..Self::default() }
    }

    /// Checks every field; the first problem found is returned.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] variant describing the invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.body_count == 0 {
            return Err(ConfigError::NoBodies);
        }
        if self.body_count > MAX_BODIES {
            return Err(ConfigError::TooManyBodies { count: self.body_count, max: MAX_BODIES });
        }
        if !self.bounds.is_valid() {
            return Err(ConfigError::InvalidBounds {
                width: self.bounds.width,
                height: self.bounds.height,
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        if let Some(max) = self.radius_max {
            if !max.is_finite() {
                return Err(ConfigError::InvalidRadius(max));
            }
            if max < self.radius {
                return Err(ConfigError::InvalidRadiusRange { min: self.radius, max });
            }
        }
        let radius = self.radius_max.unwrap_or(self.radius);
        if !self.bounds.fits(radius) {
            return Err(ConfigError::RadiusExceedsBounds {
                radius,
                width: self.bounds.width,
                height: self.bounds.height,
            });
        }
        if !(self.max_speed.is_finite() && self.max_speed >= 0.0) {
            return Err(ConfigError::InvalidSpeed(self.max_speed));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.claim_batch == 0 {
            return Err(ConfigError::InvalidClaimBatch);
        }
        if let Placement::Grid { spacing, margin } = self.placement {
            let capacity = placement::grid_capacity(self.bounds, spacing, margin)?;
            if capacity < self.body_count {
                return Err(ConfigError::GridTooSmall { capacity, requested: self.body_count });
            }
        }
        Ok(())
    }

    /// Parses a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serde`] for malformed JSON or unknown fields.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serde`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    /// Returns I/O, parse, or validation errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        let config = Self::from_json_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    ///
    /// # Errors
    /// Returns I/O or serialization errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
