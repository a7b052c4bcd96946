// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors surfaced by the simulation driver.

use thiserror::Error;

use crate::config::ConfigError;

/// Error type for constructing and driving a [`crate::Simulation`].
///
/// Worker panics are not represented here: they are re-raised on the driving
/// thread at the phase barrier.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration rejected before any thread was started.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {worker}")]
    Spawn {
        /// Index of the worker that could not be started.
        worker: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A body id outside the store was addressed.
    #[error("body {id} out of range for store of {len}")]
    BodyOutOfRange {
        /// Requested id.
        id: u32,
        /// Number of bodies in the store.
        len: usize,
    },
}
