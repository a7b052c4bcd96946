// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parallel execution: work partitioning, the persistent worker pool, and
//! the per-phase jobs a tick is built from.

pub(crate) mod exec;
mod partition;
mod pool;

pub use partition::{decode_pair, pair_count, partition_ranges, PairRange};
pub use pool::{Job, WorkerPool, WorkerState};
