// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-body and per-pair physics kernels.
//!
//! Every function here is a pure function of the bodies it is handed (plus the
//! latch entry for the pair, in `detect`). Scheduling and locking live in
//! [`crate::par`].

mod detect;
mod integrate;
mod resolve;

pub use detect::{detect, Contact};
pub use integrate::integrate;
pub use resolve::{elastic_response, resolve};
