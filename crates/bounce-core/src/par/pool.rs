// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistent worker pool driven one phase at a time.
//!
//! Workers are spawned once and parked on a condition variable between
//! phases. [`WorkerPool::run_phase`] publishes a job, wakes every worker, and
//! blocks until all of them have finished it; that return is the phase
//! barrier. Nothing from phase `k + 1` can start before every worker has left
//! phase `k`.
//!
//! A job is called once per worker with the worker's index. Jobs own what they
//! touch (typically `Arc` clones); each worker drops its handle to the job
//! before reporting completion, so once `run_phase` returns no worker retains
//! a reference to anything the job captured.

use std::any::Any;
use std::io;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{error, info, trace};

use crate::error::SimError;

/// Work executed by every worker for one phase. The argument is the worker index.
pub type Job = Arc<dyn Fn(usize) + Send + Sync>;

/// Lifecycle of one worker thread.
///
/// `Idle → Running → Idle` once per phase; `Idle → Stopping → Terminated` on
/// shutdown.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerState {
    /// Parked, waiting for the next phase.
    Idle,
    /// Executing the current phase's job.
    Running,
    /// Observed the stop flag and is leaving its loop.
    Stopping,
    /// Thread has exited its loop.
    Terminated,
}

struct PoolState {
    job: Option<Job>,
    /// Incremented for every published phase; workers run each generation once.
    generation: u64,
    /// Workers that have not yet finished the current generation.
    pending: usize,
    stop: bool,
    panic: Option<Box<dyn Any + Send>>,
    workers: Vec<WorkerState>,
}

struct Shared {
    state: Mutex<PoolState>,
    wake: Condvar,
    done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, index: usize, next: WorkerState) {
        self.lock().workers[index] = next;
        trace!(worker = index, state = ?next, "worker state");
    }
}

/// Fixed set of worker threads that execute phases on demand.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.handles.len())
            .field("states", &self.worker_states())
            .finish()
    }
}

impl WorkerPool {
    /// Spawns `workers` threads named `bounce-worker-{i}`.
    ///
    /// If any spawn fails, the threads already started are stopped and joined
    /// before the error is returned.
    ///
    /// # Panics
    /// Panics if `workers == 0`.
    ///
    /// # Errors
    /// Returns [`SimError::Spawn`] when the OS refuses a thread.
    pub fn new(workers: usize) -> Result<Self, SimError> {
        Self::spawn_with(workers, |index, body| {
            thread::Builder::new().name(format!("bounce-worker-{index}")).spawn(body)
        })
    }

    /// Starts `workers` threads through `spawn`, which receives the worker
    /// index and the loop to run on the new thread.
    fn spawn_with<F>(workers: usize, mut spawn: F) -> Result<Self, SimError>
    where
        F: FnMut(usize, Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>>,
    {
        assert!(workers > 0, "workers must be > 0");
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                job: None,
                generation: 0,
                pending: 0,
                stop: false,
                panic: None,
                workers: vec![WorkerState::Idle; workers],
            }),
            wake: Condvar::new(),
            done: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let worker_shared = Arc::clone(&shared);
            match spawn(index, Box::new(move || worker_loop(index, &worker_shared))) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    error!(worker = index, %source, "worker spawn failed");
                    let mut partial = Self { shared, handles };
                    partial.shutdown();
                    return Err(SimError::Spawn { worker: index, source });
                }
            }
        }

        info!(workers, "worker pool started");
        Ok(Self { shared, handles })
    }

    /// Number of worker threads (zero after shutdown).
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Current state of every worker, by index.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.shared.lock().workers.clone()
    }

    /// Runs `job` on every worker and waits for all of them to finish.
    ///
    /// If a worker panicked inside the job, the first panic payload is
    /// re-raised here after the barrier, so the pool is idle again when the
    /// caller unwinds.
    ///
    /// # Panics
    /// Panics if the pool has been shut down, or re-raises a worker panic.
    pub fn run_phase(&self, job: Job) {
        assert!(!self.handles.is_empty(), "worker pool has been shut down");
        let mut st = self.shared.lock();
        st.job = Some(job);
        st.generation = st.generation.wrapping_add(1);
        st.pending = self.handles.len();
        self.shared.wake.notify_all();
        while st.pending > 0 {
            st = self
                .shared
                .done
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
        st.job = None;
        let panic = st.panic.take();
        drop(st);
        if let Some(payload) = panic {
            resume_unwind(payload);
        }
    }

    /// Stops and joins every worker. Idempotent.
    pub fn shutdown(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.shared.lock().stop = true;
        self.shared.wake.notify_all();
        let count = self.handles.len();
        for (index, handle) in self.handles.drain(..).enumerate() {
            if handle.join().is_err() {
                error!(worker = index, "worker thread exited abnormally");
            }
        }
        info!(workers = count, "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, shared: &Shared) {
    let mut seen = 0u64;
    loop {
        let job = {
            let mut st = shared.lock();
            while st.generation == seen && !st.stop {
                st = shared.wake.wait(st).unwrap_or_else(PoisonError::into_inner);
            }
            if st.generation == seen {
                // Woken by stop with no phase pending.
                break;
            }
            seen = st.generation;
            st.workers[index] = WorkerState::Running;
            st.job.clone()
        };
        trace!(worker = index, generation = seen, "phase start");

        let outcome = job.map_or(Ok(()), |job| catch_unwind(AssertUnwindSafe(|| job(index))));

        let mut st = shared.lock();
        if let Err(payload) = outcome {
            if st.panic.is_none() {
                st.panic = Some(payload);
            }
        }
        st.workers[index] = WorkerState::Idle;
        st.pending -= 1;
        if st.pending == 0 {
            shared.done.notify_all();
        }
    }
    shared.set_state(index, WorkerState::Stopping);
    shared.set_state(index, WorkerState::Terminated);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_worker_runs_each_phase_once() {
        let pool = WorkerPool::new(4).unwrap();
        let hits: Arc<Vec<AtomicUsize>> = Arc::new((0..4).map(|_| AtomicUsize::new(0)).collect());
        for _ in 0..10 {
            let hits = Arc::clone(&hits);
            pool.run_phase(Arc::new(move |w| {
                hits[w].fetch_add(1, Ordering::Relaxed);
            }));
        }
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 10));
    }

    #[test]
    fn run_phase_is_a_barrier() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for phase in 1..=5 {
            let c = Arc::clone(&counter);
            pool.run_phase(Arc::new(move |_| {
                std::thread::sleep(std::time::Duration::from_millis(1));
                c.fetch_add(1, Ordering::SeqCst);
            }));
            assert_eq!(counter.load(Ordering::SeqCst), phase * 3);
        }
    }

    #[test]
    fn job_captures_are_released_after_the_phase() {
        let pool = WorkerPool::new(2).unwrap();
        let owned = Arc::new(());
        let captured = Arc::clone(&owned);
        pool.run_phase(Arc::new(move |_| {
            let _ = &captured;
        }));
        assert_eq!(Arc::strong_count(&owned), 1);
    }

    #[test]
    fn worker_panic_is_reraised_and_pool_survives() {
        let pool = WorkerPool::new(2).unwrap();
        let result = catch_unwind(AssertUnwindSafe(|| {
            pool.run_phase(Arc::new(|w| assert_ne!(w, 1, "worker one fails")));
        }));
        assert!(result.is_err());
        assert_eq!(pool.worker_states(), vec![WorkerState::Idle; 2]);

        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.run_phase(Arc::new(move |_| {
            r.fetch_add(1, Ordering::Relaxed);
        }));
        assert_eq!(ran.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn shutdown_terminates_every_worker_and_is_idempotent() {
        let mut pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.worker_states(), vec![WorkerState::Idle; 3]);
        pool.shutdown();
        assert_eq!(pool.workers(), 0);
        assert_eq!(pool.worker_states(), vec![WorkerState::Terminated; 3]);
        pool.shutdown();
    }

    #[test]
    fn failed_spawn_joins_the_workers_already_started() {
        let exited = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&exited);
        let result = WorkerPool::spawn_with(4, move |index, body| {
            if index == 2 {
                return Err(io::Error::other("thread limit reached"));
            }
            let seen = Arc::clone(&seen);
            thread::Builder::new().spawn(move || {
                body();
                seen.fetch_add(1, Ordering::SeqCst);
            })
        });
        let Err(SimError::Spawn { worker, source }) = result else {
            panic!("expected a spawn failure");
        };
        assert_eq!(worker, 2);
        assert_eq!(source.to_string(), "thread limit reached");
        assert_eq!(exited.load(Ordering::SeqCst), 2);
    }
}
