//! The scheduler façade: the global fleet of deques and the
//! start/submit/stop lifecycle around it.
//!
//! This is process-wide state with an explicit start/stop lifecycle —
//! deliberately not a lazily-initialised global, so construction order
//! and shutdown are both visible at the call site.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::FleetConfig;
use crate::deque::Deque;
use crate::error::{Result, SchedulerError};
use crate::task::TaskRef;
use crate::worker;

/// State shared by every worker thread in a fleet: the deques
/// themselves, indexed by worker id, plus the shutdown flag and the
/// steal back-off threshold from the fleet's [`FleetConfig`].
pub(crate) struct FleetShared {
    pub(crate) deques: Box<[Deque<TaskRef>]>,
    pub(crate) done: AtomicBool,
    pub(crate) max_steal_attempts: usize,
}

/// A running fleet of worker threads, each bound to its own deque.
///
/// Dropping a `Fleet` without calling [`Fleet::stop`] leaks the worker
/// threads (they are simply detached); call `stop` to shut them down
/// and reclaim the `JoinHandle`s deterministically.
pub struct Fleet {
    shared: Arc<FleetShared>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl Fleet {
    /// Spawns `config.num_workers` worker threads, each bound to its
    /// own fixed-capacity deque.
    pub fn start(config: FleetConfig) -> Self {
        let deques = (0..config.num_workers)
            .map(|_| Deque::new(config.deque_capacity))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let shared = Arc::new(FleetShared {
            deques,
            done: AtomicBool::new(false),
            max_steal_attempts: config.max_steal_attempts,
        });

        let workers = (0..config.num_workers)
            .map(|id| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("abp-worker-{id}"))
                    .spawn(move || worker::run(id, shared))
                    .expect("failed to spawn worker thread")
            })
            .collect::<Vec<_>>();

        tracing::debug!(num_workers = config.num_workers, "fleet started");

        Self {
            shared,
            workers: parking_lot::Mutex::new(workers),
        }
    }

    /// Number of workers (and deques) in this fleet.
    pub fn num_workers(&self) -> usize {
        self.shared.deques.len()
    }

    /// Places a root task on the specified worker's deque. Callable
    /// from the driver thread (i.e. does not require a worker
    /// thread-local context), unlike [`crate::schedule`].
    pub fn submit_root(&self, worker_id: usize, task: TaskRef) -> Result<()> {
        if self.shared.done.load(Ordering::Relaxed) {
            return Err(SchedulerError::AlreadyStopped);
        }
        self.shared.deques[worker_id]
            .push(task)
            .map_err(|_| SchedulerError::Overflow { worker_id })
    }

    /// Raises the shutdown flag and joins every worker thread.
    ///
    /// In-flight tasks are allowed to run to completion; no new pops
    /// are attempted once a worker observes `done`. Submissions racing
    /// with this call may be dropped — the core gives no delivery
    /// guarantee once shutdown has started.
    pub fn stop(self) {
        self.shared.done.store(true, Ordering::Relaxed);
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        tracing::debug!("fleet stopped");
    }
}
