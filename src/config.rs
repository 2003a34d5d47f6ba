//! Construction-time tuning for a [`crate::scheduler::Fleet`].
//!
//! Everything here is plain in-process state set up before
//! [`Fleet::start`](crate::scheduler::Fleet::start) is called — there is
//! no config file or environment variable in this crate, per the
//! non-goals; a host binary that wants file- or env-driven tuning reads
//! those itself and fills in a `FleetConfig`.

/// Tuning knobs for a worker fleet.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Number of worker threads (and, 1:1, deques) in the fleet.
    pub(crate) num_workers: usize,
    /// Fixed capacity of each worker's local deque.
    pub(crate) deque_capacity: usize,
    /// Consecutive failed steal attempts a worker tolerates before it
    /// starts backing off instead of spinning hot.
    pub(crate) max_steal_attempts: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            deque_capacity: 32,
            max_steal_attempts: 32,
        }
    }
}

impl FleetConfig {
    /// Starts from [`FleetConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count. Clamped to at least 1.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n.max(1);
        self
    }

    /// Sets each worker's deque capacity. Rounded up to the next power
    /// of two, as the ABP protocol's slot indexing expects.
    pub fn deque_capacity(mut self, n: usize) -> Self {
        self.deque_capacity = n.max(1).next_power_of_two();
        self
    }

    /// Sets how many consecutive failed steals a worker tolerates
    /// before backing off.
    pub fn max_steal_attempts(mut self, n: usize) -> Self {
        self.max_steal_attempts = n.max(1);
        self
    }
}
