//! Error types for the scheduler.
//!
//! Contract violations (overflow, calling scheduler entry points off a
//! worker thread, submitting after shutdown) are reported through this
//! type rather than aborting, so a host application can decide how to
//! react instead of inheriting the reference implementation's
//! "implementer's choice" of undefined behaviour.

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors surfaced by the scheduler's public entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// Push attempted on a deque that is already at capacity.
    #[error("worker {worker_id} deque overflow: push attempted at capacity")]
    Overflow {
        /// The owner whose deque overflowed.
        worker_id: usize,
    },

    /// `schedule`, `schedule_child`, or `wait` was called from a thread
    /// that is not running as a scheduler worker.
    #[error("scheduler entry point called from a non-worker thread")]
    NotAWorkerThread,

    /// A root task was submitted after the fleet's shutdown flag was raised.
    #[error("submit_root called after fleet shutdown was requested")]
    AlreadyStopped,
}
