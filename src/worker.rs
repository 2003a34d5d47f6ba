//! The per-thread worker loop: execute → drain-local → steal, plus the
//! cooperative `wait` that lets a task block on descendants without
//! blocking its OS thread.
//!
//! Worker-scoped state (which deque is "mine", which task is currently
//! running) lives in a thread-local so `schedule`/`schedule_child`/`wait`
//! can locate the caller's deque without threading a parameter through
//! every payload closure — exactly the shape of the reference
//! implementation's `thread_local static localPool` / `currentTask`.

use std::cell::{Cell, RefCell};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_utils::Backoff;

use crate::deque::StealOutcome;
use crate::error::{Result, SchedulerError};
use crate::scheduler::FleetShared;
use crate::task::TaskRef;

thread_local! {
    static CURRENT: RefCell<Option<WorkerContext>> = RefCell::new(None);
}

struct WorkerContext {
    id: usize,
    fleet: Arc<FleetShared>,
    rng: RefCell<fastrand::Rng>,
    current_task: Cell<Option<TaskRef>>,
}

impl WorkerContext {
    fn deque(&self) -> &crate::deque::Deque<TaskRef> {
        &self.fleet.deques[self.id]
    }

    fn push_local(&self, task: TaskRef) -> Result<()> {
        self.deque()
            .push(task)
            .map_err(|_| SchedulerError::Overflow { worker_id: self.id })
    }

    /// Picks a uniformly random victim in `[0, N)` — may be `self`,
    /// which is accepted as a harmless no-op steal attempt.
    fn random_victim(&self) -> usize {
        self.rng.borrow_mut().usize(0..self.fleet.deques.len())
    }

    fn try_steal_once(&self) -> Option<TaskRef> {
        let victim = self.random_victim();
        match self.fleet.deques[victim].steal() {
            StealOutcome::Success(task) => Some(task),
            StealOutcome::Empty | StealOutcome::Abort => None,
        }
    }
}

/// Runs a worker's main loop until the fleet's shutdown flag is
/// observed. Called once per worker thread by
/// [`crate::scheduler::Fleet::start`].
pub(crate) fn run(id: usize, fleet: Arc<FleetShared>) {
    let seed = (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    let ctx = WorkerContext {
        id,
        fleet: Arc::clone(&fleet),
        rng: RefCell::new(fastrand::Rng::with_seed(seed)),
        current_task: Cell::new(None),
    };
    CURRENT.with(|c| *c.borrow_mut() = Some(ctx));
    tracing::debug!(worker_id = id, "worker started");

    let backoff = Backoff::new();
    let mut failed_steals = 0usize;

    'outer: loop {
        if fleet.done.load(Ordering::Relaxed) {
            break;
        }

        loop {
            let task = CURRENT.with(|c| c.borrow().as_ref().unwrap().deque().pop());
            match task {
                Some(task) => {
                    execute(task);
                    backoff.reset();
                    failed_steals = 0;
                    if fleet.done.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                }
                None => break,
            }
        }

        if fleet.done.load(Ordering::Relaxed) {
            break;
        }

        let stolen = CURRENT.with(|c| c.borrow().as_ref().unwrap().try_steal_once());
        match stolen {
            Some(task) => {
                execute(task);
                backoff.reset();
                failed_steals = 0;
            }
            None => {
                failed_steals += 1;
                if failed_steals >= fleet.max_steal_attempts {
                    tracing::trace!(worker_id = id, "backing off after repeated failed steals");
                    backoff.snooze();
                } else {
                    std::thread::yield_now();
                }
            }
        }
    }

    CURRENT.with(|c| *c.borrow_mut() = None);
    tracing::debug!(worker_id = id, "worker stopped");
}

/// Sets `task` as this worker's current task and runs it to
/// completion, including the parent-completion cascade.
fn execute(task: TaskRef) {
    CURRENT.with(|c| {
        let borrowed = c.borrow();
        let ctx = borrowed
            .as_ref()
            .expect("execute called outside of a worker thread");
        ctx.current_task.set(Some(task));
    });
    // Safety: the caller (this module) guarantees `task` came off a
    // deque, which only ever holds handles to storage the original
    // caller is contractually keeping alive.
    unsafe { task.as_ref() }.run();
}

/// Pushes `task` onto the current worker's deque. Must be called from
/// within a running task's payload (i.e. from a worker thread).
pub fn schedule(task: TaskRef) -> Result<()> {
    CURRENT.with(|c| {
        let borrowed = c.borrow();
        let ctx = borrowed.as_ref().ok_or(SchedulerError::NotAWorkerThread)?;
        ctx.push_local(task)
    })
}

/// Links `child` to `parent` and enqueues it on the current worker's
/// deque.
///
/// `child` must already have been constructed with `parent` as its
/// parent (e.g. via [`crate::task::Task::with_parent`]); this function
/// performs the child-count increment and the push, in that order, as
/// the protocol requires — a thief must never be able to run `child`
/// to completion and decrement a counter that hasn't been incremented
/// yet.
pub fn schedule_child(parent: TaskRef, child: TaskRef) -> Result<()> {
    debug_assert!(
        unsafe { child.as_ref() }.parent() == Some(parent),
        "schedule_child: child was not constructed with this parent"
    );
    // Safety: the parent outlives its children by contract.
    unsafe { parent.as_ref() }.increment_children();
    CURRENT.with(|c| {
        let borrowed = c.borrow();
        let ctx = borrowed.as_ref().ok_or(SchedulerError::NotAWorkerThread)?;
        ctx.push_local(child)
    })
}

/// Cooperatively waits for `target` to become done, keeping this
/// worker's OS thread busy with other work (local pops, then steals)
/// in the meantime rather than blocking it.
///
/// Returns immediately, without consuming any tasks, if `target` is
/// already done.
pub fn wait(target: TaskRef) -> Result<()> {
    let has_context = CURRENT.with(|c| c.borrow().is_some());
    if !has_context {
        return Err(SchedulerError::NotAWorkerThread);
    }

    let old_current = CURRENT.with(|c| c.borrow().as_ref().unwrap().current_task.get());

    while !target.is_done() {
        let task = CURRENT.with(|c| {
            let borrowed = c.borrow();
            let ctx = borrowed.as_ref().unwrap();
            ctx.deque().pop().or_else(|| ctx.try_steal_once())
        });
        if let Some(task) = task {
            execute(task);
        }
    }

    CURRENT.with(|c| c.borrow().as_ref().unwrap().current_task.set(old_current));
    Ok(())
}

/// The task currently executing on this worker, if any. `None` off a
/// worker thread, or on a worker that is between tasks.
pub fn current_task() -> Option<TaskRef> {
    CURRENT.with(|c| c.borrow().as_ref().and_then(|ctx| ctx.current_task.get()))
}
