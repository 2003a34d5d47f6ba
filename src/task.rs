//! The unit of work: a payload closure, a parent back-reference, and
//! the atomic child counter that drives completion propagation.
//!
//! Storage discipline: the reference implementation constructs child
//! tasks as locals of the parent's payload and takes their addresses,
//! which is unsound once the parent's stack frame can return before a
//! descendant actually finishes. This port instead requires the caller
//! to own every `Task` behind stable storage (a `Box`, an arena slot,
//! anything that outlives the `wait` loop watching it) and hands the
//! scheduler only a thin, non-owning [`TaskRef`] to reach it through.

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};

/// A boxed nullary closure: the task's payload plus whatever data it
/// closed over.
type Payload = Box<dyn FnOnce() + Send>;

/// A unit of schedulable work.
///
/// `Task` is built by the caller and placed behind caller-owned
/// storage; the scheduler reaches it only through [`TaskRef`] handles,
/// never by value.
pub struct Task {
    payload: parking_lot::Mutex<Option<Payload>>,
    parent: Option<TaskRef>,
    child_count: AtomicIsize,
    done: AtomicBool,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("child_count", &self.child_count.load(Ordering::SeqCst))
            .field("done", &self.done.load(Ordering::SeqCst))
            .finish()
    }
}

impl Task {
    /// Creates a root task (no parent) from a payload closure.
    pub fn new<F>(payload: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            payload: parking_lot::Mutex::new(Some(Box::new(payload))),
            parent: None,
            child_count: AtomicIsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    /// Creates a task that will report completion to `parent` once this
    /// task and all of *its* descendants are done. Prefer
    /// [`crate::scheduler::schedule_child`] over constructing this by
    /// hand — it also performs the child-count increment in the
    /// required order.
    pub fn with_parent<F>(payload: F, parent: TaskRef) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            payload: parking_lot::Mutex::new(Some(Box::new(payload))),
            parent: Some(parent),
            child_count: AtomicIsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    pub(crate) fn parent(&self) -> Option<TaskRef> {
        self.parent
    }

    /// Atomically records one more live descendant. Must happen-before
    /// the child is published to any deque.
    pub(crate) fn increment_children(&self) {
        self.child_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Invokes the payload exactly once, then marks this task done and
    /// cascades completion to the parent if this task (including its
    /// descendants) is now fully done.
    pub(crate) fn run(&self) {
        let payload = self
            .payload
            .lock()
            .take()
            .expect("Task::run called more than once");
        payload();
        // Release: the payload's writes must be visible to any thread
        // that subsequently observes `done == true`.
        self.done.store(true, Ordering::Release);
        if self.is_done() {
            if let Some(parent) = self.parent {
                // Safety: the parent outlives its children by contract
                // (documented on `TaskRef`).
                unsafe { parent.as_ref() }.decrement_children();
            }
        }
    }

    /// Atomic decrement of the child counter; if this task's own
    /// payload has already returned and the counter has now reached
    /// zero, cascades completion to this task's own parent in turn.
    pub(crate) fn decrement_children(&self) {
        // Release so a waiter that observes the post-decrement zero also
        // observes everything the finishing child published.
        let previous = self.child_count.fetch_sub(1, Ordering::Release);
        debug_assert!(previous > 0, "child_count went negative");
        if self.is_done() {
            if let Some(parent) = self.parent {
                unsafe { parent.as_ref() }.decrement_children();
            }
        }
    }

    /// True once the payload has returned and every descendant has
    /// also completed.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire) && self.child_count.load(Ordering::Acquire) == 0
    }
}

/// A thin, `Copy`able, non-owning handle to a caller-owned [`Task`].
///
/// `TaskRef` never drops or frees the task it points to; the caller is
/// responsible for keeping the backing storage alive until
/// [`Task::is_done`] is observed true for it and for every task that
/// names it as a parent.
///
/// # Safety contract
/// The pointee must remain valid and at a stable address for as long
/// as any `TaskRef` to it (or to a descendant naming it as parent) may
/// still be reached by a worker thread.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TaskRef(NonNull<Task>);

impl TaskRef {
    /// Wraps a caller-owned task.
    ///
    /// # Safety
    /// `task` must point to a `Task` that will remain valid (not moved,
    /// not dropped) until it — and every task that transitively
    /// schedules it as a child — is done.
    pub unsafe fn new(task: NonNull<Task>) -> Self {
        Self(task)
    }

    /// Convenience constructor from a `&'static` or otherwise
    /// caller-pinned reference.
    pub fn from_ref(task: &Task) -> Self {
        // Safety: references are always non-null and valid for the
        // lifetime of the borrow; the caller upholds the rest of the
        // `TaskRef` contract by holding `task` alive.
        Self(NonNull::from(task))
    }

    /// # Safety
    /// The pointee must still be alive and not mutably aliased outside
    /// of the scheduler's own synchronisation.
    pub(crate) unsafe fn as_ref(&self) -> &Task {
        unsafe { self.0.as_ref() }
    }

    /// True once the pointee's payload has returned and every
    /// descendant has also completed. See [`Task::is_done`].
    pub fn is_done(&self) -> bool {
        unsafe { self.as_ref() }.is_done()
    }
}

// Safety: all mutable state inside `Task` is reached through atomics
// or a `parking_lot::Mutex`; `TaskRef` is just a pointer to it.
unsafe impl Send for TaskRef {}
unsafe impl Sync for TaskRef {}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskRef({:p})", self.0.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn root_task_is_done_after_run() {
        let task = Task::new(|| {});
        let task_ref = TaskRef::from_ref(&task);
        assert!(!task_ref.is_done());
        task.run();
        assert!(task_ref.is_done());
    }

    #[test]
    fn parent_waits_for_child_count() {
        let ran = Arc::new(AtomicUsize::new(0));
        let parent = Task::new({
            let ran = Arc::clone(&ran);
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }
        });
        let parent_ref = TaskRef::from_ref(&parent);

        parent.increment_children();
        let child = Task::with_parent(|| {}, parent_ref);
        let child_ref = TaskRef::from_ref(&child);

        parent.run();
        // Parent's own payload has run, but a child is still outstanding.
        assert!(!parent_ref.is_done());

        child.run();
        assert!(child_ref.is_done());
        assert!(parent_ref.is_done());
    }

    #[test]
    fn child_count_never_negative() {
        let task = Task::new(|| {});
        task.increment_children();
        task.decrement_children();
        assert_eq!(task.child_count.load(Ordering::SeqCst), 0);
    }
}
