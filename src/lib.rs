//! # abp - a work-stealing task scheduler
//!
//! `abp` schedules small units of work ("tasks") across a fixed fleet
//! of OS threads using the Arora-Blumofe-Plaxton lock-free
//! work-stealing deque: each worker treats its own deque as a LIFO
//! stack, while idle peers steal from the opposite end as a FIFO
//! queue. Tasks may spawn children and cooperatively wait on them
//! without blocking their worker thread.
//!
//! ## Example
//!
//! ```
//! use abp::{config::FleetConfig, scheduler::Fleet, task::{Task, TaskRef}};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let ran = Arc::new(AtomicBool::new(false));
//! let ran_in_task = Arc::clone(&ran);
//! let task = Box::new(Task::new(move || {
//!     ran_in_task.store(true, Ordering::SeqCst);
//! }));
//! let task_ref = TaskRef::from_ref(&task);
//!
//! let fleet = Fleet::start(FleetConfig::new().num_workers(2));
//! fleet.submit_root(0, task_ref).unwrap();
//!
//! while !task_ref.is_done() {
//!     std::thread::yield_now();
//! }
//! fleet.stop();
//!
//! assert!(ran.load(Ordering::SeqCst));
//! ```
//!
//! ## What this crate does not do
//!
//! There is no priority or fairness scheme beyond uniform random victim
//! selection, no unbounded growth of a deque past its fixed capacity,
//! no cross-process scheduling, and no preemption — tasks run to
//! completion once a worker starts them. There is also no config file,
//! environment variable, or wire format: tune a fleet through
//! [`config::FleetConfig`] at construction time.

pub mod config;
pub mod deque;
pub mod error;
pub mod scheduler;
pub mod task;
pub mod worker;

pub use config::FleetConfig;
pub use error::{Result, SchedulerError};
pub use scheduler::Fleet;
pub use task::{Task, TaskRef};
pub use worker::{current_task, schedule, schedule_child, wait};
