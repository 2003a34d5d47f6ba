//! Benchmarks for the scheduler's core loops: push/pop throughput on
//! a single deque, and a small fan-out/wait workload through a fleet.

use bencher::{benchmark_group, benchmark_main, Bencher};

use abp::{current_task, schedule_child, wait, FleetConfig, Task, TaskRef};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn bench_deque_push_pop(b: &mut Bencher) {
    let deque: abp::deque::Deque<i64> = abp::deque::Deque::new(1024);
    b.iter(|| {
        for i in 0..512 {
            deque.push(i).unwrap();
        }
        for _ in 0..512 {
            deque.pop().unwrap();
        }
    });
}

fn bench_deque_steal(b: &mut Bencher) {
    let deque: abp::deque::Deque<i64> = abp::deque::Deque::new(1024);
    b.iter(|| {
        for i in 0..512 {
            deque.push(i).unwrap();
        }
        for _ in 0..512 {
            let _ = deque.steal();
        }
    });
}

fn bench_fanout_wait(b: &mut Bencher) {
    let fleet = abp::Fleet::start(FleetConfig::new().num_workers(4));
    let done = Arc::new(AtomicUsize::new(0));

    b.iter(|| {
        let done = Arc::clone(&done);
        let root = Box::new(Task::new(move || {
            let root_ref = current_task().unwrap();
            let mut children = Vec::new();
            let mut refs = Vec::new();
            for _ in 0..16 {
                let done = Arc::clone(&done);
                let child = Box::new(Task::with_parent(
                    move || {
                        done.fetch_add(1, Ordering::Relaxed);
                    },
                    root_ref,
                ));
                refs.push(TaskRef::from_ref(&child));
                children.push(child);
            }
            for r in &refs {
                schedule_child(root_ref, *r).unwrap();
            }
            for r in &refs {
                wait(*r).unwrap();
            }
        }));
        let root_ref = TaskRef::from_ref(&root);
        fleet.submit_root(0, root_ref).unwrap();
        while !root_ref.is_done() {
            std::thread::yield_now();
        }
    });

    fleet.stop();
}

benchmark_group!(benches, bench_deque_push_pop, bench_deque_steal, bench_fanout_wait);
benchmark_main!(benches);
