//! Behavioral scenarios shared by every lock's unit tests.
//!
//! Each scenario takes a constructor so it can build as many fresh
//! instances as it needs. Assertions that fire on worker threads surface
//! as a failed `join`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use crate::raw::RawRwLock;
use crate::stress::{stream_seed, xorshift64};
use crate::RwLock;

/// Upper bound on how long any single scenario may wait for progress.
const PROGRESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs every scenario that applies to all lock algorithms.
pub(crate) fn run_common_scenarios<L, F>(make: F)
where
    L: RawRwLock + 'static,
    F: Fn() -> L,
{
    mutual_exclusion(make());
    readers_run_concurrently(make());
    writer_wakes_after_readers_drain(make());
    randomized_round_trip(make());
    ten_readers_one_writer(make());
}

/// Writers never overlap each other or any reader.
fn mutual_exclusion<L: RawRwLock + 'static>(lock: L) {
    const WRITERS: usize = 3;
    const READERS: usize = 3;
    const ITERS: usize = 300;

    let lock = Arc::new(lock);
    let writers_inside = Arc::new(AtomicUsize::new(0));
    let readers_inside = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..WRITERS {
        let lock = Arc::clone(&lock);
        let writers_inside = Arc::clone(&writers_inside);
        let readers_inside = Arc::clone(&readers_inside);
        handles.push(thread::spawn(move || {
            for _ in 0..ITERS {
                lock.write_lock();
                let w = writers_inside.fetch_add(1, Ordering::SeqCst) + 1;
                assert_eq!(w, 1, "two writers inside");
                assert_eq!(readers_inside.load(Ordering::SeqCst), 0, "writer overlaps reader");
                thread::yield_now();
                writers_inside.fetch_sub(1, Ordering::SeqCst);
                lock.write_unlock();
            }
        }));
    }
    for _ in 0..READERS {
        let lock = Arc::clone(&lock);
        let writers_inside = Arc::clone(&writers_inside);
        let readers_inside = Arc::clone(&readers_inside);
        handles.push(thread::spawn(move || {
            for _ in 0..ITERS {
                lock.read_lock();
                readers_inside.fetch_add(1, Ordering::SeqCst);
                assert_eq!(writers_inside.load(Ordering::SeqCst), 0, "reader overlaps writer");
                thread::yield_now();
                readers_inside.fetch_sub(1, Ordering::SeqCst);
                lock.read_unlock();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert!(lock.is_idle());
}

/// Several readers hold the lock at the same time.
fn readers_run_concurrently<L: RawRwLock + 'static>(lock: L) {
    const READERS: usize = 4;

    let lock = Arc::new(lock);
    // Every reader must be inside before any can pass.
    let all_inside = Arc::new(Barrier::new(READERS));
    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let all_inside = Arc::clone(&all_inside);
            thread::spawn(move || {
                lock.read_lock();
                all_inside.wait();
                lock.read_unlock();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(lock.is_idle());
}

/// A writer blocked behind readers is woken once they all leave.
fn writer_wakes_after_readers_drain<L: RawRwLock + 'static>(lock: L) {
    const READERS: usize = 8;

    let lock = Arc::new(lock);
    let entered = Arc::new(Barrier::new(READERS + 1));
    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                lock.read_lock();
                entered.wait();
                thread::sleep(Duration::from_millis(1));
                lock.read_unlock();
            })
        })
        .collect();
    entered.wait();

    let (done_tx, done_rx) = mpsc::channel();
    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            lock.write_lock();
            lock.write_unlock();
            done_tx.send(()).unwrap();
        })
    };

    done_rx
        .recv_timeout(PROGRESS_TIMEOUT)
        .expect("writer was never woken after readers left");
    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert!(lock.is_idle());
}

/// Random interleavings of guarded reads and writes leave the lock back
/// at its unlocked baseline and lose no write.
fn randomized_round_trip<L: RawRwLock + 'static>(lock: L) {
    const THREADS: u64 = 6;
    const OPS: usize = 300;

    let shared = Arc::new(RwLock::new(lock, 0u64));
    let writes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let shared = Arc::clone(&shared);
            let writes = Arc::clone(&writes);
            thread::spawn(move || {
                let mut rng = stream_seed(0x5EED, t);
                for _ in 0..OPS {
                    rng = xorshift64(rng);
                    if rng % 4 == 0 {
                        *shared.write() += 1;
                        writes.fetch_add(1, Ordering::Relaxed);
                    } else {
                        let before = *shared.read();
                        // Value cannot change under a read guard.
                        let guard = shared.read();
                        let a = *guard;
                        thread::yield_now();
                        assert_eq!(a, *guard);
                        assert!(a >= before);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(*shared.read(), writes.load(Ordering::Relaxed) as u64);
    assert!(shared.raw().is_idle());
}

/// Ten readers cycle `read_lock; sleep 1ms; read_unlock` while a single
/// writer enters once, 5ms in. The writer sees zero readers and its
/// increment lands exactly once.
fn ten_readers_one_writer<L: RawRwLock + 'static>(lock: L) {
    const READERS: usize = 10;
    const ROUNDS: usize = 10;

    let lock = Arc::new(lock);
    let readers_inside = Arc::new(AtomicUsize::new(0));
    let counter = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let readers_inside = Arc::clone(&readers_inside);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    lock.read_lock();
                    readers_inside.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    readers_inside.fetch_sub(1, Ordering::SeqCst);
                    lock.read_unlock();
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(5));
    lock.write_lock();
    let observed = readers_inside.load(Ordering::SeqCst);
    counter.fetch_add(1, Ordering::SeqCst);
    lock.write_unlock();

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(observed, 0, "writer saw readers inside its critical section");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(lock.is_idle());
}

/// Once a writer has announced intent, a reader that arrives afterwards
/// is not admitted before the writer's critical section completes.
///
/// Only meaningful for writer-preferring algorithms; a reader-preferring
/// lock lets the late reader straight in.
pub(crate) fn writer_blocks_later_readers<L, F>(make: F)
where
    L: RawRwLock + 'static,
    F: Fn() -> L,
{
    // Long enough for a freshly spawned thread to reach its blocking point.
    const SETTLE: Duration = Duration::from_millis(30);

    let lock = Arc::new(make());
    let events = Arc::new(Mutex::new(Vec::new()));

    // An early reader keeps the writer waiting.
    lock.read_lock();

    let writer = {
        let lock = Arc::clone(&lock);
        let events = Arc::clone(&events);
        thread::spawn(move || {
            lock.write_lock();
            events.lock().unwrap().push("writer-in");
            thread::sleep(Duration::from_millis(10));
            events.lock().unwrap().push("writer-out");
            lock.write_unlock();
        })
    };
    thread::sleep(SETTLE);

    let late_reader = {
        let lock = Arc::clone(&lock);
        let events = Arc::clone(&events);
        thread::spawn(move || {
            lock.read_lock();
            events.lock().unwrap().push("reader-in");
            lock.read_unlock();
        })
    };
    thread::sleep(SETTLE);
    assert!(
        events.lock().unwrap().is_empty(),
        "late reader admitted while a writer was pending"
    );

    lock.read_unlock();
    writer.join().unwrap();
    late_reader.join().unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        ["writer-in", "writer-out", "reader-in"]
    );
    assert!(lock.is_idle());
}
