use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use redis_mutex::Lease;

use crate::mutex;

// =============================================================================
// Many callers on one key
// =============================================================================

#[test]
fn at_most_one_caller_inside_work() {
    let m = mutex();
    let inside = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                m.synchronise(
                    "shared",
                    Duration::from_secs(10),
                    Duration::from_millis(5),
                    || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        completed.fetch_add(1, Ordering::SeqCst);
                    },
                )
                .unwrap();
            });
        }
    });

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 8);
    assert!(!m.store().is_held(&m.key("shared")));
}

#[test]
fn waiter_acquires_soon_after_release() {
    let m = mutex();
    let check = Duration::from_millis(50);
    let hold = Duration::from_millis(200);

    thread::scope(|s| {
        let holder = m.acquire("action_save", Duration::from_secs(30), check).unwrap();

        let waiter = s.spawn(|| {
            let started = Instant::now();
            m.synchronise("action_save", Duration::from_secs(30), check, || {})
                .unwrap();
            started.elapsed()
        });

        thread::sleep(hold);
        holder.release().unwrap();

        let waited = waiter.join().unwrap();
        assert!(waited >= hold / 2);
        assert!(waited < hold + check * 4);
    });

    // One reserve from the holder, several polls from the waiter.
    assert!(m.store().reserves() > 2);
}

#[test]
fn continuously_held_key_times_out_near_budget() {
    let m = mutex();
    let budget = Duration::from_millis(100);
    let _held = m.try_acquire("busy", Lease::from_secs(30)).unwrap().unwrap();

    let ran = AtomicUsize::new(0);
    let started = Instant::now();
    let err = m
        .synchronise("busy", budget, Duration::from_millis(20), || {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert!(elapsed >= budget);
    assert!(elapsed < budget * 5);
}

#[test]
fn crashed_holder_lease_expires() {
    let m = mutex();
    let guard = m.try_acquire("crash", Lease::from_secs(1)).unwrap().unwrap();
    // A holder that dies never releases.
    mem::forget(guard);

    let err = m
        .synchronise("crash", Duration::from_millis(100), Duration::from_millis(20), || {})
        .unwrap_err();
    assert!(err.is_timeout());

    thread::sleep(Duration::from_millis(1000));
    m.synchronise("crash", Duration::from_millis(500), Duration::from_millis(20), || {})
        .unwrap();
}
