mod contention;

use std::time::{Duration, Instant};

use redis_mutex::{Lease, Mutex};

use support::CountingStore;

fn mutex() -> Mutex<CountingStore> {
    Mutex::with_store(CountingStore::default(), "redisGoMutex", "ironmount")
}

// =============================================================================
// Single caller
// =============================================================================

#[test]
fn uncontended_synchronise_makes_one_reserve_and_one_remove() {
    let m = mutex();
    m.synchronise(
        "action_save",
        Duration::from_secs(30),
        Duration::from_secs(2),
        || {},
    )
    .unwrap();

    assert_eq!(m.store().reserves(), 1);
    assert_eq!(m.store().removes(), 1);
    assert!(!m.store().is_held(&m.key("action_save")));
}

#[test]
fn lease_matches_wait_budget() {
    let m = mutex();
    m.synchronise("action_save", Duration::from_secs(30), Duration::from_secs(2), || {})
        .unwrap();
    assert_eq!(m.store().last_lease(), Some(Lease::from_secs(30)));

    m.synchronise(
        "action_save",
        Duration::from_millis(100),
        Duration::from_millis(500),
        || {},
    )
    .unwrap();
    assert_eq!(m.store().last_lease(), Some(Lease::from_secs(1)));
}

#[test]
fn polling_keeps_the_same_lease() {
    let m = mutex();
    let _held = m.try_acquire("busy", Lease::from_secs(30)).unwrap().unwrap();
    let err = m
        .synchronise("busy", Duration::from_millis(1500), Duration::from_millis(200), || {})
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(m.store().reserves() > 2);
    assert_eq!(m.store().last_lease(), Some(Lease::from_secs(2)));
}

#[test]
fn free_key_needs_no_sleep() {
    let m = mutex();
    let started = Instant::now();
    m.synchronise(
        "action_save",
        Duration::from_millis(100),
        Duration::from_millis(500),
        || {},
    )
    .unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn zero_wait_never_reaches_store() {
    let m = mutex();
    let err = m
        .synchronise("action_save", Duration::ZERO, Duration::from_millis(10), || {})
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(m.store().reserves(), 0);
    assert_eq!(m.store().removes(), 0);
}

#[test]
fn work_result_is_returned() {
    let m = mutex();
    let param = String::from("sample param1");
    let echoed = m
        .synchronise(
            "vault.id2",
            Duration::from_secs(1),
            Duration::from_millis(10),
            || format!("called! exampleParam is: '{}'", param),
        )
        .unwrap();
    assert_eq!(echoed, "called! exampleParam is: 'sample param1'");
}

#[test]
fn timed_out_acquisition_leaves_holder_untouched() {
    let m = mutex();
    let held = m.try_acquire("a", Lease::from_secs(30)).unwrap().unwrap();

    let err = m
        .synchronise("a", Duration::from_millis(50), Duration::from_millis(10), || {})
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.key(), Some(held.key()));
    assert!(m.store().is_held(held.key()));
    assert_eq!(m.store().removes(), 0);
}

#[test]
fn distinct_scopes_do_not_block_each_other() {
    let m = mutex();
    let _a = m.try_acquire("a", Lease::from_secs(30)).unwrap().unwrap();
    let started = Instant::now();
    m.synchronise("b", Duration::from_millis(100), Duration::from_millis(50), || {})
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(50));
}
