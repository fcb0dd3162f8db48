//! Runs a few guarded sections against a local Redis server.
//!
//! ```text
//! RUST_LOG=redis_mutex=debug cargo run --example synchronise
//! ```

use std::thread;
use std::time::Duration;

use redis_mutex::{LockError, Mutex, MutexConfig};

fn method_call_without_param() {
    println!("called! without param");
    thread::sleep(Duration::from_secs(5));
}

fn method_call_with_param(example_param: &str) {
    println!("called! exampleParam is: '{}'", example_param);
    thread::sleep(Duration::from_secs(5));
}

fn main() -> Result<(), LockError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let mut config = MutexConfig::from_env()?;
    if config.global_scope.is_empty() {
        config.global_scope = "ironmount".into();
    }
    let mutex = Mutex::connect(&config)?;
    let pool = mutex.store().state();
    tracing::debug!(
        connections = pool.connections,
        idle = pool.idle_connections,
        "instance created"
    );

    let wait = Duration::from_secs(30);
    let check = Duration::from_secs(2);

    mutex.synchronise("action_save", wait, check, method_call_without_param)?;

    let param_value = String::from("sample param1");
    mutex.synchronise("vault.id2", wait, check, || {
        method_call_with_param(&param_value)
    })?;

    // The closure captures the value it is given; later rebinding does not leak in.
    let param_value = String::from("sample param2");
    let work = move || method_call_with_param(&param_value);
    mutex.synchronise("vault.id2", wait, check, work)?;

    Ok(())
}
