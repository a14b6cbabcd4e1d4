#![allow(dead_code)]

use verdict_core::Address;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn account(n: u64) -> Address {
    Address::from_index(n)
}
