mod common;

use common::{account, init_tracing};
use verdict_core::prelude::*;
use verdict_runtime::prelude::*;
use verdict_std::counter::INCREMENT;
use verdict_std::prelude::*;

#[test]
fn test_counter_tracks_shares() {
    init_tracing();
    let mut ledger = Ledger::new();
    for who in 1..=3 {
        ledger.fund(account(who), 100_000);
    }
    let app = ledger
        .submit_one(Transaction::create(account(1), counter_app().unwrap()))
        .unwrap()
        .created_app()
        .unwrap();
    assert_eq!(ledger.global_value(app, "count"), Some(&Value::Int(0)));

    for who in [2, 3] {
        ledger
            .submit_one(Transaction::opt_in(account(who), app))
            .unwrap();
    }
    for who in [2, 2, 3] {
        let receipt = ledger
            .submit_one(Transaction::call(account(who), app, [INCREMENT]))
            .unwrap();
        assert_eq!(receipt.branch(0), Some(INCREMENT));
    }
    assert_eq!(ledger.global_int(app, "count"), 3);
    assert_eq!(ledger.local_int(account(2), app, "count"), 2);
    assert_eq!(ledger.local_int(account(3), app, "count"), 1);

    ledger
        .submit_one(Transaction::close_out(account(2), app))
        .unwrap();
    assert_eq!(ledger.global_int(app, "count"), 1);
    assert!(!ledger.is_opted_in(account(2), app));

    ledger
        .submit_one(Transaction::clear(account(3), app))
        .unwrap();
    assert_eq!(ledger.global_int(app, "count"), 0);
}

#[test]
fn test_counter_requires_opt_in() {
    init_tracing();
    let mut ledger = Ledger::new();
    ledger.fund(account(1), 100_000);
    let app = ledger
        .submit_one(Transaction::create(account(1), counter_app().unwrap()))
        .unwrap()
        .created_app()
        .unwrap();
    let err = ledger
        .submit_one(Transaction::call(account(1), app, [INCREMENT]))
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::Denied));
    assert_eq!(ledger.global_int(app, "count"), 0);
}
