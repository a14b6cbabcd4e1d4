mod common;

use common::{account, init_tracing};
use verdict_core::prelude::*;
use verdict_runtime::prelude::*;
use verdict_std::prelude::*;
use verdict_std::vouch::{voucher_key, MAX_VOUCHERS, SET_NAME, VOUCH_FOR, VOUCH_FROM};

const CREATOR: u64 = 1;
const VOUCHER: u64 = 2;
const VOUCHEE: u64 = 3;
const STRANGER: u64 = 4;

fn args(parts: &[&[u8]]) -> Vec<Vec<u8>> {
    parts.iter().map(|part| part.to_vec()).collect()
}

fn create(ledger: &mut Ledger) -> u64 {
    let app = ledger
        .submit_one(Transaction::create(account(CREATOR), vouch_app().unwrap()))
        .unwrap()
        .created_app()
        .unwrap();
    for who in [VOUCHER, VOUCHEE, STRANGER] {
        ledger
            .submit_one(Transaction::opt_in(account(who), app))
            .unwrap();
    }
    app
}

fn setup() -> (Ledger, u64) {
    init_tracing();
    let mut ledger = Ledger::new();
    for who in [CREATOR, VOUCHER, VOUCHEE, STRANGER] {
        ledger.fund(account(who), 1_000_000);
    }
    let app = create(&mut ledger);
    (ledger, app)
}

fn vouch_for(app: u64, from: u64, vouchee: u64) -> Transaction {
    Transaction::call(
        account(from),
        app,
        args(&[VOUCH_FOR.as_bytes(), account(vouchee).as_bytes()]),
    )
}

fn vouch_from(app: u64, vouchee: u64, from: u64, key: &str) -> Transaction {
    Transaction::call(
        account(vouchee),
        app,
        args(&[VOUCH_FROM.as_bytes(), account(from).as_bytes(), key.as_bytes()]),
    )
}

fn voucher_slot(ledger: &Ledger, who: u64, app: u64, index: usize) -> Option<&Value> {
    ledger.local_value(account(who), app, &voucher_key(index))
}

#[test]
fn test_set_name() {
    let (mut ledger, app) = setup();
    ledger
        .submit_one(Transaction::call(
            account(VOUCHEE),
            app,
            args(&[SET_NAME.as_bytes(), b"abc"]),
        ))
        .unwrap();
    assert_eq!(
        ledger.local_value(account(VOUCHEE), app, "name"),
        Some(&Value::Bytes(b"abc".to_vec()))
    );
}

#[test]
fn test_vouch_records_voucher() {
    let (mut ledger, app) = setup();
    let group = [
        vouch_for(app, VOUCHER, VOUCHEE),
        vouch_from(app, VOUCHEE, VOUCHER, "voucher_0"),
    ];
    let receipt = ledger.submit(&group).unwrap();
    assert_eq!(receipt.branch(0), Some(VOUCH_FOR));
    assert_eq!(receipt.branch(1), Some(VOUCH_FROM));
    assert!(receipt.timeline.writes(0).is_empty());
    assert_eq!(
        voucher_slot(&ledger, VOUCHEE, app, 0),
        Some(&Value::from(account(VOUCHER)))
    );
    assert_eq!(voucher_slot(&ledger, VOUCHER, app, 0), None);
}

#[test]
fn test_set_name_empties_vouchers() {
    let (mut ledger, app) = setup();
    let group = [
        vouch_for(app, VOUCHER, VOUCHEE),
        vouch_from(app, VOUCHEE, VOUCHER, "voucher_7"),
    ];
    ledger.submit(&group).unwrap();

    let receipt = ledger
        .submit_one(Transaction::call(
            account(VOUCHEE),
            app,
            args(&[SET_NAME.as_bytes(), b"new"]),
        ))
        .unwrap();
    assert_eq!(receipt.timeline.writes(0).len(), MAX_VOUCHERS + 1);
    for index in 0..MAX_VOUCHERS {
        assert_eq!(
            voucher_slot(&ledger, VOUCHEE, app, index),
            Some(&Value::Bytes(Vec::new()))
        );
    }
}

#[test]
fn test_vouch_for_alone_changes_nothing() {
    let (mut ledger, app) = setup();
    let receipt = ledger
        .submit_one(vouch_for(app, VOUCHER, VOUCHEE))
        .unwrap();
    assert!(receipt.outcomes[0].approved);
    assert!(receipt.timeline.writes(0).is_empty());
}

#[test]
fn test_vouch_from_needs_a_preceding_call() {
    let (mut ledger, app) = setup();
    let err = ledger
        .submit_one(vouch_from(app, VOUCHEE, VOUCHER, "voucher_0"))
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::Underflow));
}

#[test]
fn test_mismatched_parties_are_rejected() {
    let (mut ledger, app) = setup();

    // The vouchee names someone other than the voucher.
    let group = [
        vouch_for(app, VOUCHER, VOUCHEE),
        vouch_from(app, VOUCHEE, STRANGER, "voucher_0"),
    ];
    let err = ledger.submit(&group).unwrap_err();
    assert!(matches!(err, EvalError::Rejected { index: 1, .. }));
    assert_eq!(err.rejection(), Some(&Rejection::AssertFailed));

    // The voucher vouched for someone else.
    let group = [
        vouch_for(app, VOUCHER, STRANGER),
        vouch_from(app, VOUCHEE, VOUCHER, "voucher_0"),
    ];
    let err = ledger.submit(&group).unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::AssertFailed));
    assert_eq!(voucher_slot(&ledger, VOUCHEE, app, 0), None);
}

#[test]
fn test_unknown_voucher_key_is_rejected() {
    let (mut ledger, app) = setup();
    let group = [
        vouch_for(app, VOUCHER, VOUCHEE),
        vouch_from(app, VOUCHEE, VOUCHER, &voucher_key(MAX_VOUCHERS)),
    ];
    let err = ledger.submit(&group).unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::Denied));
}

#[test]
fn test_voucher_must_use_the_same_app() {
    let (mut ledger, app) = setup();
    let other = create(&mut ledger);
    let group = [
        vouch_for(app, VOUCHER, VOUCHEE),
        vouch_from(other, VOUCHEE, VOUCHER, "voucher_0"),
    ];
    let err = ledger.submit(&group).unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::AssertFailed));
    assert_eq!(voucher_slot(&ledger, VOUCHEE, other, 0), None);
}
