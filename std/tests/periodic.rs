mod common;

use common::init_tracing;
use verdict_core::prelude::*;
use verdict_runtime::prelude::*;
use verdict_std::prelude::*;

const LEASE: [u8; 32] = [7; 32];

fn escrow() -> Address {
    Address::from_index(10)
}

fn receiver() -> Address {
    Address::from_index(5)
}

fn program() -> Expr {
    PeriodicPayment {
        max_fee: 2_000,
        start_round: 100,
        end_round: 200,
        period: 10,
        amount: 50,
        receiver: receiver(),
        lease: LEASE,
    }
    .program()
    .unwrap()
    .into_expr()
}

/// An on-period payment starting at `first_valid`.
fn payment(first_valid: u64) -> Transaction {
    Transaction::payment(escrow(), receiver(), 50)
        .with_validity(first_valid, first_valid + 9)
        .with_lease(LEASE)
}

fn check(tx: Transaction) -> Result<(), Rejection> {
    init_tracing();
    Ledger::new().check_logic(&program(), &[tx], 0)
}

#[test]
fn test_on_period_payments_are_approved() {
    assert_eq!(check(payment(100)), Ok(()));
    assert_eq!(check(payment(190)), Ok(()));
}

#[test]
fn test_off_period_payment_is_rejected() {
    assert!(check(payment(115)).is_err());
    // Before the first round the period offset underflows.
    assert!(check(payment(90)).is_err());
    assert_eq!(check(payment(200)), Err(Rejection::Denied));
}

#[test]
fn test_payment_terms_are_enforced() {
    let wrong_receiver = Transaction::payment(escrow(), Address::from_index(6), 50)
        .with_validity(110, 119)
        .with_lease(LEASE);
    assert_eq!(check(wrong_receiver), Err(Rejection::Denied));

    assert_eq!(check(payment(110).with_fee(5_000)), Err(Rejection::Denied));
    assert_eq!(check(payment(110).with_lease([0; 32])), Err(Rejection::Denied));
    assert_eq!(
        check(payment(110).with_validity(110, 150)),
        Err(Rejection::Denied)
    );
    assert_eq!(
        check(payment(110).with_rekey_to(Address::from_index(8))),
        Err(Rejection::Denied)
    );
}

#[test]
fn test_final_close_out_is_approved() {
    let close = Transaction::payment(escrow(), Address::ZERO, 0)
        .with_close_remainder_to(receiver())
        .with_validity(200, 210)
        .with_lease(LEASE);
    assert_eq!(check(close.clone()), Ok(()));

    let early = close.with_validity(150, 160);
    assert_eq!(check(early), Err(Rejection::Denied));
}

#[test]
fn test_app_calls_are_rejected() {
    let call = Transaction::call(escrow(), 1, ["pay"])
        .with_validity(110, 119)
        .with_lease(LEASE);
    assert_eq!(check(call), Err(Rejection::Denied));
}
