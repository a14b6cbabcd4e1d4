//! Vouching: members record a name, and other members vouch for it.
//!
//! A vouch takes two grouped calls. The voucher sends `vouch_for` naming
//! the vouchee, and right after it the vouchee sends `vouch_from` naming
//! the voucher and one of the `voucher_N` keys to store the voucher's
//! address under. Setting a new name empties every voucher key, since the
//! old vouches were for the old name.

use verdict_core::prelude::*;
use verdict_flow::prelude::*;

pub const MAX_VOUCHERS: usize = 8;

pub const SET_NAME: &str = "set_name";
pub const VOUCH_FOR: &str = "vouch_for";
pub const VOUCH_FROM: &str = "vouch_from";

pub fn voucher_key(index: usize) -> String {
    format!("voucher_{index}")
}

/// Storage has no delete, so an emptied voucher key holds empty bytes.
fn clear_voucher(key: &OptionalKey<BytesExpr>) -> UnitExpr {
    key.set(bytes(Vec::new()))
}

pub fn vouch_app() -> Result<AppPrograms, BuildError> {
    let mut arena = SlotArena::new();
    let mut builder = StateBuilder::local().optional_bytes("name");
    for index in 0..MAX_VOUCHERS {
        builder = builder.optional_bytes(&voucher_key(index));
    }
    let local = builder.build(&mut arena)?;
    let name = local.optional_bytes("name")?;
    let vouchers = (0..MAX_VOUCHERS)
        .map(|index| local.optional_bytes(&voucher_key(index)))
        .collect::<Result<Vec<_>, _>>()?;

    let set_name = Seq::new()
        .then_all(vouchers.iter().map(clear_voucher))
        .then(name.set(txn().arg(1)))
        .finish(int(1));

    // The voucher's call is the one grouped just before this one.
    let voucher = gtxn(txn().group_index() - 1u64);
    let requested = txn().arg(2);
    let store = vouchers
        .iter()
        .enumerate()
        .fold(Cond::new(), |table, (index, key)| {
            table.arm(
                requested.clone().equals(bytes(voucher_key(index))),
                Seq::new().then(key.set(voucher.sender())).finish(int(1)),
            )
        })
        .arm(int(1), int(0))
        .build()?;
    let vouch_from = Seq::new()
        .then(assert(
            voucher
                .application_id()
                .equals(Global::current_application_id()),
        ))
        .then(assert(voucher.arg(0).equals(bytes(VOUCH_FOR))))
        .then(assert(voucher.arg(1).equals(txn().sender())))
        .then(assert(txn().arg(1).equals(voucher.sender())))
        .finish(store);

    DecisionTable::new("vouch")
        .on_opt_in(int(1))
        .on_close_out(int(1))
        .action(SET_NAME, set_name)
        .action(VOUCH_FOR, int(1))
        .action(VOUCH_FROM, vouch_from)
        .schemas(StateSchema::default(), local.schema())
        .compile()
}
