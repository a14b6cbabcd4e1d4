//! Shared counter: every opted-in account bumps a global total and its own
//! tally. Leaving takes the account's share back out of the total.

use verdict_core::prelude::*;
use verdict_flow::prelude::*;

pub const INCREMENT: &str = "increment";

pub fn counter_app() -> Result<AppPrograms, BuildError> {
    let mut arena = SlotArena::new();
    let global = StateBuilder::global()
        .eager_int("count", 0)
        .build(&mut arena)?;
    let local = StateBuilder::local()
        .eager_int("count", 0)
        .build(&mut arena)?;
    let total = global.eager_int("count")?;
    let mine = local.eager_int("count")?;

    let leave = Seq::new().then(total.dec(mine.get())).finish(int(1));
    DecisionTable::new("counter")
        .on_create(Seq::new().then(global.create()).finish(int(1)))
        .on_opt_in(Seq::new().then(local.create()).finish(int(1)))
        .on_close_out(leave.clone())
        .action(
            INCREMENT,
            Seq::new()
                .then(total.inc(1u64))
                .then(mine.inc(1u64))
                .finish(int(1)),
        )
        .on_clear(leave)
        .schemas(global.schema(), local.schema())
        .compile()
}
