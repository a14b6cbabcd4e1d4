//! Treasury governance.
//!
//! Members pool funds into the application address. Any member may nominate
//! themselves while the treasury is idle, members vote with their pooled
//! funds during the voting window, and a nominee backed by a majority may
//! spend up to their budget during the following term.
//!
//! Funds added after a nomination stay in `funds_future` until the next
//! nomination, so a running vote is never affected by fresh deposits.

use crate::config::TreasuryConfig;
use crate::error::PolicyConfigError;
use verdict_core::prelude::*;
use verdict_flow::prelude::*;

pub const NOMINATE: &str = "nominate";
pub const VOTE_FOR: &str = "vote_for";
pub const VOTE_AGAINST: &str = "vote_against";
pub const ADD_FUNDS: &str = "add_funds";
pub const WITHDRAW_FUNDS: &str = "withdraw_funds";

struct GlobalKeys {
    funds_current: EagerKey<IntExpr>,
    funds_future: EagerKey<IntExpr>,
    votes_for: EagerKey<IntExpr>,
    votes_against: EagerKey<IntExpr>,
    term_used: EagerKey<IntExpr>,
    term_budget: EagerKey<IntExpr>,
    nominee: OptionalKey<BytesExpr>,
    last_nomination_ts: OptionalKey<IntExpr>,
    last_vote_ts: OptionalKey<IntExpr>,
}

struct LocalKeys {
    funds_current: EagerKey<IntExpr>,
    funds_future: EagerKey<IntExpr>,
    votes_for: EagerKey<IntExpr>,
    votes_against: EagerKey<IntExpr>,
    last_nomination_ts: OptionalKey<IntExpr>,
    last_vote_ts: OptionalKey<IntExpr>,
    last_funds_ts: OptionalKey<IntExpr>,
}

#[derive(Clone, Copy)]
enum Ballot {
    For,
    Against,
}

/// The treasury policy, bound to its state keys.
pub struct Treasury {
    config: TreasuryConfig,
    term_end: u64,
    global: StateAccessor,
    local: StateAccessor,
    g: GlobalKeys,
    l: LocalKeys,
}

impl Treasury {
    pub fn new(config: TreasuryConfig) -> Result<Self, PolicyConfigError> {
        config.validate()?;
        let term_end = config.term_end()?;

        let mut arena = SlotArena::new();
        let global = StateBuilder::global()
            .eager_int("funds_current", 0)
            .eager_int("funds_future", 0)
            .eager_int("votes_for", 0)
            .eager_int("votes_against", 0)
            .eager_int("term_used", 0)
            .eager_int("term_budget", 0)
            .optional_bytes("nominee")
            .optional_int("last_nomination_ts")
            .optional_int("last_vote_ts")
            .build(&mut arena)?;
        let local = StateBuilder::local()
            .eager_int("funds_current", 0)
            .eager_int("funds_future", 0)
            .eager_int("votes_for", 0)
            .eager_int("votes_against", 0)
            .optional_int("last_nomination_ts")
            .optional_int("last_vote_ts")
            .optional_int("last_funds_ts")
            .build(&mut arena)?;

        let g = GlobalKeys {
            funds_current: global.eager_int("funds_current")?,
            funds_future: global.eager_int("funds_future")?,
            votes_for: global.eager_int("votes_for")?,
            votes_against: global.eager_int("votes_against")?,
            term_used: global.eager_int("term_used")?,
            term_budget: global.eager_int("term_budget")?,
            nominee: global.optional_bytes("nominee")?,
            last_nomination_ts: global.optional_int("last_nomination_ts")?,
            last_vote_ts: global.optional_int("last_vote_ts")?,
        };
        let l = LocalKeys {
            funds_current: local.eager_int("funds_current")?,
            funds_future: local.eager_int("funds_future")?,
            votes_for: local.eager_int("votes_for")?,
            votes_against: local.eager_int("votes_against")?,
            last_nomination_ts: local.optional_int("last_nomination_ts")?,
            last_vote_ts: local.optional_int("last_vote_ts")?,
            last_funds_ts: local.optional_int("last_funds_ts")?,
        };

        tracing::debug!(
            voting = config.voting_duration,
            term = config.term_duration,
            cooldown = config.nomination_cooldown,
            slots = arena.len(),
            "treasury state declared"
        );
        Ok(Self {
            config,
            term_end,
            global,
            local,
            g,
            l,
        })
    }

    pub fn config(&self) -> &TreasuryConfig {
        &self.config
    }

    pub fn global_state(&self) -> &StateAccessor {
        &self.global
    }

    pub fn local_state(&self) -> &StateAccessor {
        &self.local
    }

    fn elapsed(&self) -> IntExpr {
        Global::latest_timestamp() - self.g.last_nomination_ts.get()
    }

    /// Votes are accepted: a nominee exists, the nomination is recent and
    /// has not been vetoed by half of the pool.
    pub fn is_voting(&self) -> IntExpr {
        all([
            self.g.nominee.has_value(),
            (self.g.votes_against.get() * 2u64).lt(self.g.funds_current.get()),
            self.elapsed().le(self.config.voting_duration),
        ])
    }

    /// The nominee may spend: voting is over, a majority voted for them and
    /// the budget is not exhausted.
    pub fn is_term(&self) -> IntExpr {
        all([
            !self.is_voting(),
            self.g.nominee.has_value(),
            (self.g.votes_for.get() * 2u64).gt(self.g.funds_current.get()),
            self.g.term_used.get().lt(self.g.term_budget.get()),
            self.g.term_used.get().lt(self.g.votes_for.get()),
            self.elapsed().gt(self.config.voting_duration),
            self.elapsed().le(self.term_end),
        ])
    }

    pub fn is_idle(&self) -> IntExpr {
        all([!self.is_voting(), !self.is_term()])
    }

    fn outside_cooldown(&self) -> IntExpr {
        select(
            self.l.last_nomination_ts.has_value(),
            (Global::latest_timestamp() - self.l.last_nomination_ts.get())
                .gt(self.config.nomination_cooldown),
            int(1),
        )
    }

    /// No vote was cast in the current second. A vote stamped at or after
    /// `last_nomination_ts` then always belongs to that nomination.
    fn after_last_vote(&self) -> IntExpr {
        select(
            self.g.last_vote_ts.has_value(),
            Global::latest_timestamp().gt(self.g.last_vote_ts.get()),
            int(1),
        )
    }

    /// Amount paid to the application by the transaction grouped just
    /// before this call, or zero.
    pub fn inbound_amount() -> IntExpr {
        let paid = all([
            Global::group_size().equals(2u64),
            txn().group_index().equals(1u64),
            gtxn(0u64).type_enum().equals(TxnType::Payment.code()),
            gtxn(0u64)
                .receiver()
                .equals(Global::current_application_address()),
        ]);
        select(paid, gtxn(0u64).amount(), int(0))
    }

    fn load(&self) -> Seq {
        Seq::new()
            .then(self.global.load_all_optional())
            .then(self.local.load_all_optional())
    }

    /// Load every optional key, then apply `effects` and approve if
    /// `valid`, else reject without writing.
    fn guarded(&self, valid: IntExpr, effects: Vec<UnitExpr>) -> IntExpr {
        self.load().finish(select(
            valid,
            Seq::new().then_all(effects).finish(int(1)),
            int(0),
        ))
    }

    /// Undo the sender's vote if it was cast for the current nomination.
    fn retract_vote(&self) -> UnitExpr {
        let current = all([
            self.l.last_vote_ts.has_value(),
            self.l
                .last_vote_ts
                .get()
                .ge(self.g.last_nomination_ts.get()),
        ]);
        when(
            current,
            Seq::new()
                .then(self.g.votes_for.dec(self.l.votes_for.get()))
                .then(self.g.votes_against.dec(self.l.votes_against.get()))
                .unit(),
        )
    }

    /// Move the sender's pending deposits into their voting funds once a
    /// nomination has happened since they were made.
    fn migrate_funds(&self) -> UnitExpr {
        let stale = all([
            self.l.last_funds_ts.has_value(),
            self.g.last_nomination_ts.has_value(),
            self.l
                .last_funds_ts
                .get()
                .lt(self.g.last_nomination_ts.get()),
        ]);
        when(
            stale,
            Seq::new()
                .then(self.l.funds_current.inc(self.l.funds_future.get()))
                .then(self.l.funds_future.set(int(0)))
                .unit(),
        )
    }

    pub fn nominate(&self) -> IntExpr {
        let now = Global::latest_timestamp();
        let valid = all([
            self.is_idle(),
            self.outside_cooldown(),
            self.after_last_vote(),
        ]);
        self.guarded(
            valid,
            vec![
                self.g.funds_current.inc(self.g.funds_future.get()),
                self.g.funds_future.set(int(0)),
                self.g.votes_for.set(int(0)),
                self.g.votes_against.set(int(0)),
                self.g.term_used.set(int(0)),
                self.g.term_budget.set(txn().arg(1).btoi()),
                self.g.nominee.set(txn().sender()),
                self.g.last_nomination_ts.set(now.clone()),
                self.l.last_nomination_ts.set(now),
            ],
        )
    }

    fn vote(&self, ballot: Ballot) -> IntExpr {
        let (tally, mine) = match ballot {
            Ballot::For => (&self.g.votes_for, &self.l.votes_for),
            Ballot::Against => (&self.g.votes_against, &self.l.votes_against),
        };
        self.guarded(
            self.is_voting(),
            vec![
                self.retract_vote(),
                self.l.votes_for.set(int(0)),
                self.l.votes_against.set(int(0)),
                self.migrate_funds(),
                tally.inc(self.l.funds_current.get()),
                mine.set(self.l.funds_current.get()),
                self.l.last_vote_ts.set(Global::latest_timestamp()),
                self.g.last_vote_ts.set(Global::latest_timestamp()),
            ],
        )
    }

    pub fn vote_for(&self) -> IntExpr {
        self.vote(Ballot::For)
    }

    pub fn vote_against(&self) -> IntExpr {
        self.vote(Ballot::Against)
    }

    pub fn add_funds(&self) -> IntExpr {
        self.guarded(
            int(1),
            vec![
                self.migrate_funds(),
                self.g.funds_future.inc(Self::inbound_amount()),
                self.l.funds_future.inc(Self::inbound_amount()),
                self.l.last_funds_ts.set(Global::latest_timestamp()),
            ],
        )
    }

    pub fn withdraw_funds(&self) -> IntExpr {
        let amount = txn().arg(1).btoi();
        let cap = self.g.term_budget.get().min(self.g.votes_for.get()) - self.g.term_used.get();
        // Each test only runs once the previous one holds: the nominee slot
        // is bytes only when present, and the cap only stays positive in term.
        let valid = select(
            self.is_term(),
            select(
                self.g.nominee.has_value(),
                select(
                    txn().sender().equals(self.g.nominee.get()),
                    amount.clone().le(cap),
                    int(0),
                ),
                int(0),
            ),
            int(0),
        );
        self.guarded(
            valid,
            vec![
                pay(self.g.nominee.get(), amount.clone()),
                self.g.term_used.inc(amount),
            ],
        )
    }

    /// Shared by close-out and clear: take the sender's vote and funds out
    /// of the pool and zero their record.
    pub fn leave(&self) -> IntExpr {
        self.load()
            .then(self.retract_vote())
            .then(self.migrate_funds())
            .then(self.g.funds_current.dec(self.l.funds_current.get()))
            .then(self.g.funds_future.dec(self.l.funds_future.get()))
            .then(self.l.funds_current.set(int(0)))
            .then(self.l.funds_future.set(int(0)))
            .then(self.l.votes_for.set(int(0)))
            .then(self.l.votes_against.set(int(0)))
            .finish(int(1))
    }

    pub fn decision_table(&self) -> DecisionTable {
        DecisionTable::new("treasury")
            .on_create(Seq::new().then(self.global.create()).finish(int(1)))
            .on_opt_in(Seq::new().then(self.local.create()).finish(int(1)))
            .on_close_out(self.leave())
            .action(NOMINATE, self.nominate())
            .action(VOTE_FOR, self.vote_for())
            .action(VOTE_AGAINST, self.vote_against())
            .action(ADD_FUNDS, self.add_funds())
            .action(WITHDRAW_FUNDS, self.withdraw_funds())
            .on_clear(self.leave())
            .schemas(self.global.schema(), self.local.schema())
    }

    pub fn compile(&self) -> Result<AppPrograms, PolicyConfigError> {
        Ok(self.decision_table().compile()?)
    }
}

/// Build the treasury programs for `config`.
pub fn treasury_app(config: TreasuryConfig) -> Result<AppPrograms, PolicyConfigError> {
    Treasury::new(config)?.compile()
}
