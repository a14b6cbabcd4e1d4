//! In-memory ledger.
//!
//! `submit` applies a transaction group atomically: every transaction is
//! applied to a working copy, and the copy replaces the ledger only when
//! the whole group is accepted.

use crate::error::{EvalError, Rejection};
use crate::eval::{AppContext, Evaluator, Overlay};
use crate::receipt::{InnerPayment, Receipt, TxnOutcome};
use crate::timeline::{ProgramKind, Timeline, TraceEvent};
use crate::txn::{Transaction, TxnBody};
use std::collections::BTreeMap;
use verdict_core::{Address, Expr, OnCompletion, StateSchema, Value, ValueKind};
use verdict_flow::AppPrograms;

/// Largest atomic group the ledger accepts.
pub const MAX_GROUP_SIZE: usize = 16;

pub type KeyValues = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: u64,
    /// Local state per opted-in application.
    pub local: BTreeMap<u64, KeyValues>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: u64,
    pub creator: Address,
    pub programs: AppPrograms,
    pub global: KeyValues,
}

impl Application {
    pub fn address(&self) -> Address {
        Address::for_application(self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    timestamp: u64,
    round: u64,
    next_app_id: u64,
    accounts: BTreeMap<Address, Account>,
    apps: BTreeMap<u64, Application>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn fits(store: &KeyValues, schema: StateSchema) -> bool {
    let uints = store.values().filter(|v| v.kind() == ValueKind::Int).count();
    let byte_slices = store.len() - uints;
    schema.admits(uints as u64, byte_slices as u64)
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            timestamp: 0,
            round: 1,
            next_app_id: 1,
            accounts: BTreeMap::new(),
            apps: BTreeMap::new(),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Move time forward by `seconds` and close a round.
    pub fn advance(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
        self.round += 1;
    }

    pub fn set_round(&mut self, round: u64) {
        self.round = round;
    }

    pub fn fund(&mut self, account: Address, amount: u64) {
        self.credit(account, amount);
    }

    pub fn balance(&self, account: Address) -> u64 {
        self.accounts.get(&account).map_or(0, |a| a.balance)
    }

    pub fn account(&self, account: Address) -> Option<&Account> {
        self.accounts.get(&account)
    }

    pub fn app(&self, id: u64) -> Option<&Application> {
        self.apps.get(&id)
    }

    pub fn is_opted_in(&self, account: Address, app: u64) -> bool {
        self.local_state(account, app).is_some()
    }

    pub fn local_state(&self, account: Address, app: u64) -> Option<&KeyValues> {
        self.accounts.get(&account)?.local.get(&app)
    }

    pub fn global_value(&self, app: u64, key: &str) -> Option<&Value> {
        self.apps.get(&app)?.global.get(key)
    }

    pub fn local_value(&self, account: Address, app: u64, key: &str) -> Option<&Value> {
        self.local_state(account, app)?.get(key)
    }

    /// Integer shorthand for [`Ledger::global_value`]; missing reads as 0.
    pub fn global_int(&self, app: u64, key: &str) -> u64 {
        self.global_value(app, key)
            .and_then(Value::as_int)
            .unwrap_or(0)
    }

    /// Integer shorthand for [`Ledger::local_value`]; missing reads as 0.
    pub fn local_int(&self, account: Address, app: u64, key: &str) -> u64 {
        self.local_value(account, app, key)
            .and_then(Value::as_int)
            .unwrap_or(0)
    }

    pub fn submit_one(&mut self, tx: Transaction) -> Result<Receipt, EvalError> {
        self.submit(std::slice::from_ref(&tx))
    }

    /// Evaluate and apply an atomic group.
    pub fn submit(&mut self, group: &[Transaction]) -> Result<Receipt, EvalError> {
        self.evaluate(group)
    }

    /// Evaluate a group without applying it.
    pub fn dry_run(&self, group: &[Transaction]) -> Result<Receipt, EvalError> {
        let mut scratch = self.clone();
        scratch.evaluate(group)
    }

    fn evaluate(&mut self, group: &[Transaction]) -> Result<Receipt, EvalError> {
        if group.is_empty() {
            return Err(EvalError::EmptyGroup);
        }
        if group.len() > MAX_GROUP_SIZE {
            return Err(EvalError::GroupTooLarge(group.len()));
        }

        let span = tracing::info_span!("Group", verdict.group_size = group.len());
        let _enter = span.enter();

        let mut work = self.clone();
        let mut receipt = Receipt::default();
        for index in 0..group.len() {
            match work.apply(group, index, &mut receipt.timeline) {
                Ok(outcome) => receipt.outcomes.push(outcome),
                Err(reason) => {
                    tracing::warn!(txn = index, %reason, "group rejected");
                    return Err(EvalError::Rejected { index, reason });
                }
            }
        }
        *self = work;
        tracing::debug!(txns = group.len(), "group accepted");
        Ok(receipt)
    }

    /// Evaluate a stateless program approving `group[index]`.
    pub fn check_logic(
        &self,
        program: &Expr,
        group: &[Transaction],
        index: usize,
    ) -> Result<(), Rejection> {
        if index >= group.len() {
            return Err(Rejection::GroupIndex(index as u64));
        }
        let evaluation = Evaluator::new(self, group, index, None).run(program)?;
        if evaluation.approved {
            Ok(())
        } else {
            Err(Rejection::Denied)
        }
    }

    fn credit(&mut self, account: Address, amount: u64) {
        let entry = self.accounts.entry(account).or_default();
        entry.balance = entry.balance.saturating_add(amount);
    }

    fn debit(&mut self, account: Address, amount: u64) -> Result<(), Rejection> {
        let have = self.balance(account);
        if have < amount {
            return Err(Rejection::Overdraft {
                account,
                have,
                need: amount,
            });
        }
        if let Some(entry) = self.accounts.get_mut(&account) {
            entry.balance = have - amount;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        group: &[Transaction],
        index: usize,
        timeline: &mut Timeline,
    ) -> Result<TxnOutcome, Rejection> {
        let tx = &group[index];
        if self.round < tx.first_valid || self.round > tx.last_valid {
            return Err(Rejection::OutsideValidity {
                round: self.round,
                first: tx.first_valid,
                last: tx.last_valid,
            });
        }
        self.debit(tx.sender, tx.fee)?;

        match &tx.body {
            TxnBody::Payment {
                receiver,
                amount,
                close_remainder_to,
            } => {
                self.debit(tx.sender, *amount)?;
                self.credit(*receiver, *amount);
                if *close_remainder_to != Address::ZERO {
                    let rest = self.balance(tx.sender);
                    self.debit(tx.sender, rest)?;
                    self.credit(*close_remainder_to, rest);
                }
                Ok(TxnOutcome::payment(index))
            }
            TxnBody::AppCall {
                app_id,
                on_completion,
                programs,
                ..
            } => self.apply_call(
                group,
                index,
                *app_id,
                *on_completion,
                programs.as_deref(),
                timeline,
            ),
        }
    }

    fn apply_call(
        &mut self,
        group: &[Transaction],
        index: usize,
        app_id: u64,
        on_completion: OnCompletion,
        programs: Option<&AppPrograms>,
        timeline: &mut Timeline,
    ) -> Result<TxnOutcome, Rejection> {
        let sender = group[index].sender;
        let created = app_id == 0;
        let id = if created {
            let programs = programs.ok_or(Rejection::MissingPrograms)?;
            let id = self.next_app_id;
            self.next_app_id += 1;
            self.apps.insert(
                id,
                Application {
                    id,
                    creator: sender,
                    programs: programs.clone(),
                    global: KeyValues::new(),
                },
            );
            id
        } else if self.apps.contains_key(&app_id) {
            app_id
        } else {
            return Err(Rejection::UnknownApp(app_id));
        };

        match on_completion {
            OnCompletion::OptIn => {
                if self.is_opted_in(sender, id) {
                    return Err(Rejection::AlreadyOptedIn(sender));
                }
                self.accounts
                    .entry(sender)
                    .or_default()
                    .local
                    .insert(id, KeyValues::new());
            }
            OnCompletion::CloseOut | OnCompletion::ClearState => {
                if !self.is_opted_in(sender, id) {
                    return Err(Rejection::NotOptedIn(sender));
                }
            }
            OnCompletion::UpdateApplication if programs.is_none() => {
                return Err(Rejection::MissingPrograms);
            }
            _ => {}
        }

        let kind = if on_completion == OnCompletion::ClearState {
            ProgramKind::Clear
        } else {
            ProgramKind::Approval
        };
        let app = self.apps.get(&id).ok_or(Rejection::UnknownApp(id))?;
        let context = AppContext {
            id,
            address: app.address(),
            creator: app.creator,
        };
        let program = match kind {
            ProgramKind::Clear => &app.programs.clear,
            _ => &app.programs.approval,
        };

        let span = tracing::info_span!(
            "Program",
            verdict.app = %app.programs.name,
            verdict.app_id = id,
            verdict.txn = index
        );
        let _enter = span.enter();
        timeline.push(TraceEvent::ProgramEnter {
            txn: index,
            app: id,
            program: kind,
        });

        let result = Evaluator::new(self, group, index, Some(context)).run(program);
        let evaluation = match (kind, result) {
            (ProgramKind::Clear, Err(reason)) => {
                tracing::warn!(%reason, "clear program failed, clearing anyway");
                timeline.push(TraceEvent::Rejected {
                    txn: index,
                    reason: reason.to_string(),
                });
                return Ok(self.clear_refused(sender, id, index, timeline));
            }
            (ProgramKind::Clear, Ok(evaluation)) if !evaluation.approved => {
                tracing::warn!("clear program refused, clearing anyway");
                return Ok(self.clear_refused(sender, id, index, timeline));
            }
            (_, Err(reason)) => return Err(reason),
            (_, Ok(evaluation)) if !evaluation.approved => return Err(Rejection::Denied),
            (_, Ok(evaluation)) => evaluation,
        };

        let branch = match (kind, evaluation.root_arm) {
            (ProgramKind::Approval, Some(arm)) => app
                .programs
                .schematic
                .nodes
                .get(arm + 1)
                .map(|n| n.label.clone()),
            _ => None,
        };
        let inner_payment = evaluation
            .overlay
            .payment
            .map(|(receiver, amount)| InnerPayment { receiver, amount });
        timeline.extend(evaluation.events);
        timeline.push(TraceEvent::ProgramExit {
            txn: index,
            approved: true,
        });
        self.commit(id, evaluation.overlay)?;

        match on_completion {
            OnCompletion::CloseOut | OnCompletion::ClearState => self.remove_local(sender, id),
            OnCompletion::UpdateApplication => {
                if let (Some(app), Some(programs)) = (self.apps.get_mut(&id), programs) {
                    app.programs = programs.clone();
                }
            }
            OnCompletion::DeleteApplication => {
                self.apps.remove(&id);
            }
            OnCompletion::NoOp | OnCompletion::OptIn => {}
        }

        tracing::debug!(branch = ?branch, "program approved");
        Ok(TxnOutcome {
            index,
            app_id: Some(id),
            created,
            approved: true,
            branch,
            inner_payment,
        })
    }

    fn clear_refused(
        &mut self,
        sender: Address,
        id: u64,
        index: usize,
        timeline: &mut Timeline,
    ) -> TxnOutcome {
        timeline.push(TraceEvent::ProgramExit {
            txn: index,
            approved: false,
        });
        self.remove_local(sender, id);
        TxnOutcome {
            index,
            app_id: Some(id),
            created: false,
            approved: false,
            branch: None,
            inner_payment: None,
        }
    }

    fn remove_local(&mut self, account: Address, app: u64) {
        if let Some(entry) = self.accounts.get_mut(&account) {
            entry.local.remove(&app);
        }
    }

    fn commit(&mut self, id: u64, overlay: Overlay) -> Result<(), Rejection> {
        let app = self.apps.get_mut(&id).ok_or(Rejection::UnknownApp(id))?;
        app.global.extend(overlay.global);
        if !fits(&app.global, app.programs.global_schema) {
            return Err(Rejection::SchemaExceeded { scope: "global" });
        }
        let local_schema = app.programs.local_schema;

        for (account, writes) in overlay.local {
            let local = self
                .accounts
                .get_mut(&account)
                .and_then(|a| a.local.get_mut(&id))
                .ok_or(Rejection::NotOptedIn(account))?;
            local.extend(writes);
            if !fits(local, local_schema) {
                return Err(Rejection::SchemaExceeded { scope: "local" });
            }
        }

        if let Some((receiver, amount)) = overlay.payment {
            self.debit(Address::for_application(id), amount)?;
            self.credit(receiver, amount);
        }
        Ok(())
    }
}
