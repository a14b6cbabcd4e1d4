//! Tree-walking evaluator with the engine's semantics.
//!
//! * Boolean combinators evaluate both operands.
//! * Integer arithmetic is checked; overflow, underflow and division by
//!   zero reject.
//! * Reads of missing keys yield integer zero.
//! * Writes go to an [`Overlay`] that the ledger commits only when the
//!   program approves.

use crate::error::Rejection;
use crate::ledger::Ledger;
use crate::timeline::TraceEvent;
use crate::txn::{Transaction, TxnBody, MIN_FEE};
use std::collections::{BTreeMap, HashMap};
use verdict_core::{
    Address, BinaryOp, Expr, GlobalField, ProbeSource, SlotId, TxnField, Value, ValueKind,
};

/// The application a stateful program runs for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AppContext {
    pub id: u64,
    pub address: Address,
    pub creator: Address,
}

/// Writes and the nested payment of one evaluation, not yet committed.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    pub global: BTreeMap<String, Value>,
    pub local: BTreeMap<Address, BTreeMap<String, Value>>,
    pub payment: Option<(Address, u64)>,
}

pub(crate) struct Evaluation {
    pub approved: bool,
    pub overlay: Overlay,
    pub events: Vec<TraceEvent>,
    /// Arm selected by the program's top-level decision table.
    pub root_arm: Option<usize>,
}

pub(crate) struct Evaluator<'a> {
    ledger: &'a Ledger,
    group: &'a [Transaction],
    index: usize,
    app: Option<AppContext>,
    slots: HashMap<SlotId, Option<Value>>,
    overlay: Overlay,
    events: Vec<TraceEvent>,
    depth: usize,
    root_arm: Option<usize>,
}

type Eval = Result<Option<Value>, Rejection>;

fn kind_of(value: &Option<Value>) -> ValueKind {
    value.as_ref().map_or(ValueKind::None, Value::kind)
}

fn mismatch(context: &'static str, expected: ValueKind, found: &Option<Value>) -> Rejection {
    Rejection::TypeMismatch {
        context,
        expected,
        found: kind_of(found),
    }
}

fn flag(b: bool) -> Value {
    Value::Int(u64::from(b))
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ledger: &'a Ledger,
        group: &'a [Transaction],
        index: usize,
        app: Option<AppContext>,
    ) -> Self {
        Self {
            ledger,
            group,
            index,
            app,
            slots: HashMap::new(),
            overlay: Overlay::default(),
            events: Vec::new(),
            depth: 0,
            root_arm: None,
        }
    }

    pub fn run(mut self, program: &Expr) -> Result<Evaluation, Rejection> {
        let result = self.eval(program)?;
        let approved = match result {
            Some(Value::Int(n)) => n != 0,
            other => return Err(mismatch("program result", ValueKind::Int, &other)),
        };
        Ok(Evaluation {
            approved,
            overlay: self.overlay,
            events: self.events,
            root_arm: self.root_arm,
        })
    }

    fn int(&mut self, expr: &Expr, context: &'static str) -> Result<u64, Rejection> {
        match self.eval(expr)? {
            Some(Value::Int(n)) => Ok(n),
            other => Err(mismatch(context, ValueKind::Int, &other)),
        }
    }

    fn bytes(&mut self, expr: &Expr, context: &'static str) -> Result<Vec<u8>, Rejection> {
        match self.eval(expr)? {
            Some(Value::Bytes(b)) => Ok(b),
            other => Err(mismatch(context, ValueKind::Bytes, &other)),
        }
    }

    fn address(&mut self, expr: &Expr, context: &'static str) -> Result<Address, Rejection> {
        let raw = self.bytes(expr, context)?;
        Address::from_slice(&raw).ok_or(Rejection::BadAddress(raw.len()))
    }

    fn app(&self) -> Result<AppContext, Rejection> {
        self.app.ok_or(Rejection::StatefulOp)
    }

    fn txn_at(&mut self, index: Option<&Expr>) -> Result<usize, Rejection> {
        let Some(index) = index else {
            return Ok(self.index);
        };
        let i = self.int(index, "group index")?;
        match usize::try_from(i) {
            Ok(i) if i < self.group.len() => Ok(i),
            _ => Err(Rejection::GroupIndex(i)),
        }
    }

    fn txn_field(&self, index: usize, field: TxnField) -> Value {
        let tx = &self.group[index];
        match field {
            TxnField::Sender => tx.sender.into(),
            TxnField::Fee => tx.fee.into(),
            TxnField::FirstValid => tx.first_valid.into(),
            TxnField::LastValid => tx.last_valid.into(),
            TxnField::Lease => tx.lease.to_vec().into(),
            TxnField::RekeyTo => tx.rekey_to.into(),
            TxnField::TypeEnum => tx.type_enum().code().into(),
            TxnField::GroupIndex => (index as u64).into(),
            TxnField::NumAppArgs => (tx.args().len() as u64).into(),
            TxnField::Receiver | TxnField::Amount | TxnField::CloseRemainderTo => {
                let (receiver, amount, close) = match &tx.body {
                    TxnBody::Payment {
                        receiver,
                        amount,
                        close_remainder_to,
                    } => (*receiver, *amount, *close_remainder_to),
                    TxnBody::AppCall { .. } => (Address::ZERO, 0, Address::ZERO),
                };
                match field {
                    TxnField::Receiver => receiver.into(),
                    TxnField::Amount => amount.into(),
                    _ => close.into(),
                }
            }
            TxnField::ApplicationId | TxnField::OnCompletion => {
                let (app_id, on_completion) = match &tx.body {
                    TxnBody::AppCall {
                        app_id,
                        on_completion,
                        ..
                    } => (*app_id, on_completion.code()),
                    TxnBody::Payment { .. } => (0, 0),
                };
                if field == TxnField::ApplicationId {
                    app_id.into()
                } else {
                    on_completion.into()
                }
            }
        }
    }

    fn global_field(&self, field: GlobalField) -> Result<Value, Rejection> {
        Ok(match field {
            GlobalField::LatestTimestamp => self.ledger.timestamp().into(),
            GlobalField::Round => self.ledger.round().into(),
            GlobalField::MinTxnFee => MIN_FEE.into(),
            GlobalField::GroupSize => (self.group.len() as u64).into(),
            GlobalField::ZeroAddress => Address::ZERO.into(),
            GlobalField::CurrentApplicationId => self.app()?.id.into(),
            GlobalField::CurrentApplicationAddress => self.app()?.address.into(),
            GlobalField::CreatorAddress => self.app()?.creator.into(),
        })
    }

    fn own_global(&self, key: &str) -> Result<Option<Value>, Rejection> {
        let app = self.app()?;
        if let Some(value) = self.overlay.global.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(self
            .ledger
            .app(app.id)
            .and_then(|a| a.global.get(key))
            .cloned())
    }

    fn own_local(&self, account: Address, key: &str) -> Result<Option<Value>, Rejection> {
        let app = self.app()?;
        if !self.ledger.is_opted_in(account, app.id) {
            return Err(Rejection::NotOptedIn(account));
        }
        if let Some(value) = self.overlay.local.get(&account).and_then(|m| m.get(key)) {
            return Ok(Some(value.clone()));
        }
        Ok(self
            .ledger
            .local_state(account, app.id)
            .and_then(|m| m.get(key))
            .cloned())
    }

    fn probe(&mut self, source: &ProbeSource) -> Result<Option<Value>, Rejection> {
        match source {
            ProbeSource::Global { app: None, key } => self.own_global(key),
            ProbeSource::Global { app: Some(app), key } => {
                self.app()?;
                let id = self.int(app, "probe app")?;
                Ok(self.ledger.app(id).and_then(|a| a.global.get(key)).cloned())
            }
            ProbeSource::Local { account, app, key } => {
                let account = self.address(account, "local account")?;
                let own = self.app()?.id;
                let id = match app {
                    Some(app) => self.int(app, "probe app")?,
                    None => own,
                };
                if !self.ledger.is_opted_in(account, id) {
                    return Ok(None);
                }
                if id == own {
                    return self.own_local(account, key);
                }
                Ok(self
                    .ledger
                    .local_state(account, id)
                    .and_then(|m| m.get(key))
                    .cloned())
            }
        }
    }

    fn slot(&self, slot: SlotId) -> Result<&Option<Value>, Rejection> {
        self.slots.get(&slot).ok_or(Rejection::UnboundSlot(slot))
    }

    fn write(&mut self, account: Option<Address>, key: &str, value: Value) {
        tracing::debug!(
            account = ?account.map(|a| a.to_hex()),
            key,
            value = ?value,
            "state write"
        );
        self.events.push(TraceEvent::Write {
            txn: self.index,
            account,
            key: key.to_string(),
            value: value.clone(),
        });
        match account {
            None => {
                self.overlay.global.insert(key.to_string(), value);
            }
            Some(account) => {
                self.overlay
                    .local
                    .entry(account)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, Rejection> {
        if op.is_equality() {
            let left = self.eval(lhs)?;
            let right = self.eval(rhs)?;
            let kind = kind_of(&left);
            if kind == ValueKind::None {
                return Err(mismatch(op.symbol(), ValueKind::Int, &left));
            }
            if kind != kind_of(&right) {
                return Err(mismatch(op.symbol(), kind, &right));
            }
            let same = left == right;
            return Ok(flag(if op == BinaryOp::Eq { same } else { !same }));
        }

        let a = self.int(lhs, op.symbol())?;
        let b = self.int(rhs, op.symbol())?;
        let out = match op {
            BinaryOp::Add => a.checked_add(b).ok_or(Rejection::Overflow("+"))?,
            BinaryOp::Sub => a.checked_sub(b).ok_or(Rejection::Underflow)?,
            BinaryOp::Mul => a.checked_mul(b).ok_or(Rejection::Overflow("*"))?,
            BinaryOp::Div => a.checked_div(b).ok_or(Rejection::DivideByZero)?,
            BinaryOp::Mod => a.checked_rem(b).ok_or(Rejection::DivideByZero)?,
            BinaryOp::Lt => u64::from(a < b),
            BinaryOp::Le => u64::from(a <= b),
            BinaryOp::Gt => u64::from(a > b),
            BinaryOp::Ge => u64::from(a >= b),
            BinaryOp::And => u64::from(a != 0 && b != 0),
            BinaryOp::Or => u64::from(a != 0 || b != 0),
            BinaryOp::Eq => u64::from(a == b),
            BinaryOp::Ne => u64::from(a != b),
        };
        Ok(Value::Int(out))
    }

    fn eval(&mut self, expr: &Expr) -> Eval {
        let value = match expr {
            Expr::Int(n) => Value::Int(*n),
            Expr::Bytes(b) => Value::Bytes(b.clone()),
            Expr::Addr(a) => (*a).into(),
            Expr::Txn { index, field } => {
                let i = self.txn_at(index.as_deref())?;
                self.txn_field(i, *field)
            }
            Expr::Arg { index, arg } => {
                let i = self.txn_at(index.as_deref())?;
                let args = self.group[i].args();
                let value = args.get(*arg as usize).ok_or(Rejection::MissingArg(*arg))?;
                Value::Bytes(value.clone())
            }
            Expr::Global(field) => self.global_field(*field)?,
            Expr::Btoi(inner) => {
                let raw = self.bytes(inner, "btoi")?;
                if raw.len() > 8 {
                    return Err(Rejection::BtoiTooLong(raw.len()));
                }
                Value::Int(raw.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
            }
            Expr::Not(inner) => flag(self.int(inner, "!")? == 0),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs)?,
            Expr::GlobalGet { key, .. } => self.own_global(key)?.unwrap_or(Value::Int(0)),
            Expr::LocalGet { account, key, .. } => {
                let account = self.address(account, "local account")?;
                self.own_local(account, key)?.unwrap_or(Value::Int(0))
            }
            Expr::Probe { slot, source } => {
                let found = self.probe(source)?;
                self.slots.insert(*slot, found);
                return Ok(None);
            }
            Expr::SlotValue { slot, .. } => self.slot(*slot)?.clone().unwrap_or(Value::Int(0)),
            Expr::SlotHasValue { slot } => flag(self.slot(*slot)?.is_some()),
            Expr::GlobalPut { key, value } => {
                self.app()?;
                let value = self.eval(value)?.ok_or(Rejection::TypeMismatch {
                    context: "stored value",
                    expected: ValueKind::Int,
                    found: ValueKind::None,
                })?;
                self.write(None, key, value);
                return Ok(None);
            }
            Expr::LocalPut {
                account,
                key,
                value,
            } => {
                let app = self.app()?;
                let account = self.address(account, "local account")?;
                let value = self.eval(value)?.ok_or(Rejection::TypeMismatch {
                    context: "stored value",
                    expected: ValueKind::Int,
                    found: ValueKind::None,
                })?;
                if !self.ledger.is_opted_in(account, app.id) {
                    return Err(Rejection::NotOptedIn(account));
                }
                self.write(Some(account), key, value);
                return Ok(None);
            }
            Expr::OptedIn { account, app } => {
                self.app()?;
                let account = self.address(account, "opted-in account")?;
                let id = self.int(app, "opted-in app")?;
                flag(self.ledger.is_opted_in(account, id))
            }
            Expr::Seq(steps) => {
                let mut last = None;
                for step in steps {
                    last = self.eval(step)?;
                }
                return Ok(last);
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.int(cond, "if condition")? != 0 {
                    return self.eval(then);
                }
                return match otherwise {
                    Some(otherwise) => self.eval(otherwise),
                    None => Ok(None),
                };
            }
            Expr::Cond(arms) => {
                for (arm, branch) in arms.iter().enumerate() {
                    if self.int(&branch.guard, "cond guard")? == 0 {
                        continue;
                    }
                    if self.depth == 0 && self.root_arm.is_none() {
                        self.root_arm = Some(arm);
                    }
                    self.events.push(TraceEvent::BranchTaken {
                        txn: self.index,
                        depth: self.depth,
                        arm,
                    });
                    self.depth += 1;
                    let out = self.eval(&branch.body);
                    self.depth -= 1;
                    return out;
                }
                return Err(Rejection::NoArmMatched);
            }
            Expr::Assert(cond) => {
                if self.int(cond, "assert")? == 0 {
                    return Err(Rejection::AssertFailed);
                }
                return Ok(None);
            }
            Expr::Pay { receiver, amount } => {
                self.app()?;
                let receiver = self.address(receiver, "payment receiver")?;
                let amount = self.int(amount, "payment amount")?;
                if self.overlay.payment.is_some() {
                    return Err(Rejection::SecondPayment);
                }
                tracing::debug!(receiver = %receiver, amount, "nested payment");
                self.events.push(TraceEvent::Payment {
                    txn: self.index,
                    receiver,
                    amount,
                });
                self.overlay.payment = Some((receiver, amount));
                return Ok(None);
            }
        };
        Ok(Some(value))
    }
}
