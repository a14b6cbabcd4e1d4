//! # Expr: the program tree
//!
//! A program is a single tagged-union tree. Every node has a static
//! [`ValueKind`]; [`Expr::check`] computes it and rejects kind-mismatched
//! composition. The typed handles in [`crate::typed`] make the same
//! mistakes unrepresentable when programs are built in Rust, so `check`
//! mostly matters for trees that arrive deserialized or hand-assembled.
//!
//! Evaluation order is declaration order. Boolean combinators evaluate
//! both operands; use [`Expr::If`] when the right operand must not run.

use crate::error::ExprError;
use crate::field::{GlobalField, TxnField};
use crate::value::{Address, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request-local transient slot bound by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u16);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// `==` and `!=` compare any two values of the same kind; everything
    /// else is integer-only.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

/// Where a probe looks for a possibly-absent key.
///
/// `app: None` targets the running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeSource {
    Global {
        app: Option<Box<Expr>>,
        key: String,
    },
    Local {
        account: Box<Expr>,
        app: Option<Box<Expr>>,
        key: String,
    },
}

impl ProbeSource {
    pub fn key(&self) -> &str {
        match self {
            ProbeSource::Global { key, .. } | ProbeSource::Local { key, .. } => key,
        }
    }
}

/// One arm of a first-match conditional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arm {
    pub guard: Expr,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(u64),
    Bytes(Vec<u8>),
    Addr(Address),

    /// Field of the current transaction (`index: None`) or of the grouped
    /// transaction at `index`.
    Txn {
        index: Option<Box<Expr>>,
        field: TxnField,
    },
    /// Application argument `arg` of the current or a grouped transaction.
    Arg {
        index: Option<Box<Expr>>,
        arg: u8,
    },
    Global(GlobalField),

    Btoi(Box<Expr>),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    GlobalGet {
        key: String,
        kind: ValueKind,
    },
    LocalGet {
        account: Box<Expr>,
        key: String,
        kind: ValueKind,
    },
    Probe {
        slot: SlotId,
        source: ProbeSource,
    },
    SlotValue {
        slot: SlotId,
        kind: ValueKind,
    },
    SlotHasValue {
        slot: SlotId,
    },
    GlobalPut {
        key: String,
        value: Box<Expr>,
    },
    LocalPut {
        account: Box<Expr>,
        key: String,
        value: Box<Expr>,
    },
    OptedIn {
        account: Box<Expr>,
        app: Box<Expr>,
    },

    Seq(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Cond(Vec<Arm>),
    Assert(Box<Expr>),
    Pay {
        receiver: Box<Expr>,
        amount: Box<Expr>,
    },
}

impl Expr {
    /// Compute the static kind of this tree, rejecting mismatched
    /// composition anywhere inside it.
    pub fn check(&self) -> Result<ValueKind, ExprError> {
        match self {
            Expr::Int(_) => Ok(ValueKind::Int),
            Expr::Bytes(_) | Expr::Addr(_) => Ok(ValueKind::Bytes),
            Expr::Txn { index, field } => {
                expect_opt(index.as_deref(), ValueKind::Int, "group index")?;
                Ok(field.kind())
            }
            Expr::Arg { index, .. } => {
                expect_opt(index.as_deref(), ValueKind::Int, "group index")?;
                Ok(ValueKind::Bytes)
            }
            Expr::Global(field) => Ok(field.kind()),
            Expr::Btoi(inner) => {
                expect(inner, ValueKind::Bytes, "btoi")?;
                Ok(ValueKind::Int)
            }
            Expr::Not(inner) => {
                expect(inner, ValueKind::Int, "!")?;
                Ok(ValueKind::Int)
            }
            Expr::Binary { op, lhs, rhs } => {
                if op.is_equality() {
                    let left = lhs.check()?;
                    if left == ValueKind::None {
                        return Err(ExprError::mismatch(op.symbol(), ValueKind::Int, left));
                    }
                    expect(rhs, left, op.symbol())?;
                } else {
                    expect(lhs, ValueKind::Int, op.symbol())?;
                    expect(rhs, ValueKind::Int, op.symbol())?;
                }
                Ok(ValueKind::Int)
            }
            Expr::GlobalGet { kind, .. } | Expr::SlotValue { kind, .. } => stored(*kind),
            Expr::LocalGet { account, kind, .. } => {
                expect(account, ValueKind::Bytes, "local account")?;
                stored(*kind)
            }
            Expr::Probe { source, .. } => {
                match source {
                    ProbeSource::Global { app, .. } => {
                        expect_opt(app.as_deref(), ValueKind::Int, "probe app")?;
                    }
                    ProbeSource::Local { account, app, .. } => {
                        expect(account, ValueKind::Bytes, "local account")?;
                        expect_opt(app.as_deref(), ValueKind::Int, "probe app")?;
                    }
                }
                Ok(ValueKind::None)
            }
            Expr::SlotHasValue { .. } => Ok(ValueKind::Int),
            Expr::GlobalPut { value, .. } => {
                stored(value.check()?)?;
                Ok(ValueKind::None)
            }
            Expr::LocalPut { account, value, .. } => {
                expect(account, ValueKind::Bytes, "local account")?;
                stored(value.check()?)?;
                Ok(ValueKind::None)
            }
            Expr::OptedIn { account, app } => {
                expect(account, ValueKind::Bytes, "opted-in account")?;
                expect(app, ValueKind::Int, "opted-in app")?;
                Ok(ValueKind::Int)
            }
            Expr::Seq(steps) => {
                let Some((last, init)) = steps.split_last() else {
                    return Ok(ValueKind::None);
                };
                for step in init {
                    expect(step, ValueKind::None, "sequence step")?;
                }
                last.check()
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                expect(cond, ValueKind::Int, "if condition")?;
                let kind = then.check()?;
                match otherwise {
                    None if kind != ValueKind::None => {
                        Err(ExprError::mismatch("if without else", ValueKind::None, kind))
                    }
                    None => Ok(ValueKind::None),
                    Some(otherwise) => {
                        expect(otherwise, kind, "if branches")?;
                        Ok(kind)
                    }
                }
            }
            Expr::Cond(arms) => {
                let first = arms.first().ok_or(ExprError::EmptyCond)?;
                let kind = first.body.check()?;
                for arm in arms {
                    expect(&arm.guard, ValueKind::Int, "cond guard")?;
                    expect(&arm.body, kind, "cond body")?;
                }
                Ok(kind)
            }
            Expr::Assert(cond) => {
                expect(cond, ValueKind::Int, "assert")?;
                Ok(ValueKind::None)
            }
            Expr::Pay { receiver, amount } => {
                expect(receiver, ValueKind::Bytes, "payment receiver")?;
                expect(amount, ValueKind::Int, "payment amount")?;
                Ok(ValueKind::None)
            }
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Int(_)
            | Expr::Bytes(_)
            | Expr::Addr(_)
            | Expr::Global(_)
            | Expr::GlobalGet { .. }
            | Expr::SlotValue { .. }
            | Expr::SlotHasValue { .. } => Vec::new(),
            Expr::Txn { index, .. } | Expr::Arg { index, .. } => index.iter().map(|i| &**i).collect(),
            Expr::Btoi(inner) | Expr::Not(inner) | Expr::Assert(inner) => vec![&**inner],
            Expr::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            Expr::LocalGet { account, .. } => vec![&**account],
            Expr::Probe { source, .. } => match source {
                ProbeSource::Global { app, .. } => app.iter().map(|a| &**a).collect(),
                ProbeSource::Local { account, app, .. } => {
                    let mut out: Vec<&Expr> = vec![&**account];
                    out.extend(app.iter().map(|a| &**a));
                    out
                }
            },
            Expr::GlobalPut { value, .. } => vec![&**value],
            Expr::LocalPut { account, value, .. } => vec![&**account, &**value],
            Expr::OptedIn { account, app } => vec![&**account, &**app],
            Expr::Seq(steps) => steps.iter().collect(),
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                let mut out: Vec<&Expr> = vec![&**cond, &**then];
                out.extend(otherwise.iter().map(|o| &**o));
                out
            }
            Expr::Cond(arms) => arms.iter().flat_map(|a| [&a.guard, &a.body]).collect(),
            Expr::Pay { receiver, amount } => vec![&**receiver, &**amount],
        }
    }

    /// Total number of nodes in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }
}

fn stored(kind: ValueKind) -> Result<ValueKind, ExprError> {
    if kind == ValueKind::None {
        return Err(ExprError::mismatch("stored value", ValueKind::Int, kind));
    }
    Ok(kind)
}

fn expect(expr: &Expr, kind: ValueKind, context: &'static str) -> Result<(), ExprError> {
    let found = expr.check()?;
    if found != kind {
        return Err(ExprError::mismatch(context, kind, found));
    }
    Ok(())
}

fn expect_opt(expr: Option<&Expr>, kind: ValueKind, context: &'static str) -> Result<(), ExprError> {
    match expr {
        Some(expr) => expect(expr, kind, context),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn test_arithmetic_on_bytes_is_rejected() {
        let expr = bin(BinaryOp::Add, Expr::Int(1), Expr::Bytes(b"x".to_vec()));
        assert_eq!(
            expr.check(),
            Err(ExprError::KindMismatch {
                context: "+",
                expected: ValueKind::Int,
                found: ValueKind::Bytes,
            })
        );
    }

    #[test]
    fn test_equality_accepts_matching_bytes() {
        let expr = bin(BinaryOp::Eq, Expr::Addr(Address::ZERO), Expr::Bytes(vec![0; 32]));
        assert_eq!(expr.check(), Ok(ValueKind::Int));
    }

    #[test]
    fn test_sequence_kind_is_last_element() {
        let put = Expr::GlobalPut {
            key: "k".into(),
            value: Box::new(Expr::Int(1)),
        };
        assert_eq!(Expr::Seq(vec![put.clone(), Expr::Int(1)]).check(), Ok(ValueKind::Int));
        assert_eq!(Expr::Seq(vec![]).check(), Ok(ValueKind::None));
        // a value in a non-final position would be silently discarded
        assert!(Expr::Seq(vec![Expr::Int(1), put]).check().is_err());
    }

    #[test]
    fn test_if_branches_must_agree() {
        let expr = Expr::If {
            cond: Box::new(Expr::Int(1)),
            then: Box::new(Expr::Int(1)),
            otherwise: Some(Box::new(Expr::Bytes(vec![]))),
        };
        assert!(matches!(expr.check(), Err(ExprError::KindMismatch { context: "if branches", .. })));
    }

    #[test]
    fn test_empty_cond_is_rejected() {
        assert_eq!(Expr::Cond(vec![]).check(), Err(ExprError::EmptyCond));
    }

    #[test]
    fn test_children_follow_evaluation_order() {
        let expr = bin(BinaryOp::Sub, Expr::Int(5), Expr::Int(3));
        assert_eq!(expr.children(), vec![&Expr::Int(5), &Expr::Int(3)]);
        assert_eq!(expr.size(), 3);
    }
}
