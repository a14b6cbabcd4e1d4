//! Typed expression handles.
//!
//! `IntExpr`, `BytesExpr` and `UnitExpr` wrap a raw [`Expr`] whose kind is
//! known. Builders only accept handles of the right kind, so an
//! integer-plus-bytes program does not compile.
//!
//! ```rust
//! use verdict_core::prelude::*;
//!
//! let budget = txn().arg(1).btoi();
//! let capped = budget.min(int(100));
//! let ok = capped.le(int(50)).and(Global::group_size().equals(int(1)));
//! assert_eq!(ok.as_expr().check(), Ok(ValueKind::Int));
//! ```

use crate::error::ExprError;
use crate::expr::{Arm, BinaryOp, Expr};
use crate::field::{GlobalField, TxnField};
use crate::value::{Address, Value, ValueKind};
use serde::Serialize;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Not, Rem, Sub};

pub(crate) mod sealed {
    pub trait Sealed {
        fn wrap(expr: super::Expr) -> Self;
    }
}

/// An expression handle whose kind is fixed by its type.
pub trait Typed: sealed::Sealed + Clone + Into<Expr> {
    const KIND: ValueKind;

    fn as_expr(&self) -> &Expr;

    fn into_expr(self) -> Expr;

    /// Wrap a raw tree after checking its kind.
    fn try_from_expr(expr: Expr) -> Result<Self, ExprError> {
        let found = expr.check()?;
        if found != Self::KIND {
            return Err(ExprError::KindMismatch {
                context: "typed handle",
                expected: Self::KIND,
                found,
            });
        }
        Ok(<Self as sealed::Sealed>::wrap(expr))
    }
}

/// Handles whose values can live in storage.
pub trait Stored: Typed {
    type Literal: Clone + Into<Value>;

    fn literal(value: Self::Literal) -> Self;
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(Expr);

        impl sealed::Sealed for $name {
            fn wrap(expr: Expr) -> Self {
                $name(expr)
            }
        }

        impl Typed for $name {
            const KIND: ValueKind = $kind;

            fn as_expr(&self) -> &Expr {
                &self.0
            }

            fn into_expr(self) -> Expr {
                self.0
            }
        }

        impl From<$name> for Expr {
            fn from(handle: $name) -> Expr {
                handle.0
            }
        }
    };
}

typed_handle!(
    /// Integer-valued expression. Booleans are integers: zero is false.
    IntExpr,
    ValueKind::Int
);
typed_handle!(
    /// Byte-string-valued expression (addresses, keys, arguments).
    BytesExpr,
    ValueKind::Bytes
);
typed_handle!(
    /// Side-effecting expression with no value.
    UnitExpr,
    ValueKind::None
);

impl Stored for IntExpr {
    type Literal = u64;

    fn literal(value: u64) -> Self {
        int(value)
    }
}

impl Stored for BytesExpr {
    type Literal = Vec<u8>;

    fn literal(value: Vec<u8>) -> Self {
        bytes(value)
    }
}

fn boxed(expr: impl Into<Expr>) -> Box<Expr> {
    Box::new(expr.into())
}

fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> IntExpr {
    IntExpr(Expr::Binary {
        op,
        lhs: boxed(lhs),
        rhs: boxed(rhs),
    })
}

pub fn int(value: u64) -> IntExpr {
    IntExpr(Expr::Int(value))
}

pub fn bytes(value: impl Into<Vec<u8>>) -> BytesExpr {
    BytesExpr(Expr::Bytes(value.into()))
}

pub fn addr(address: Address) -> BytesExpr {
    BytesExpr(Expr::Addr(address))
}

impl From<u64> for IntExpr {
    fn from(value: u64) -> Self {
        int(value)
    }
}

impl From<Address> for BytesExpr {
    fn from(address: Address) -> Self {
        addr(address)
    }
}

impl From<&str> for BytesExpr {
    fn from(value: &str) -> Self {
        bytes(value.as_bytes())
    }
}

impl IntExpr {
    pub fn lt(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Lt, self, rhs.into())
    }

    pub fn le(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Le, self, rhs.into())
    }

    pub fn gt(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Gt, self, rhs.into())
    }

    pub fn ge(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Ge, self, rhs.into())
    }

    pub fn equals(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Eq, self, rhs.into())
    }

    pub fn not_equals(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Ne, self, rhs.into())
    }

    /// Logical and. Both sides are always evaluated.
    pub fn and(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::And, self, rhs.into())
    }

    /// Logical or. Both sides are always evaluated.
    pub fn or(self, rhs: impl Into<IntExpr>) -> IntExpr {
        binary(BinaryOp::Or, self, rhs.into())
    }

    pub fn min(self, rhs: impl Into<IntExpr>) -> IntExpr {
        let rhs = rhs.into();
        select(self.clone().lt(rhs.clone()), self, rhs)
    }
}

macro_rules! int_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<IntExpr>> $trait<R> for IntExpr {
            type Output = IntExpr;

            fn $method(self, rhs: R) -> IntExpr {
                binary($op, self, rhs.into())
            }
        }
    };
}

int_op!(Add, add, BinaryOp::Add);
int_op!(Sub, sub, BinaryOp::Sub);
int_op!(Mul, mul, BinaryOp::Mul);
int_op!(Div, div, BinaryOp::Div);
int_op!(Rem, rem, BinaryOp::Mod);

impl Not for IntExpr {
    type Output = IntExpr;

    fn not(self) -> IntExpr {
        IntExpr(Expr::Not(boxed(self)))
    }
}

impl BytesExpr {
    pub fn equals(self, rhs: impl Into<BytesExpr>) -> IntExpr {
        binary(BinaryOp::Eq, self, rhs.into())
    }

    pub fn not_equals(self, rhs: impl Into<BytesExpr>) -> IntExpr {
        binary(BinaryOp::Ne, self, rhs.into())
    }

    /// Big-endian bytes to integer.
    pub fn btoi(self) -> IntExpr {
        IntExpr(Expr::Btoi(boxed(self)))
    }
}

/// True when every condition holds; `int(1)` for an empty list.
pub fn all(conds: impl IntoIterator<Item = IntExpr>) -> IntExpr {
    conds.into_iter().reduce(|a, b| a.and(b)).unwrap_or_else(|| int(1))
}

/// True when any condition holds; `int(0)` for an empty list.
pub fn any(conds: impl IntoIterator<Item = IntExpr>) -> IntExpr {
    conds.into_iter().reduce(|a, b| a.or(b)).unwrap_or_else(|| int(0))
}

/// Ternary: evaluates `cond`, then exactly one of the branches.
pub fn select<T: Typed>(cond: IntExpr, then: T, otherwise: T) -> T {
    <T as sealed::Sealed>::wrap(Expr::If {
        cond: boxed(cond),
        then: boxed(then),
        otherwise: Some(boxed(otherwise)),
    })
}

/// Run `then` only when `cond` holds.
pub fn when(cond: IntExpr, then: UnitExpr) -> UnitExpr {
    UnitExpr(Expr::If {
        cond: boxed(cond),
        then: boxed(then),
        otherwise: None,
    })
}

/// Abort evaluation (reject) unless `cond` holds.
pub fn assert(cond: IntExpr) -> UnitExpr {
    UnitExpr(Expr::Assert(boxed(cond)))
}

/// Issue a nested payment from the application's address.
pub fn pay(receiver: impl Into<BytesExpr>, amount: impl Into<IntExpr>) -> UnitExpr {
    UnitExpr(Expr::Pay {
        receiver: boxed(receiver.into()),
        amount: boxed(amount.into()),
    })
}

/// Ordered side effects followed by an optional final value.
#[derive(Debug, Clone, Default)]
pub struct Seq {
    steps: Vec<Expr>,
}

impl Seq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: UnitExpr) -> Self {
        self.steps.push(step.0);
        self
    }

    pub fn then_all(mut self, steps: impl IntoIterator<Item = UnitExpr>) -> Self {
        self.steps.extend(steps.into_iter().map(|s| s.0));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn unit(self) -> UnitExpr {
        UnitExpr(Expr::Seq(self.steps))
    }

    /// Close the sequence with a value; the sequence evaluates to it.
    pub fn finish<T: Typed>(mut self, last: T) -> T {
        self.steps.push(last.into_expr());
        <T as sealed::Sealed>::wrap(Expr::Seq(self.steps))
    }
}

/// First-match multi-way conditional.
#[derive(Debug, Clone)]
pub struct Cond<T> {
    arms: Vec<Arm>,
    _kind: PhantomData<T>,
}

impl<T: Typed> Cond<T> {
    pub fn new() -> Self {
        Self {
            arms: Vec::new(),
            _kind: PhantomData,
        }
    }

    pub fn arm(mut self, guard: IntExpr, body: T) -> Self {
        self.arms.push(Arm {
            guard: guard.into_expr(),
            body: body.into_expr(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn build(self) -> Result<T, ExprError> {
        if self.arms.is_empty() {
            return Err(ExprError::EmptyCond);
        }
        Ok(<T as sealed::Sealed>::wrap(Expr::Cond(self.arms)))
    }
}

impl<T: Typed> Default for Cond<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference to the current transaction or to a grouped one.
#[derive(Debug, Clone, Default)]
pub struct TxnRef {
    index: Option<Box<Expr>>,
}

/// The transaction being approved.
pub fn txn() -> TxnRef {
    TxnRef { index: None }
}

/// The transaction at `index` in the current group.
pub fn gtxn(index: impl Into<IntExpr>) -> TxnRef {
    TxnRef {
        index: Some(boxed(index.into())),
    }
}

impl TxnRef {
    fn field(&self, field: TxnField) -> Expr {
        Expr::Txn {
            index: self.index.clone(),
            field,
        }
    }

    fn int_field(&self, field: TxnField) -> IntExpr {
        IntExpr(self.field(field))
    }

    fn bytes_field(&self, field: TxnField) -> BytesExpr {
        BytesExpr(self.field(field))
    }

    pub fn sender(&self) -> BytesExpr {
        self.bytes_field(TxnField::Sender)
    }

    pub fn fee(&self) -> IntExpr {
        self.int_field(TxnField::Fee)
    }

    pub fn first_valid(&self) -> IntExpr {
        self.int_field(TxnField::FirstValid)
    }

    pub fn last_valid(&self) -> IntExpr {
        self.int_field(TxnField::LastValid)
    }

    pub fn lease(&self) -> BytesExpr {
        self.bytes_field(TxnField::Lease)
    }

    pub fn receiver(&self) -> BytesExpr {
        self.bytes_field(TxnField::Receiver)
    }

    pub fn amount(&self) -> IntExpr {
        self.int_field(TxnField::Amount)
    }

    pub fn close_remainder_to(&self) -> BytesExpr {
        self.bytes_field(TxnField::CloseRemainderTo)
    }

    pub fn rekey_to(&self) -> BytesExpr {
        self.bytes_field(TxnField::RekeyTo)
    }

    pub fn type_enum(&self) -> IntExpr {
        self.int_field(TxnField::TypeEnum)
    }

    pub fn application_id(&self) -> IntExpr {
        self.int_field(TxnField::ApplicationId)
    }

    pub fn on_completion(&self) -> IntExpr {
        self.int_field(TxnField::OnCompletion)
    }

    pub fn num_args(&self) -> IntExpr {
        self.int_field(TxnField::NumAppArgs)
    }

    pub fn group_index(&self) -> IntExpr {
        self.int_field(TxnField::GroupIndex)
    }

    /// Application argument `n`. Reading past the end rejects at runtime.
    pub fn arg(&self, n: u8) -> BytesExpr {
        BytesExpr(Expr::Arg {
            index: self.index.clone(),
            arg: n,
        })
    }
}

/// Ledger-wide values.
pub struct Global;

impl Global {
    pub fn latest_timestamp() -> IntExpr {
        IntExpr(Expr::Global(GlobalField::LatestTimestamp))
    }

    pub fn round() -> IntExpr {
        IntExpr(Expr::Global(GlobalField::Round))
    }

    pub fn min_txn_fee() -> IntExpr {
        IntExpr(Expr::Global(GlobalField::MinTxnFee))
    }

    pub fn group_size() -> IntExpr {
        IntExpr(Expr::Global(GlobalField::GroupSize))
    }

    pub fn zero_address() -> BytesExpr {
        BytesExpr(Expr::Global(GlobalField::ZeroAddress))
    }

    pub fn current_application_id() -> IntExpr {
        IntExpr(Expr::Global(GlobalField::CurrentApplicationId))
    }

    pub fn current_application_address() -> BytesExpr {
        BytesExpr(Expr::Global(GlobalField::CurrentApplicationAddress))
    }

    pub fn creator_address() -> BytesExpr {
        BytesExpr(Expr::Global(GlobalField::CreatorAddress))
    }
}
