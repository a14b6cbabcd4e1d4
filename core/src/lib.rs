//! Verdict Core - Expression/Program Model
//!
//! This crate defines the tree every program is made of:
//! - `Expr`: the raw tagged-union node tree with static kinds
//! - `IntExpr` / `BytesExpr` / `UnitExpr`: typed handles for building it
//! - `StateSchema`, `Value`, `Address`: the data the engine stores
//!
//! **IMPORTANT**: nothing here evaluates programs. See `verdict-runtime`.

pub mod error;
pub mod expr;
pub mod field;
pub mod schematic;
pub mod storage;
pub mod typed;
pub mod value;

pub use error::ExprError;
pub use expr::{Arm, BinaryOp, Expr, ProbeSource, SlotId};
pub use field::{GlobalField, OnCompletion, TxnField, TxnType};
pub use schematic::Schematic;
pub use typed::{BytesExpr, IntExpr, Stored, Typed, UnitExpr};
pub use value::{Address, StateSchema, Value, ValueKind};

pub mod prelude {
    pub use crate::error::ExprError;
    pub use crate::expr::{Expr, SlotId};
    pub use crate::field::{OnCompletion, TxnType};
    pub use crate::schematic::Schematic;
    pub use crate::typed::{
        addr, all, any, assert, bytes, gtxn, int, pay, select, txn, when, BytesExpr, Cond,
        Global, IntExpr, Seq, Stored, Typed, UnitExpr,
    };
    pub use crate::value::{Address, StateSchema, Value, ValueKind};
}
