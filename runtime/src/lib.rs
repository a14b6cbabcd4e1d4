//! # Verdict Runtime: reference evaluator
//!
//! An in-memory ledger that evaluates compiled programs the way the
//! target engine does, for tests and dry runs:
//!
//! * [`Ledger`]: accounts, applications, clock, atomic group submission
//! * [`Transaction`]: payments and application calls
//! * [`Receipt`] / [`Timeline`]: what an accepted group did
//!
//! Evaluation is synchronous and single-threaded; callers own the ledger.

mod eval;

pub mod error;
pub mod ledger;
pub mod receipt;
pub mod timeline;
pub mod txn;

pub use error::{EvalError, Rejection};
pub use ledger::{Account, Application, Ledger, MAX_GROUP_SIZE};
pub use receipt::{InnerPayment, Receipt, TxnOutcome};
pub use timeline::{ProgramKind, Timeline, TraceEvent};
pub use txn::{int_arg, Transaction, TxnBody, MIN_FEE};

pub mod prelude {
    pub use crate::error::{EvalError, Rejection};
    pub use crate::ledger::Ledger;
    pub use crate::receipt::Receipt;
    pub use crate::txn::{int_arg, Transaction};
}
