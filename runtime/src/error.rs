use thiserror::Error;
use verdict_core::{Address, SlotId, ValueKind};

/// Why the engine refused a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("program returned zero")]
    Denied,
    #[error("assertion failed")]
    AssertFailed,
    #[error("no conditional arm matched")]
    NoArmMatched,
    #[error("integer overflow in `{0}`")]
    Overflow(&'static str),
    #[error("integer underflow")]
    Underflow,
    #[error("division by zero")]
    DivideByZero,
    #[error("btoi input is {0} bytes, at most 8 allowed")]
    BtoiTooLong(usize),
    #[error("{context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("application argument {0} is missing")]
    MissingArg(u8),
    #[error("group index {0} is out of range")]
    GroupIndex(u64),
    #[error("{0} read before its probe")]
    UnboundSlot(SlotId),
    #[error("expected a 32-byte address, found {0} bytes")]
    BadAddress(usize),
    #[error("account {0} is not opted in")]
    NotOptedIn(Address),
    #[error("account {0} is already opted in")]
    AlreadyOptedIn(Address),
    #[error("account {account} holds {have}, needs {need}")]
    Overdraft {
        account: Address,
        have: u64,
        need: u64,
    },
    #[error("only one nested payment per invocation")]
    SecondPayment,
    #[error("{scope} state exceeds its schema")]
    SchemaExceeded { scope: &'static str },
    #[error("application {0} does not exist")]
    UnknownApp(u64),
    #[error("creation call carries no programs")]
    MissingPrograms,
    #[error("state access in a stateless program")]
    StatefulOp,
    #[error("round {round} is outside the validity window {first}..={last}")]
    OutsideValidity { round: u64, first: u64, last: u64 },
}

/// Errors returned by [`crate::Ledger::submit`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("transaction {index} rejected: {reason}")]
    Rejected { index: usize, reason: Rejection },
    #[error("empty transaction group")]
    EmptyGroup,
    #[error("group of {0} transactions exceeds the limit of {max}", max = crate::ledger::MAX_GROUP_SIZE)]
    GroupTooLarge(usize),
}

impl EvalError {
    /// The rejection reason, if a transaction was refused.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            EvalError::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
