use crate::lint::LintError;
use thiserror::Error;
use verdict_core::{ExprError, ValueKind};

/// Declaration errors. Raised while a program is being assembled, never
/// at evaluation time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("key name `{name}` is {len} bytes, the limit is {max}")]
    KeyTooLong { name: String, len: usize, max: usize },
    #[error("key `{0}` is declared twice in the same scope")]
    DuplicateKey(String),
    #[error("key `{0}` targets a foreign application and cannot carry a default")]
    ForeignDefault(String),
    #[error("default of key `{name}` is {found}, the key holds {expected}")]
    DefaultKind {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("key `{0}` cannot hold values of kind none")]
    UnitKey(String),
    #[error("scope targets a foreign application and is read-only")]
    ForeignScope,
    #[error("scope targets the running application, use `build`")]
    HomeScope,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    #[error("key `{name}` is {actual}, not {requested}")]
    KeyMismatch {
        name: String,
        requested: &'static str,
        actual: &'static str,
    },
    #[error("action name must not be empty")]
    EmptyActionName,
    #[error("action `{0}` is declared twice")]
    DuplicateAction(String),
    #[error("probe slots exhausted ({0} available)")]
    SlotsExhausted(usize),
}

/// Errors raised by [`crate::DecisionTable::compile`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Lint(#[from] LintError),
    #[error("branch `{branch}` must evaluate to an integer, found {found}")]
    NonIntegerBody { branch: String, found: ValueKind },
}
