use crate::value::ValueKind;
use thiserror::Error;

/// Construction-time errors of the expression model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("kind mismatch in {context}: expected {expected}, found {found}")]
    KindMismatch {
        context: &'static str,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("conditional has no arms")]
    EmptyCond,
}

impl ExprError {
    pub(crate) fn mismatch(context: &'static str, expected: ValueKind, found: ValueKind) -> Self {
        ExprError::KindMismatch {
            context,
            expected,
            found,
        }
    }
}
