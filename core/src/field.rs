//! Engine-provided read-only inputs: transaction fields, ledger globals and
//! invocation metadata codes.

use crate::value::ValueKind;
use serde::{Deserialize, Serialize};

/// A field of the current transaction or of a grouped transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnField {
    Sender,
    Fee,
    FirstValid,
    LastValid,
    Lease,
    Receiver,
    Amount,
    CloseRemainderTo,
    RekeyTo,
    TypeEnum,
    ApplicationId,
    OnCompletion,
    NumAppArgs,
    GroupIndex,
}

impl TxnField {
    pub fn kind(&self) -> ValueKind {
        match self {
            TxnField::Sender
            | TxnField::Lease
            | TxnField::Receiver
            | TxnField::CloseRemainderTo
            | TxnField::RekeyTo => ValueKind::Bytes,
            _ => ValueKind::Int,
        }
    }
}

/// A ledger-wide value readable by any program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalField {
    LatestTimestamp,
    Round,
    MinTxnFee,
    GroupSize,
    ZeroAddress,
    CurrentApplicationId,
    CurrentApplicationAddress,
    CreatorAddress,
}

impl GlobalField {
    pub fn kind(&self) -> ValueKind {
        match self {
            GlobalField::ZeroAddress
            | GlobalField::CurrentApplicationAddress
            | GlobalField::CreatorAddress => ValueKind::Bytes,
            _ => ValueKind::Int,
        }
    }
}

/// What an application call asks the engine to do besides running the
/// approval program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCompletion {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

impl OnCompletion {
    pub fn code(&self) -> u64 {
        match self {
            OnCompletion::NoOp => 0,
            OnCompletion::OptIn => 1,
            OnCompletion::CloseOut => 2,
            OnCompletion::ClearState => 3,
            OnCompletion::UpdateApplication => 4,
            OnCompletion::DeleteApplication => 5,
        }
    }
}

/// Transaction type codes as exposed by `TxnField::TypeEnum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnType {
    Payment,
    ApplicationCall,
}

impl TxnType {
    pub fn code(&self) -> u64 {
        match self {
            TxnType::Payment => 1,
            TxnType::ApplicationCall => 6,
        }
    }
}
