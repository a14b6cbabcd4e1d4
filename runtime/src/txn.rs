//! Transactions accepted by the reference ledger.

use serde::{Deserialize, Serialize};
use verdict_core::{Address, OnCompletion, TxnType};
use verdict_flow::AppPrograms;

/// Lowest fee the ledger accepts.
pub const MIN_FEE: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnBody {
    Payment {
        receiver: Address,
        amount: u64,
        close_remainder_to: Address,
    },
    AppCall {
        /// `0` creates a new application.
        app_id: u64,
        on_completion: OnCompletion,
        args: Vec<Vec<u8>>,
        /// Programs installed by a creation or update call.
        programs: Option<Box<AppPrograms>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub lease: [u8; 32],
    pub rekey_to: Address,
    pub body: TxnBody,
}

impl Transaction {
    fn new(sender: Address, body: TxnBody) -> Self {
        Self {
            sender,
            fee: MIN_FEE,
            first_valid: 0,
            last_valid: u64::MAX,
            lease: [0; 32],
            rekey_to: Address::ZERO,
            body,
        }
    }

    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self::new(
            sender,
            TxnBody::Payment {
                receiver,
                amount,
                close_remainder_to: Address::ZERO,
            },
        )
    }

    fn app_call(sender: Address, app_id: u64, on_completion: OnCompletion) -> Self {
        Self::new(
            sender,
            TxnBody::AppCall {
                app_id,
                on_completion,
                args: Vec::new(),
                programs: None,
            },
        )
    }

    pub fn create(sender: Address, programs: AppPrograms) -> Self {
        Self::app_call(sender, 0, OnCompletion::NoOp).with_programs(programs)
    }

    /// No-op call whose arguments are `args`.
    pub fn call<A: Into<Vec<u8>>>(
        sender: Address,
        app_id: u64,
        args: impl IntoIterator<Item = A>,
    ) -> Self {
        Self::app_call(sender, app_id, OnCompletion::NoOp).with_args(args)
    }

    pub fn opt_in(sender: Address, app_id: u64) -> Self {
        Self::app_call(sender, app_id, OnCompletion::OptIn)
    }

    pub fn close_out(sender: Address, app_id: u64) -> Self {
        Self::app_call(sender, app_id, OnCompletion::CloseOut)
    }

    pub fn clear(sender: Address, app_id: u64) -> Self {
        Self::app_call(sender, app_id, OnCompletion::ClearState)
    }

    pub fn update(sender: Address, app_id: u64, programs: AppPrograms) -> Self {
        Self::app_call(sender, app_id, OnCompletion::UpdateApplication).with_programs(programs)
    }

    pub fn delete(sender: Address, app_id: u64) -> Self {
        Self::app_call(sender, app_id, OnCompletion::DeleteApplication)
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_validity(mut self, first_valid: u64, last_valid: u64) -> Self {
        self.first_valid = first_valid;
        self.last_valid = last_valid;
        self
    }

    pub fn with_lease(mut self, lease: [u8; 32]) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_rekey_to(mut self, rekey_to: Address) -> Self {
        self.rekey_to = rekey_to;
        self
    }

    /// Only meaningful for payments.
    pub fn with_close_remainder_to(mut self, target: Address) -> Self {
        if let TxnBody::Payment {
            close_remainder_to, ..
        } = &mut self.body
        {
            *close_remainder_to = target;
        }
        self
    }

    /// Only meaningful for application calls.
    pub fn with_on_completion(mut self, value: OnCompletion) -> Self {
        if let TxnBody::AppCall { on_completion, .. } = &mut self.body {
            *on_completion = value;
        }
        self
    }

    /// Only meaningful for application calls.
    pub fn with_args<A: Into<Vec<u8>>>(mut self, values: impl IntoIterator<Item = A>) -> Self {
        if let TxnBody::AppCall { args, .. } = &mut self.body {
            *args = values.into_iter().map(Into::into).collect();
        }
        self
    }

    fn with_programs(mut self, value: AppPrograms) -> Self {
        if let TxnBody::AppCall { programs, .. } = &mut self.body {
            *programs = Some(Box::new(value));
        }
        self
    }

    pub fn type_enum(&self) -> TxnType {
        match self.body {
            TxnBody::Payment { .. } => TxnType::Payment,
            TxnBody::AppCall { .. } => TxnType::ApplicationCall,
        }
    }

    pub fn args(&self) -> &[Vec<u8>] {
        match &self.body {
            TxnBody::AppCall { args, .. } => args,
            TxnBody::Payment { .. } => &[],
        }
    }
}

/// Big-endian encoding of an integer argument.
pub fn int_arg(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}
