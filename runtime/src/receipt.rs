use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use verdict_core::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerPayment {
    pub receiver: Address,
    pub amount: u64,
}

/// Result of one transaction of an accepted group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnOutcome {
    pub index: usize,
    /// Application called, if any.
    pub app_id: Option<u64>,
    pub created: bool,
    /// `false` only for a clear call whose program refused; the account is
    /// cleared regardless.
    pub approved: bool,
    /// Label of the decision-table branch that ran.
    pub branch: Option<String>,
    pub inner_payment: Option<InnerPayment>,
}

impl TxnOutcome {
    pub(crate) fn payment(index: usize) -> Self {
        Self {
            index,
            app_id: None,
            created: false,
            approved: true,
            branch: None,
            inner_payment: None,
        }
    }
}

/// What an accepted group did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Receipt {
    pub outcomes: Vec<TxnOutcome>,
    pub timeline: Timeline,
}

impl Receipt {
    /// Id of the first application created by the group.
    pub fn created_app(&self) -> Option<u64> {
        self.outcomes
            .iter()
            .find(|o| o.created)
            .and_then(|o| o.app_id)
    }

    pub fn branch(&self, index: usize) -> Option<&str> {
        self.outcomes.get(index)?.branch.as_deref()
    }

    pub fn inner_payments(&self) -> impl Iterator<Item = &InnerPayment> {
        self.outcomes.iter().filter_map(|o| o.inner_payment.as_ref())
    }
}
