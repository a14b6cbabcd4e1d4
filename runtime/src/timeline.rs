use serde::{Deserialize, Serialize};
use verdict_core::{Address, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Approval,
    Clear,
    Logic,
}

/// A discrete event recorded while evaluating a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    ProgramEnter {
        txn: usize,
        app: u64,
        program: ProgramKind,
    },
    /// A first-match conditional selected `arm`. `depth` 0 is the
    /// program's own decision table.
    BranchTaken {
        txn: usize,
        depth: usize,
        arm: usize,
    },
    Write {
        txn: usize,
        /// `None` for global state.
        account: Option<Address>,
        key: String,
        value: Value,
    },
    Payment {
        txn: usize,
        receiver: Address,
        amount: u64,
    },
    ProgramExit {
        txn: usize,
        approved: bool,
    },
    Rejected {
        txn: usize,
        reason: String,
    },
}

/// Sequential record of one group's evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Timeline {
    pub events: Vec<TraceEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = TraceEvent>) {
        self.events.extend(events);
    }

    /// Events belonging to transaction `txn`.
    pub fn for_txn(&self, txn: usize) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(move |e| e.txn() == txn)
    }

    /// Writes recorded for transaction `txn`, in order.
    pub fn writes(&self, txn: usize) -> Vec<(Option<Address>, &str, &Value)> {
        self.for_txn(txn)
            .filter_map(|e| match e {
                TraceEvent::Write {
                    account,
                    key,
                    value,
                    ..
                } => Some((*account, key.as_str(), value)),
                _ => None,
            })
            .collect()
    }
}

impl TraceEvent {
    pub fn txn(&self) -> usize {
        match self {
            TraceEvent::ProgramEnter { txn, .. }
            | TraceEvent::BranchTaken { txn, .. }
            | TraceEvent::Write { txn, .. }
            | TraceEvent::Payment { txn, .. }
            | TraceEvent::ProgramExit { txn, .. }
            | TraceEvent::Rejected { txn, .. } => *txn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_are_filtered_by_transaction() {
        let mut timeline = Timeline::new();
        timeline.push(TraceEvent::Write {
            txn: 0,
            account: None,
            key: "count".into(),
            value: Value::Int(1),
        });
        timeline.push(TraceEvent::Write {
            txn: 1,
            account: Some(Address::from_index(1)),
            key: "count".into(),
            value: Value::Int(2),
        });
        timeline.push(TraceEvent::ProgramExit {
            txn: 1,
            approved: true,
        });
        assert_eq!(timeline.writes(0), vec![(None, "count", &Value::Int(1))]);
        assert_eq!(timeline.for_txn(1).count(), 2);
    }
}
