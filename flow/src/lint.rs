//! Probe-before-read lint.
//!
//! A slot read (`SlotValue`, `SlotHasValue`) is only meaningful after the
//! probe that binds it has run on every path leading to the read. The
//! walk follows evaluation order and tracks the set of bound slots.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use verdict_core::{Expr, SlotId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LintError {
    #[error("branch `{branch}` reads {slot} (key `{key}`) before probing it")]
    UnboundSlot {
        branch: String,
        slot: SlotId,
        key: String,
    },
}

struct Walk<'a> {
    branch: &'a str,
    keys: HashMap<SlotId, String>,
}

impl Walk<'_> {
    fn visit(&self, expr: &Expr, bound: &mut BTreeSet<SlotId>) -> Result<(), LintError> {
        match expr {
            Expr::SlotValue { slot, .. } | Expr::SlotHasValue { slot } => {
                if bound.contains(slot) {
                    Ok(())
                } else {
                    Err(self.unbound(*slot))
                }
            }
            Expr::Probe { slot, .. } => {
                for child in expr.children() {
                    self.visit(child, bound)?;
                }
                bound.insert(*slot);
                Ok(())
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                self.visit(cond, bound)?;
                let mut then_bound = bound.clone();
                self.visit(then, &mut then_bound)?;
                if let Some(otherwise) = otherwise {
                    let mut else_bound = bound.clone();
                    self.visit(otherwise, &mut else_bound)?;
                    *bound = then_bound.intersection(&else_bound).copied().collect();
                }
                Ok(())
            }
            Expr::Cond(arms) => {
                // Guards run one after another until one holds; a body
                // sees every guard up to and including its own.
                let mut guards = bound.clone();
                let mut merged: Option<BTreeSet<SlotId>> = None;
                for arm in arms {
                    self.visit(&arm.guard, &mut guards)?;
                    let mut body = guards.clone();
                    self.visit(&arm.body, &mut body)?;
                    merged = Some(match merged {
                        Some(acc) => acc.intersection(&body).copied().collect(),
                        None => body,
                    });
                }
                if let Some(merged) = merged {
                    *bound = merged;
                }
                Ok(())
            }
            _ => {
                for child in expr.children() {
                    self.visit(child, bound)?;
                }
                Ok(())
            }
        }
    }

    fn unbound(&self, slot: SlotId) -> LintError {
        LintError::UnboundSlot {
            branch: self.branch.to_string(),
            slot,
            key: self
                .keys
                .get(&slot)
                .cloned()
                .unwrap_or_else(|| "<unprobed>".to_string()),
        }
    }
}

fn collect_probe_keys(expr: &Expr, keys: &mut HashMap<SlotId, String>) {
    if let Expr::Probe { slot, source } = expr {
        keys.entry(*slot).or_insert_with(|| source.key().to_string());
    }
    for child in expr.children() {
        collect_probe_keys(child, keys);
    }
}

/// Lint one branch: its guard runs first, then its body.
pub fn lint_branch(branch: &str, guard: &Expr, body: &Expr) -> Result<(), LintError> {
    let mut keys = HashMap::new();
    collect_probe_keys(guard, &mut keys);
    collect_probe_keys(body, &mut keys);
    let walk = Walk { branch, keys };
    let mut bound = BTreeSet::new();
    walk.visit(guard, &mut bound)?;
    walk.visit(body, &mut bound)
}

/// Lint a standalone tree.
pub fn lint(branch: &str, expr: &Expr) -> Result<(), LintError> {
    lint_branch(branch, &Expr::Int(1), expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::storage::{self, probe, slot_has_value, slot_value};
    use verdict_core::typed::{int, select, when, Seq, Typed};
    use verdict_core::{IntExpr, ProbeSource};

    fn probe_of(slot: u16, key: &str) -> verdict_core::UnitExpr {
        probe(SlotId(slot), ProbeSource::global(None, key))
    }

    #[test]
    fn test_read_after_probe_passes() {
        let body = Seq::new()
            .then(probe_of(0, "nominee"))
            .finish(slot_has_value(SlotId(0)));
        assert_eq!(lint("nominate", body.as_expr()), Ok(()));
    }

    #[test]
    fn test_read_before_probe_is_reported_with_key() {
        let read: IntExpr = slot_value(SlotId(0));
        let body = Seq::new().then(probe_of(0, "last_ts")).finish(int(1));
        let err = lint_branch("vote_for", read.as_expr(), body.as_expr()).unwrap_err();
        assert_eq!(
            err,
            LintError::UnboundSlot {
                branch: "vote_for".into(),
                slot: SlotId(0),
                key: "last_ts".into(),
            }
        );
    }

    #[test]
    fn test_probe_in_guard_binds_for_body() {
        let guard = Seq::new().then(probe_of(3, "k")).finish(int(1));
        let body: IntExpr = slot_value(SlotId(3));
        assert_eq!(lint_branch("b", guard.as_expr(), body.as_expr()), Ok(()));
    }

    #[test]
    fn test_conditional_probe_does_not_bind_afterwards() {
        let body = Seq::new()
            .then(when(storage::global_get("flag"), probe_of(1, "k")))
            .finish(slot_has_value(SlotId(1)));
        let err = lint("b", body.as_expr()).unwrap_err();
        assert!(matches!(err, LintError::UnboundSlot { slot: SlotId(1), .. }));
    }

    #[test]
    fn test_probe_on_both_branches_binds() {
        let probed = Seq::new().then(probe_of(2, "k")).finish(int(0));
        let body = Seq::new()
            .then(when(int(1), probe_of(9, "other")))
            .finish(select(int(1), probed.clone(), probed) + slot_has_value(SlotId(2)));
        assert_eq!(lint("b", body.as_expr()), Ok(()));
    }

    #[test]
    fn test_unprobed_slot_gets_placeholder_key() {
        let read = slot_has_value(SlotId(7));
        let err = lint("b", read.as_expr()).unwrap_err();
        assert!(matches!(err, LintError::UnboundSlot { key, .. } if key == "<unprobed>"));
    }
}
