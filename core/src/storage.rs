//! Typed constructors for storage nodes.
//!
//! These are the raw engine operations. Programs normally go through the
//! state accessor in `verdict-flow`, which adds key bookkeeping on top.

use crate::expr::{Expr, ProbeSource, SlotId};
use crate::typed::{sealed::Sealed, BytesExpr, IntExpr, Stored, UnitExpr};

fn wrap<T: Sealed>(expr: Expr) -> T {
    T::wrap(expr)
}

/// Read a key of the running application's global state. Missing keys
/// read as integer zero.
pub fn global_get<T: Stored>(key: &str) -> T {
    wrap(Expr::GlobalGet {
        key: key.to_string(),
        kind: T::KIND,
    })
}

/// Read a key of `account`'s local state for the running application.
pub fn local_get<T: Stored>(account: BytesExpr, key: &str) -> T {
    wrap(Expr::LocalGet {
        account: Box::new(account.into()),
        key: key.to_string(),
        kind: T::KIND,
    })
}

pub fn global_put<T: Stored>(key: &str, value: T) -> UnitExpr {
    wrap(Expr::GlobalPut {
        key: key.to_string(),
        value: Box::new(value.into()),
    })
}

pub fn local_put<T: Stored>(account: BytesExpr, key: &str, value: T) -> UnitExpr {
    wrap(Expr::LocalPut {
        account: Box::new(account.into()),
        key: key.to_string(),
        value: Box::new(value.into()),
    })
}

/// Look up a possibly-absent key and bind the result to `slot`.
pub fn probe(slot: SlotId, source: ProbeSource) -> UnitExpr {
    wrap(Expr::Probe { slot, source })
}

/// Value bound to `slot` by its probe.
pub fn slot_value<T: Stored>(slot: SlotId) -> T {
    wrap(Expr::SlotValue {
        slot,
        kind: T::KIND,
    })
}

/// Whether the probe bound to `slot` found its key.
pub fn slot_has_value(slot: SlotId) -> IntExpr {
    wrap(Expr::SlotHasValue { slot })
}

/// Whether `account` has opted in to application `app`.
pub fn opted_in(account: BytesExpr, app: IntExpr) -> IntExpr {
    wrap(Expr::OptedIn {
        account: Box::new(account.into()),
        app: Box::new(app.into()),
    })
}

impl ProbeSource {
    pub fn global(app: Option<IntExpr>, key: &str) -> Self {
        ProbeSource::Global {
            app: app.map(|a| Box::new(a.into())),
            key: key.to_string(),
        }
    }

    pub fn local(account: BytesExpr, app: Option<IntExpr>, key: &str) -> Self {
        ProbeSource::Local {
            account: Box::new(account.into()),
            app: app.map(|a| Box::new(a.into())),
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{int, txn, Typed};
    use crate::value::ValueKind;

    #[test]
    fn test_reads_carry_key_kind() {
        let count: IntExpr = global_get("count");
        let name: BytesExpr = local_get(txn().sender(), "name");
        assert_eq!(count.as_expr().check(), Ok(ValueKind::Int));
        assert_eq!(name.as_expr().check(), Ok(ValueKind::Bytes));
    }

    #[test]
    fn test_probe_is_a_statement() {
        let p = probe(SlotId(0), ProbeSource::global(Some(int(9)), "owner"));
        assert_eq!(p.as_expr().check(), Ok(ValueKind::None));
        assert_eq!(slot_has_value(SlotId(0)).as_expr().check(), Ok(ValueKind::Int));
    }
}
