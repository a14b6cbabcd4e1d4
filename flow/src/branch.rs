//! Branch Compiler
//!
//! Flattens lifecycle handlers and named actions into one first-match
//! conditional (the approval program) plus an independent clear program.
//!
//! Priority is fixed: create, delete, update, opt-in, close-out, then the
//! named actions in declaration order, then a trailing always-true reject.

use crate::error::{BuildError, ConfigError};
use crate::lint::{lint, lint_branch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use verdict_core::schematic::{Node, NodeKind};
use verdict_core::storage::opted_in;
use verdict_core::typed::{bytes, int, select, txn, Cond, Global};
use verdict_core::{
    Expr, IntExpr, OnCompletion, Schematic, StateSchema, Typed, ValueKind,
};

/// Invocation kinds recognised from transaction metadata alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Create,
    Delete,
    Update,
    OptIn,
    CloseOut,
}

impl Lifecycle {
    /// Priority order of lifecycle branches.
    pub const ORDER: [Lifecycle; 5] = [
        Lifecycle::Create,
        Lifecycle::Delete,
        Lifecycle::Update,
        Lifecycle::OptIn,
        Lifecycle::CloseOut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Create => "create",
            Lifecycle::Delete => "delete",
            Lifecycle::Update => "update",
            Lifecycle::OptIn => "opt_in",
            Lifecycle::CloseOut => "close_out",
        }
    }

    /// The fixed guard for this invocation kind.
    pub fn guard(&self) -> IntExpr {
        let on_completion = |oc: OnCompletion| txn().on_completion().equals(oc.code());
        match self {
            Lifecycle::Create => txn().application_id().equals(0u64),
            Lifecycle::Delete => on_completion(OnCompletion::DeleteApplication),
            Lifecycle::Update => on_completion(OnCompletion::UpdateApplication),
            Lifecycle::OptIn => on_completion(OnCompletion::OptIn),
            Lifecycle::CloseOut => on_completion(OnCompletion::CloseOut),
        }
    }

    fn index(&self) -> usize {
        match self {
            Lifecycle::Create => 0,
            Lifecycle::Delete => 1,
            Lifecycle::Update => 2,
            Lifecycle::OptIn => 3,
            Lifecycle::CloseOut => 4,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Guard of a named action: a no-op call whose first argument is `name`.
///
/// The argument is only read when at least one is present, so a call
/// without arguments is a non-match rather than an engine error.
pub fn action_guard(name: &str) -> IntExpr {
    let named = select(
        txn().num_args().gt(0u64),
        txn().arg(0).equals(bytes(name)),
        int(0),
    );
    txn()
        .on_completion()
        .equals(OnCompletion::NoOp.code())
        .and(named)
}

/// One compiled (guard, body) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub label: String,
    pub kind: NodeKind,
    pub guard: IntExpr,
    pub body: IntExpr,
}

/// Declarative description of one application.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    name: String,
    lifecycle: [Option<IntExpr>; 5],
    actions: Vec<(String, IntExpr)>,
    clear: Option<IntExpr>,
    global_schema: StateSchema,
    local_schema: StateSchema,
    require_opt_in: bool,
}

impl DecisionTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifecycle: Default::default(),
            actions: Vec::new(),
            clear: None,
            global_schema: StateSchema::default(),
            local_schema: StateSchema::default(),
            require_opt_in: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on(mut self, lifecycle: Lifecycle, body: IntExpr) -> Self {
        self.lifecycle[lifecycle.index()] = Some(body);
        self
    }

    pub fn on_create(self, body: IntExpr) -> Self {
        self.on(Lifecycle::Create, body)
    }

    pub fn on_delete(self, body: IntExpr) -> Self {
        self.on(Lifecycle::Delete, body)
    }

    pub fn on_update(self, body: IntExpr) -> Self {
        self.on(Lifecycle::Update, body)
    }

    pub fn on_opt_in(self, body: IntExpr) -> Self {
        self.on(Lifecycle::OptIn, body)
    }

    pub fn on_close_out(self, body: IntExpr) -> Self {
        self.on(Lifecycle::CloseOut, body)
    }

    /// Named action, selected by the first application argument.
    pub fn action(mut self, name: impl Into<String>, body: IntExpr) -> Self {
        self.actions.push((name.into(), body));
        self
    }

    pub fn on_clear(mut self, body: IntExpr) -> Self {
        self.clear = Some(body);
        self
    }

    pub fn schemas(mut self, global: StateSchema, local: StateSchema) -> Self {
        self.global_schema = global;
        self.local_schema = local;
        self
    }

    /// Whether named actions also require the sender to be opted in.
    /// Defaults to `true`.
    pub fn require_opt_in(mut self, required: bool) -> Self {
        self.require_opt_in = required;
        self
    }

    /// All approval branches in priority order, fallback included.
    pub fn branches(&self) -> Result<Vec<Branch>, ConfigError> {
        let mut out = Vec::with_capacity(self.actions.len() + 6);
        for lifecycle in Lifecycle::ORDER {
            let body = match (&self.lifecycle[lifecycle.index()], lifecycle) {
                (Some(body), _) => body.clone(),
                (None, Lifecycle::Create) => int(1),
                (None, _) => continue,
            };
            out.push(Branch {
                label: lifecycle.name().to_string(),
                kind: NodeKind::Lifecycle,
                guard: lifecycle.guard(),
                body,
            });
        }

        let mut seen = HashSet::new();
        for (name, body) in &self.actions {
            if name.is_empty() {
                return Err(ConfigError::EmptyActionName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateAction(name.clone()));
            }
            let mut guard = action_guard(name);
            if self.require_opt_in {
                guard = guard.and(opted_in(txn().sender(), Global::current_application_id()));
            }
            out.push(Branch {
                label: name.clone(),
                kind: NodeKind::Action,
                guard,
                body: body.clone(),
            });
        }

        out.push(Branch {
            label: "reject".to_string(),
            kind: NodeKind::Fallback,
            guard: int(1),
            body: int(0),
        });
        Ok(out)
    }

    pub fn compile(&self) -> Result<AppPrograms, BuildError> {
        let span = tracing::info_span!("Compile", verdict.app = %self.name);
        let _enter = span.enter();

        let branches = self.branches()?;
        let mut schematic = Schematic::new(&self.name);
        schematic.push(
            Node {
                id: "approval".to_string(),
                kind: NodeKind::Ingress,
                label: "approval".to_string(),
                body_size: 0,
            },
            None,
        );

        let mut table = Cond::new();
        for (priority, branch) in branches.iter().enumerate() {
            check_branch(branch)?;
            let body_size = branch.body.as_expr().size();
            tracing::debug!(
                branch = %branch.label,
                priority,
                body_size,
                "branch compiled"
            );
            schematic.push(
                Node {
                    id: format!("branch:{}", branch.label),
                    kind: branch.kind,
                    label: branch.label.clone(),
                    body_size,
                },
                Some(if priority == 0 { "Guard" } else { "Else" }),
            );
            table = table.arm(branch.guard.clone(), branch.body.clone());
        }
        let approval = table.build()?;

        let clear = self.clear.clone().unwrap_or_else(|| int(1));
        lint("clear", clear.as_expr())?;
        schematic.nodes.push(Node {
            id: "clear".to_string(),
            kind: NodeKind::Clear,
            label: "clear".to_string(),
            body_size: clear.as_expr().size(),
        });

        tracing::info!(
            app = %self.name,
            branches = branches.len(),
            approval_size = approval.as_expr().size(),
            "program compiled"
        );
        Ok(AppPrograms {
            name: self.name.clone(),
            approval: approval.into_expr(),
            clear: clear.into_expr(),
            global_schema: self.global_schema,
            local_schema: self.local_schema,
            schematic,
        })
    }
}

fn check_branch(branch: &Branch) -> Result<(), BuildError> {
    branch.guard.as_expr().check()?;
    let found = branch.body.as_expr().check()?;
    if found != ValueKind::Int {
        return Err(BuildError::NonIntegerBody {
            branch: branch.label.clone(),
            found,
        });
    }
    lint_branch(&branch.label, branch.guard.as_expr(), branch.body.as_expr())?;
    Ok(())
}

/// The compiled output handed to the lowering tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPrograms {
    pub name: String,
    pub approval: Expr,
    pub clear: Expr,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    pub schematic: Schematic,
}

impl AppPrograms {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Re-check a deserialized pair of programs: both must be
    /// well-kinded integer trees that never read an unprobed slot.
    pub fn validate(&self) -> Result<(), BuildError> {
        for (label, program) in [("approval", &self.approval), ("clear", &self.clear)] {
            let found = program.check()?;
            if found != ValueKind::Int {
                return Err(BuildError::NonIntegerBody {
                    branch: label.to_string(),
                    found,
                });
            }
            lint(label, program)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::LintError;
    use crate::slot::SlotArena;
    use crate::state::{IntKey, KeyHandle, StateBuilder};
    use verdict_core::typed::Seq;
    use verdict_core::SlotId;

    fn labels(table: &DecisionTable) -> Vec<String> {
        table
            .branches()
            .unwrap()
            .into_iter()
            .map(|b| b.label)
            .collect()
    }

    #[test]
    fn test_priority_order_is_fixed() {
        let table = DecisionTable::new("demo")
            .action("b", int(1))
            .on_close_out(int(1))
            .action("a", int(1))
            .on_opt_in(int(1))
            .on_delete(int(0));
        assert_eq!(
            labels(&table),
            vec!["create", "delete", "opt_in", "close_out", "b", "a", "reject"]
        );
    }

    #[test]
    fn test_create_defaults_to_approve_and_fallback_rejects() {
        let branches = DecisionTable::new("empty").branches().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].body, int(1));
        assert_eq!(branches[1].guard, int(1));
        assert_eq!(branches[1].body, int(0));
    }

    #[test]
    fn test_action_guard_requires_opt_in_by_default() {
        let table = DecisionTable::new("demo").action("ping", int(1));
        let guard = &table.branches().unwrap()[1].guard;
        assert_eq!(
            guard,
            &action_guard("ping").and(opted_in(txn().sender(), Global::current_application_id()))
        );
        let open = table.require_opt_in(false);
        assert_eq!(open.branches().unwrap()[1].guard, action_guard("ping"));
    }

    #[test]
    fn test_duplicate_and_empty_actions_are_rejected() {
        let dup = DecisionTable::new("demo").action("x", int(1)).action("x", int(0));
        assert_eq!(dup.compile(), Err(BuildError::Config(ConfigError::DuplicateAction("x".into()))));
        let empty = DecisionTable::new("demo").action("", int(1));
        assert_eq!(empty.compile(), Err(BuildError::Config(ConfigError::EmptyActionName)));
    }

    #[test]
    fn test_compile_reports_unprobed_read() {
        let mut arena = SlotArena::new();
        let state = StateBuilder::global().optional_int("last").build(&mut arena).unwrap();
        let last = state.optional_int("last").unwrap();
        let table = DecisionTable::new("demo").action("peek", last.get().gt(0u64));
        assert_eq!(
            table.compile(),
            Err(BuildError::Lint(LintError::UnboundSlot {
                branch: "peek".into(),
                slot: SlotId(0),
                key: "<unprobed>".into(),
            }))
        );

        let fixed = DecisionTable::new("demo").action(
            "peek",
            Seq::new().then(state.load_all_optional()).finish(last.get().gt(0u64)),
        );
        assert!(fixed.compile().is_ok());
    }

    #[test]
    fn test_compiled_output_and_schematic() {
        let mut arena = SlotArena::new();
        let state = StateBuilder::global().eager_int("count", 0).build(&mut arena).unwrap();
        let count = state.eager_int("count").unwrap();
        let programs = DecisionTable::new("counter")
            .on_create(Seq::new().then(state.create()).finish(int(1)))
            .action("increment", Seq::new().then(count.inc(1u64)).finish(int(1)))
            .schemas(state.schema(), StateSchema::default())
            .compile()
            .unwrap();

        assert!(matches!(&programs.approval, Expr::Cond(arms) if arms.len() == 3));
        assert_eq!(programs.clear, Expr::Int(1));
        assert_eq!(programs.global_schema, StateSchema::new(1, 0));
        assert_eq!(programs.validate(), Ok(()));

        let labels: Vec<_> = programs.schematic.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["approval", "create", "increment", "reject", "clear"]);
        assert_eq!(programs.schematic.edges.len(), 3);
        assert_eq!(programs.to_json()["name"], "counter");
    }

    #[test]
    fn test_validate_rejects_bytes_program() {
        let mut programs = DecisionTable::new("demo").compile().unwrap();
        programs.clear = Expr::Bytes(b"no".to_vec());
        assert!(matches!(
            programs.validate(),
            Err(BuildError::NonIntegerBody { found: ValueKind::Bytes, .. })
        ));
    }
}
