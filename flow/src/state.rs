//! State Accessor - Typed Key/Value Scopes
//!
//! A scope (global, or local to one account) is declared once through a
//! [`StateBuilder`] and then handed out as typed key handles:
//!
//! - [`EagerKey`]: has a default, written on creation, always readable.
//! - [`OptionalKey`]: may be absent. Its single probe must run earlier in
//!   the same body before `get` or `has_value` mean anything.
//! - [`ForeignKey`]: a key of another application; read-only and always
//!   optional.
//!
//! # Example
//! ```rust
//! use verdict_core::prelude::*;
//! use verdict_flow::state::{IntKey, KeyHandle, StateBuilder};
//! use verdict_flow::SlotArena;
//!
//! let mut arena = SlotArena::new();
//! let global = StateBuilder::global()
//!     .eager_int("count", 0)
//!     .optional_bytes("owner")
//!     .build(&mut arena)?;
//!
//! let count = global.eager_int("count")?;
//! let owner = global.optional_bytes("owner")?;
//! let body = Seq::new()
//!     .then(global.load_all_optional())
//!     .then(when(owner.has_value(), count.inc(1u64)))
//!     .finish(int(1));
//! assert_eq!(global.schema(), StateSchema::new(1, 1));
//! # let _ = body;
//! # Ok::<(), verdict_flow::ConfigError>(())
//! ```

use crate::error::ConfigError;
use crate::slot::SlotArena;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use verdict_core::storage;
use verdict_core::typed::{txn, Seq};
use verdict_core::{
    BytesExpr, IntExpr, ProbeSource, SlotId, StateSchema, Stored, UnitExpr, Value, ValueKind,
};

/// Longest key name the engine accepts.
pub const MAX_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Eager { default: Value },
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDescriptor {
    pub name: String,
    pub kind: ValueKind,
    pub presence: Presence,
}

impl KeyDescriptor {
    pub fn eager(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            kind: default.kind(),
            presence: Presence::Eager { default },
        }
    }

    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            presence: Presence::Optional,
        }
    }

    pub fn is_eager(&self) -> bool {
        matches!(self.presence, Presence::Eager { .. })
    }
}

/// Which store a set of keys lives in.
#[derive(Debug, Clone)]
pub enum Scope {
    Global,
    Local { account: BytesExpr },
    ForeignGlobal { app: IntExpr },
    ForeignLocal { account: BytesExpr, app: IntExpr },
}

impl Scope {
    /// Local state of the transaction sender.
    pub fn local() -> Self {
        Scope::Local {
            account: txn().sender(),
        }
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, Scope::ForeignGlobal { .. } | Scope::ForeignLocal { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Local { .. } => "local",
            Scope::ForeignGlobal { .. } => "foreign-global",
            Scope::ForeignLocal { .. } => "foreign-local",
        }
    }
}

/// Writable scope of the running application.
#[derive(Debug, Clone)]
enum Home {
    Global,
    Local(BytesExpr),
}

impl Home {
    fn read<T: Stored>(&self, name: &str) -> T {
        match self {
            Home::Global => storage::global_get(name),
            Home::Local(account) => storage::local_get(account.clone(), name),
        }
    }

    fn write<T: Stored>(&self, name: &str, value: T) -> UnitExpr {
        match self {
            Home::Global => storage::global_put(name, value),
            Home::Local(account) => storage::local_put(account.clone(), name, value),
        }
    }

    fn probe_source(&self, name: &str) -> ProbeSource {
        match self {
            Home::Global => ProbeSource::global(None, name),
            Home::Local(account) => ProbeSource::local(account.clone(), None, name),
        }
    }
}

/// Cached probe and slot reads of one optional key.
struct Probed<T> {
    name: String,
    slot: SlotId,
    probe: UnitExpr,
    value: T,
    has_value: IntExpr,
}

impl<T: Stored> Probed<T> {
    fn new(name: &str, slot: SlotId, source: ProbeSource) -> Self {
        Self {
            name: name.to_string(),
            slot,
            probe: storage::probe(slot, source),
            value: storage::slot_value(slot),
            has_value: storage::slot_has_value(slot),
        }
    }
}

/// Read/write access to one key of the running application.
pub trait KeyHandle<T: Stored> {
    fn name(&self) -> &str;

    /// Current value. For optional keys this reads the probe's slot, so the
    /// probe must already have run in the same body.
    fn get(&self) -> T;

    fn set(&self, value: T) -> UnitExpr;
}

/// Counter operations for integer keys.
pub trait IntKey: KeyHandle<IntExpr> {
    fn inc(&self, by: impl Into<IntExpr>) -> UnitExpr {
        self.set(self.get() + by.into())
    }

    fn dec(&self, by: impl Into<IntExpr>) -> UnitExpr {
        self.set(self.get() - by.into())
    }
}

impl<K: KeyHandle<IntExpr>> IntKey for K {}

struct EagerInner<T: Stored> {
    name: String,
    home: Home,
    read: T,
    default: T::Literal,
}

/// Key with a default value, present from creation onwards.
pub struct EagerKey<T: Stored>(Arc<EagerInner<T>>);

impl<T: Stored> EagerKey<T> {
    fn new(name: &str, home: Home, default: T::Literal) -> Self {
        let read = home.read(name);
        EagerKey(Arc::new(EagerInner {
            name: name.to_string(),
            home,
            read,
            default,
        }))
    }

    pub fn default_value(&self) -> T::Literal {
        self.0.default.clone()
    }

    /// Write the default.
    pub fn create(&self) -> UnitExpr {
        self.set(T::literal(self.0.default.clone()))
    }
}

impl<T: Stored> KeyHandle<T> for EagerKey<T> {
    fn name(&self) -> &str {
        &self.0.name
    }

    fn get(&self) -> T {
        self.0.read.clone()
    }

    fn set(&self, value: T) -> UnitExpr {
        self.0.home.write(&self.0.name, value)
    }
}

impl<T: Stored> Clone for EagerKey<T> {
    fn clone(&self) -> Self {
        EagerKey(Arc::clone(&self.0))
    }
}

impl<T: Stored> fmt::Debug for EagerKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerKey").field("name", &self.0.name).finish()
    }
}

struct OptionalInner<T> {
    home: Home,
    probed: Probed<T>,
}

/// Key that may be absent from storage.
pub struct OptionalKey<T: Stored>(Arc<OptionalInner<T>>);

impl<T: Stored> OptionalKey<T> {
    fn new(name: &str, home: Home, slot: SlotId) -> Self {
        let probed = Probed::new(name, slot, home.probe_source(name));
        OptionalKey(Arc::new(OptionalInner { home, probed }))
    }

    /// The key's single probe. Evaluating it binds the key's slot.
    pub fn probe(&self) -> UnitExpr {
        self.0.probed.probe.clone()
    }

    /// Whether the key existed when probed.
    pub fn has_value(&self) -> IntExpr {
        self.0.probed.has_value.clone()
    }

    pub fn slot(&self) -> SlotId {
        self.0.probed.slot
    }
}

impl<T: Stored> KeyHandle<T> for OptionalKey<T> {
    fn name(&self) -> &str {
        &self.0.probed.name
    }

    /// Reads the slot, not storage: a write earlier in the same body is
    /// not visible here.
    fn get(&self) -> T {
        self.0.probed.value.clone()
    }

    fn set(&self, value: T) -> UnitExpr {
        self.0.home.write(&self.0.probed.name, value)
    }
}

impl<T: Stored> Clone for OptionalKey<T> {
    fn clone(&self) -> Self {
        OptionalKey(Arc::clone(&self.0))
    }
}

impl<T: Stored> fmt::Debug for OptionalKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalKey")
            .field("name", &self.0.probed.name)
            .field("slot", &self.0.probed.slot)
            .finish()
    }
}

/// Read-only key of another application.
pub struct ForeignKey<T: Stored>(Arc<Probed<T>>);

impl<T: Stored> ForeignKey<T> {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn probe(&self) -> UnitExpr {
        self.0.probe.clone()
    }

    pub fn has_value(&self) -> IntExpr {
        self.0.has_value.clone()
    }

    pub fn get(&self) -> T {
        self.0.value.clone()
    }

    pub fn slot(&self) -> SlotId {
        self.0.slot
    }
}

impl<T: Stored> Clone for ForeignKey<T> {
    fn clone(&self) -> Self {
        ForeignKey(Arc::clone(&self.0))
    }
}

#[derive(Clone)]
enum Entry {
    EagerInt(EagerKey<IntExpr>),
    EagerBytes(EagerKey<BytesExpr>),
    OptionalInt(OptionalKey<IntExpr>),
    OptionalBytes(OptionalKey<BytesExpr>),
}

impl Entry {
    fn label(&self) -> &'static str {
        match self {
            Entry::EagerInt(_) => "eager int",
            Entry::EagerBytes(_) => "eager bytes",
            Entry::OptionalInt(_) => "optional int",
            Entry::OptionalBytes(_) => "optional bytes",
        }
    }

    fn create(&self) -> Option<UnitExpr> {
        match self {
            Entry::EagerInt(key) => Some(key.create()),
            Entry::EagerBytes(key) => Some(key.create()),
            Entry::OptionalInt(_) | Entry::OptionalBytes(_) => None,
        }
    }

    fn probe(&self) -> Option<UnitExpr> {
        match self {
            Entry::OptionalInt(key) => Some(key.probe()),
            Entry::OptionalBytes(key) => Some(key.probe()),
            Entry::EagerInt(_) | Entry::EagerBytes(_) => None,
        }
    }
}

/// Declares the keys of one scope.
#[derive(Debug, Clone)]
pub struct StateBuilder {
    scope: Scope,
    keys: Vec<KeyDescriptor>,
}

impl StateBuilder {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            keys: Vec::new(),
        }
    }

    pub fn global() -> Self {
        Self::new(Scope::Global)
    }

    /// Local state of the transaction sender.
    pub fn local() -> Self {
        Self::new(Scope::local())
    }

    pub fn key(mut self, key: KeyDescriptor) -> Self {
        self.keys.push(key);
        self
    }

    pub fn eager_int(self, name: &str, default: u64) -> Self {
        self.key(KeyDescriptor::eager(name, default))
    }

    pub fn eager_bytes(self, name: &str, default: impl Into<Vec<u8>>) -> Self {
        self.key(KeyDescriptor::eager(name, default.into()))
    }

    pub fn optional_int(self, name: &str) -> Self {
        self.key(KeyDescriptor::optional(name, ValueKind::Int))
    }

    pub fn optional_bytes(self, name: &str) -> Self {
        self.key(KeyDescriptor::optional(name, ValueKind::Bytes))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for key in &self.keys {
            if key.name.len() > MAX_KEY_LEN {
                return Err(ConfigError::KeyTooLong {
                    name: key.name.clone(),
                    len: key.name.len(),
                    max: MAX_KEY_LEN,
                });
            }
            if !seen.insert(key.name.as_str()) {
                return Err(ConfigError::DuplicateKey(key.name.clone()));
            }
            if key.kind == ValueKind::None {
                return Err(ConfigError::UnitKey(key.name.clone()));
            }
            if let Presence::Eager { default } = &key.presence {
                if self.scope.is_foreign() {
                    return Err(ConfigError::ForeignDefault(key.name.clone()));
                }
                if default.kind() != key.kind {
                    return Err(ConfigError::DefaultKind {
                        name: key.name.clone(),
                        expected: key.kind,
                        found: default.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build a writable accessor for the running application.
    pub fn build(self, arena: &mut SlotArena) -> Result<StateAccessor, ConfigError> {
        self.validate()?;
        let label = self.scope.label();
        let StateBuilder { scope, keys } = self;
        let home = match scope {
            Scope::Global => Home::Global,
            Scope::Local { account } => Home::Local(account),
            Scope::ForeignGlobal { .. } | Scope::ForeignLocal { .. } => {
                return Err(ConfigError::ForeignScope);
            }
        };

        let mut entries = Vec::with_capacity(keys.len());
        for key in &keys {
            let entry = match (&key.presence, key.kind) {
                (Presence::Eager { default: Value::Int(d) }, _) => {
                    Entry::EagerInt(EagerKey::new(&key.name, home.clone(), *d))
                }
                (Presence::Eager { default: Value::Bytes(b) }, _) => {
                    Entry::EagerBytes(EagerKey::new(&key.name, home.clone(), b.clone()))
                }
                (Presence::Optional, ValueKind::Int) => {
                    let slot = arena.allocate(format!("{label}.{}", key.name))?;
                    Entry::OptionalInt(OptionalKey::new(&key.name, home.clone(), slot))
                }
                (Presence::Optional, ValueKind::Bytes) => {
                    let slot = arena.allocate(format!("{label}.{}", key.name))?;
                    Entry::OptionalBytes(OptionalKey::new(&key.name, home.clone(), slot))
                }
                (Presence::Optional, ValueKind::None) => {
                    return Err(ConfigError::UnitKey(key.name.clone()));
                }
            };
            entries.push(entry);
        }

        tracing::debug!(
            scope = label,
            keys = entries.len(),
            slots = arena.len(),
            "state accessor built"
        );
        Ok(StateAccessor {
            label,
            keys,
            entries,
        })
    }

    /// Build a read-only accessor for another application's state.
    pub fn build_foreign(self, arena: &mut SlotArena) -> Result<ForeignState, ConfigError> {
        self.validate()?;
        let label = self.scope.label();
        let StateBuilder { scope, keys } = self;
        let (account, app) = match scope {
            Scope::ForeignGlobal { app } => (None, app),
            Scope::ForeignLocal { account, app } => (Some(account), app),
            Scope::Global | Scope::Local { .. } => return Err(ConfigError::HomeScope),
        };

        let mut entries = Vec::with_capacity(keys.len());
        for key in &keys {
            let slot = arena.allocate(format!("{label}.{}", key.name))?;
            let source = match &account {
                Some(account) => ProbeSource::local(account.clone(), Some(app.clone()), &key.name),
                None => ProbeSource::global(Some(app.clone()), &key.name),
            };
            let entry = match key.kind {
                ValueKind::Int => ForeignEntry::Int(ForeignKey(Arc::new(Probed::new(
                    &key.name, slot, source,
                )))),
                ValueKind::Bytes => ForeignEntry::Bytes(ForeignKey(Arc::new(Probed::new(
                    &key.name, slot, source,
                )))),
                ValueKind::None => return Err(ConfigError::UnitKey(key.name.clone())),
            };
            entries.push(entry);
        }

        tracing::debug!(scope = label, keys = entries.len(), "foreign accessor built");
        Ok(ForeignState { keys, entries })
    }
}

/// Registry of one writable scope's keys.
#[derive(Clone)]
pub struct StateAccessor {
    label: &'static str,
    keys: Vec<KeyDescriptor>,
    entries: Vec<Entry>,
}

impl StateAccessor {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn descriptors(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    /// Storage capacity needed by the declared keys, eager or optional.
    pub fn schema(&self) -> StateSchema {
        let uints = self.keys.iter().filter(|k| k.kind == ValueKind::Int).count();
        let byte_slices = self.keys.iter().filter(|k| k.kind == ValueKind::Bytes).count();
        StateSchema::new(uints as u64, byte_slices as u64)
    }

    /// Write every eager key's default. Optional keys are left absent.
    pub fn create(&self) -> UnitExpr {
        Seq::new()
            .then_all(self.entries.iter().filter_map(Entry::create))
            .unit()
    }

    /// Run every optional key's probe, in declaration order.
    pub fn load_all_optional(&self) -> UnitExpr {
        Seq::new()
            .then_all(self.entries.iter().filter_map(Entry::probe))
            .unit()
    }

    fn entry(&self, name: &str) -> Result<&Entry, ConfigError> {
        self.keys
            .iter()
            .position(|k| k.name == name)
            .map(|i| &self.entries[i])
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    fn mismatch(name: &str, requested: &'static str, entry: &Entry) -> ConfigError {
        ConfigError::KeyMismatch {
            name: name.to_string(),
            requested,
            actual: entry.label(),
        }
    }

    pub fn eager_int(&self, name: &str) -> Result<EagerKey<IntExpr>, ConfigError> {
        match self.entry(name)? {
            Entry::EagerInt(key) => Ok(key.clone()),
            other => Err(Self::mismatch(name, "eager int", other)),
        }
    }

    pub fn eager_bytes(&self, name: &str) -> Result<EagerKey<BytesExpr>, ConfigError> {
        match self.entry(name)? {
            Entry::EagerBytes(key) => Ok(key.clone()),
            other => Err(Self::mismatch(name, "eager bytes", other)),
        }
    }

    pub fn optional_int(&self, name: &str) -> Result<OptionalKey<IntExpr>, ConfigError> {
        match self.entry(name)? {
            Entry::OptionalInt(key) => Ok(key.clone()),
            other => Err(Self::mismatch(name, "optional int", other)),
        }
    }

    pub fn optional_bytes(&self, name: &str) -> Result<OptionalKey<BytesExpr>, ConfigError> {
        match self.entry(name)? {
            Entry::OptionalBytes(key) => Ok(key.clone()),
            other => Err(Self::mismatch(name, "optional bytes", other)),
        }
    }
}

impl fmt::Debug for StateAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateAccessor")
            .field("scope", &self.label)
            .field("keys", &self.keys)
            .finish()
    }
}

#[derive(Clone)]
enum ForeignEntry {
    Int(ForeignKey<IntExpr>),
    Bytes(ForeignKey<BytesExpr>),
}

/// Registry of another application's keys.
#[derive(Clone)]
pub struct ForeignState {
    keys: Vec<KeyDescriptor>,
    entries: Vec<ForeignEntry>,
}

impl ForeignState {
    pub fn descriptors(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    pub fn load_all_optional(&self) -> UnitExpr {
        Seq::new()
            .then_all(self.entries.iter().map(|e| match e {
                ForeignEntry::Int(key) => key.probe(),
                ForeignEntry::Bytes(key) => key.probe(),
            }))
            .unit()
    }

    fn entry(&self, name: &str) -> Result<&ForeignEntry, ConfigError> {
        self.keys
            .iter()
            .position(|k| k.name == name)
            .map(|i| &self.entries[i])
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    pub fn int(&self, name: &str) -> Result<ForeignKey<IntExpr>, ConfigError> {
        match self.entry(name)? {
            ForeignEntry::Int(key) => Ok(key.clone()),
            ForeignEntry::Bytes(_) => Err(ConfigError::KeyMismatch {
                name: name.to_string(),
                requested: "optional int",
                actual: "optional bytes",
            }),
        }
    }

    pub fn bytes(&self, name: &str) -> Result<ForeignKey<BytesExpr>, ConfigError> {
        match self.entry(name)? {
            ForeignEntry::Bytes(key) => Ok(key.clone()),
            ForeignEntry::Int(_) => Err(ConfigError::KeyMismatch {
                name: name.to_string(),
                requested: "optional bytes",
                actual: "optional int",
            }),
        }
    }
}

impl fmt::Debug for ForeignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignState")
            .field("keys", &self.keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::typed::{int, Typed};
    use verdict_core::Expr;

    fn treasury_like(arena: &mut SlotArena) -> StateAccessor {
        StateBuilder::global()
            .eager_int("funds_current", 0)
            .optional_bytes("nominee")
            .eager_int("votes_for", 0)
            .optional_int("last_nomination_ts")
            .build(arena)
            .unwrap()
    }

    #[test]
    fn test_schema_counts_kinds_regardless_of_presence_and_order() {
        let mut arena = SlotArena::new();
        let a = treasury_like(&mut arena);
        let b = StateBuilder::global()
            .optional_int("last_nomination_ts")
            .eager_int("votes_for", 0)
            .optional_bytes("nominee")
            .eager_int("funds_current", 0)
            .build(&mut arena)
            .unwrap();
        assert_eq!(a.schema(), StateSchema::new(3, 1));
        assert_eq!(a.schema(), b.schema());
    }

    #[test]
    fn test_create_writes_only_eager_keys() {
        let mut arena = SlotArena::new();
        let state = treasury_like(&mut arena);
        let Expr::Seq(steps) = state.create().into_expr() else {
            panic!("create must be a sequence");
        };
        assert_eq!(steps.len(), 2);
        assert!(steps.iter().all(|s| matches!(s, Expr::GlobalPut { .. })));
    }

    #[test]
    fn test_load_all_optional_probes_each_key_once() {
        let mut arena = SlotArena::new();
        let state = treasury_like(&mut arena);
        let Expr::Seq(steps) = state.load_all_optional().into_expr() else {
            panic!("load must be a sequence");
        };
        let slots: Vec<SlotId> = steps
            .iter()
            .map(|s| match s {
                Expr::Probe { slot, .. } => *slot,
                other => panic!("unexpected step {other:?}"),
            })
            .collect();
        assert_eq!(slots, vec![SlotId(0), SlotId(1)]);
        let nominee = state.optional_bytes("nominee").unwrap();
        assert_eq!(nominee.probe(), nominee.probe());
        assert_eq!(nominee.slot(), SlotId(0));
    }

    #[test]
    fn test_slots_do_not_collide_across_scopes() {
        let mut arena = SlotArena::new();
        let global = treasury_like(&mut arena);
        let local = StateBuilder::local()
            .optional_int("last_vote_ts")
            .build(&mut arena)
            .unwrap();
        let g = global.optional_int("last_nomination_ts").unwrap();
        let l = local.optional_int("last_vote_ts").unwrap();
        assert_ne!(g.slot(), l.slot());
        assert_eq!(arena.label(l.slot()), Some("local.last_vote_ts"));
    }

    #[test]
    fn test_inc_is_set_of_get_plus_value() {
        let mut arena = SlotArena::new();
        let state = treasury_like(&mut arena);
        let votes = state.eager_int("votes_for").unwrap();
        assert_eq!(votes.inc(5u64), votes.set(votes.get() + int(5)));
        assert_eq!(votes.dec(int(2)), votes.set(votes.get() - int(2)));
    }

    #[test]
    fn test_local_scope_reads_sender_state() {
        let mut arena = SlotArena::new();
        let local = StateBuilder::local().eager_int("count", 0).build(&mut arena).unwrap();
        let count = local.eager_int("count").unwrap();
        assert_eq!(
            count.get().into_expr(),
            Expr::LocalGet {
                account: Box::new(txn().sender().into_expr()),
                key: "count".into(),
                kind: ValueKind::Int,
            }
        );
    }

    #[test]
    fn test_key_name_limit() {
        let mut arena = SlotArena::new();
        let ok = "k".repeat(MAX_KEY_LEN);
        assert!(StateBuilder::global().eager_int(&ok, 0).build(&mut arena).is_ok());
        let long = "k".repeat(MAX_KEY_LEN + 1);
        assert_eq!(
            StateBuilder::global().eager_int(&long, 0).build(&mut arena).unwrap_err(),
            ConfigError::KeyTooLong {
                name: long.clone(),
                len: MAX_KEY_LEN + 1,
                max: MAX_KEY_LEN,
            }
        );
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut arena = SlotArena::new();
        let err = StateBuilder::global()
            .eager_int("a", 0)
            .optional_bytes("a")
            .build(&mut arena)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKey("a".into()));
    }

    #[test]
    fn test_foreign_keys_cannot_carry_defaults() {
        let mut arena = SlotArena::new();
        let err = StateBuilder::new(Scope::ForeignGlobal { app: int(12) })
            .eager_int("price", 5)
            .build_foreign(&mut arena)
            .unwrap_err();
        assert_eq!(err, ConfigError::ForeignDefault("price".into()));
    }

    #[test]
    fn test_foreign_scope_is_read_only() {
        let mut arena = SlotArena::new();
        let err = StateBuilder::new(Scope::ForeignGlobal { app: int(12) })
            .optional_int("price")
            .build(&mut arena)
            .unwrap_err();
        assert_eq!(err, ConfigError::ForeignScope);

        let foreign = StateBuilder::new(Scope::ForeignGlobal { app: int(12) })
            .optional_int("price")
            .build_foreign(&mut arena)
            .unwrap();
        let price = foreign.int("price").unwrap();
        assert!(matches!(
            price.probe().into_expr(),
            Expr::Probe {
                source: ProbeSource::Global { app: Some(_), .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_and_mismatched_lookups() {
        let mut arena = SlotArena::new();
        let state = treasury_like(&mut arena);
        assert_eq!(
            state.eager_int("missing").unwrap_err(),
            ConfigError::UnknownKey("missing".into())
        );
        assert_eq!(
            state.eager_int("nominee").unwrap_err(),
            ConfigError::KeyMismatch {
                name: "nominee".into(),
                requested: "eager int",
                actual: "optional bytes",
            }
        );
    }
}
