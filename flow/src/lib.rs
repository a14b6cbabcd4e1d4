//! # Verdict Flow: state access and branch compilation
//!
//! * [`state`]: typed global/local key handles (eager and optional)
//! * [`slot`]: the probe slot arena shared by a program's accessors
//! * [`branch`]: the decision table and its compiler
//! * [`lint`]: probe-before-read checking
//!
//! Everything here runs once, at program construction time.

pub mod branch;
pub mod error;
pub mod lint;
pub mod slot;
pub mod state;

pub use branch::{action_guard, AppPrograms, Branch, DecisionTable, Lifecycle};
pub use error::{BuildError, ConfigError};
pub use lint::LintError;
pub use slot::SlotArena;
pub use state::{
    EagerKey, ForeignKey, ForeignState, IntKey, KeyDescriptor, KeyHandle, OptionalKey, Presence,
    Scope, StateAccessor, StateBuilder, MAX_KEY_LEN,
};

pub mod prelude {
    pub use crate::branch::{AppPrograms, DecisionTable, Lifecycle};
    pub use crate::error::{BuildError, ConfigError};
    pub use crate::slot::SlotArena;
    pub use crate::state::{
        EagerKey, ForeignKey, IntKey, KeyHandle, OptionalKey, Scope, StateAccessor, StateBuilder,
    };
}
