//! # Verdict Std: ready-made applications
//!
//! * [`treasury`]: pooled funds with nomination, voting and term spending
//! * [`counter`]: a shared counter with per-account tallies
//! * [`periodic`]: a stateless recurring-payment escrow program
//! * [`vouch`]: per-account names vouched for by other members
//!
//! Policy parameters live in [`config`] and load from TOML.

pub mod apps;
pub mod config;
pub mod error;
pub mod prelude;

pub use apps::{counter, periodic, treasury, vouch};
pub use config::{PeriodicPaymentConfig, TreasuryConfig};
pub use error::PolicyConfigError;
