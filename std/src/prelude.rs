pub use crate::apps::counter::counter_app;
pub use crate::apps::periodic::PeriodicPayment;
pub use crate::apps::treasury::{treasury_app, Treasury};
pub use crate::apps::vouch::vouch_app;
pub use crate::config::{PeriodicPaymentConfig, TreasuryConfig};
pub use crate::error::PolicyConfigError;
