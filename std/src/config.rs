//! Policy parameters, loadable from TOML.
//!
//! ```toml
//! voting_duration = 30
//! term_duration = 60
//! nomination_cooldown = 120
//! ```

use crate::error::PolicyConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use verdict_core::Address;

/// Treasury governance windows, in seconds. Omitted fields take their
/// [`Default`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct TreasuryConfig {
    /// How long after a nomination votes are accepted.
    pub voting_duration: u64,
    /// How long after the voting window the nominee may spend.
    pub term_duration: u64,
    /// Minimum gap between two nominations by the same account.
    pub nomination_cooldown: u64,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            voting_duration: 7 * 24 * 3600,
            term_duration: 30 * 24 * 3600,
            nomination_cooldown: 30 * 24 * 3600,
        }
    }
}

impl TreasuryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, PolicyConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        if self.voting_duration == 0 {
            return Err(PolicyConfigError::Zero {
                field: "voting_duration",
            });
        }
        if self.term_duration == 0 {
            return Err(PolicyConfigError::Zero {
                field: "term_duration",
            });
        }
        self.term_end()?;
        Ok(())
    }

    /// Seconds from nomination to the end of the term.
    pub fn term_end(&self) -> Result<u64, PolicyConfigError> {
        self.voting_duration
            .checked_add(self.term_duration)
            .ok_or(PolicyConfigError::WindowOverflow)
    }

    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(TreasuryConfig))
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Recurring payment terms as written in a policy file. Addresses and the
/// lease are hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PeriodicPaymentConfig {
    pub max_fee: u64,
    pub start_round: u64,
    pub end_round: u64,
    pub period: u64,
    pub amount: u64,
    pub receiver: String,
    pub lease: String,
}

impl PeriodicPaymentConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, PolicyConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub(crate) fn receiver(&self) -> Result<Address, PolicyConfigError> {
        Address::from_hex(&self.receiver).ok_or(PolicyConfigError::Hex {
            field: "receiver",
            len: Address::LEN,
        })
    }

    pub(crate) fn lease(&self) -> Result<[u8; 32], PolicyConfigError> {
        let mut lease = [0u8; 32];
        hex::decode_to_slice(&self.lease, &mut lease).map_err(|_| PolicyConfigError::Hex {
            field: "lease",
            len: 32,
        })?;
        Ok(lease)
    }

    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(PeriodicPaymentConfig))
            .unwrap_or(serde_json::Value::Null)
    }
}
