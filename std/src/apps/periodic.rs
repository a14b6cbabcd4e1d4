//! Stateless program for an escrow that pays a fixed amount to a fixed
//! receiver once per period, then lets the receiver close it out.

use crate::config::PeriodicPaymentConfig;
use crate::error::PolicyConfigError;
use verdict_core::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicPayment {
    /// Highest fee a payment may carry.
    pub max_fee: u64,
    pub start_round: u64,
    /// First round at which only the close-out is accepted.
    pub end_round: u64,
    /// Rounds between two payments.
    pub period: u64,
    pub amount: u64,
    pub receiver: Address,
    /// Lease every payment must carry, making payments of one period
    /// mutually exclusive.
    pub lease: [u8; 32],
}

impl TryFrom<PeriodicPaymentConfig> for PeriodicPayment {
    type Error = PolicyConfigError;

    fn try_from(config: PeriodicPaymentConfig) -> Result<Self, Self::Error> {
        let payment = Self {
            max_fee: config.max_fee,
            start_round: config.start_round,
            end_round: config.end_round,
            period: config.period,
            amount: config.amount,
            receiver: config.receiver()?,
            lease: config.lease()?,
        };
        payment.validate()?;
        Ok(payment)
    }
}

impl PeriodicPayment {
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        if self.period == 0 {
            return Err(PolicyConfigError::Zero { field: "period" });
        }
        if self.start_round > self.end_round {
            return Err(PolicyConfigError::RoundRange {
                start: self.start_round,
                end: self.end_round,
            });
        }
        Ok(())
    }

    pub fn program(&self) -> Result<IntExpr, PolicyConfigError> {
        self.validate()?;
        let tx = txn();

        let core = all([
            tx.type_enum().equals(TxnType::Payment.code()),
            tx.fee().le(self.max_fee),
            tx.first_valid().ge(self.start_round),
            ((tx.first_valid() - self.start_round) % self.period).equals(0u64),
            tx.lease().equals(bytes(self.lease.to_vec())),
        ]);

        // The lease locks the escrow until the next period starts.
        let payment = all([
            tx.first_valid().lt(self.end_round),
            tx.last_valid()
                .equals(tx.first_valid() + self.period - 1u64),
            tx.close_remainder_to().equals(Global::zero_address()),
            tx.rekey_to().equals(Global::zero_address()),
            tx.receiver().equals(addr(self.receiver)),
            tx.amount().equals(self.amount),
        ]);

        let close = all([
            tx.first_valid().equals(self.end_round),
            tx.close_remainder_to().equals(addr(self.receiver)),
            tx.rekey_to().equals(Global::zero_address()),
            tx.receiver().equals(Global::zero_address()),
            tx.amount().equals(0u64),
        ]);

        tracing::debug!(
            receiver = %self.receiver,
            period = self.period,
            rounds = self.end_round - self.start_round,
            "periodic payment program built"
        );
        Ok(core.and(payment.or(close)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> PeriodicPayment {
        PeriodicPayment {
            max_fee: 2_000,
            start_round: 100,
            end_round: 200,
            period: 10,
            amount: 50,
            receiver: Address::from_index(5),
            lease: [7; 32],
        }
    }

    #[test]
    fn test_program_is_integer() {
        let program = terms().program().unwrap();
        assert_eq!(program.as_expr().check().unwrap(), ValueKind::Int);
    }

    #[test]
    fn test_bad_terms_are_rejected() {
        let zero = PeriodicPayment {
            period: 0,
            ..terms()
        };
        assert!(matches!(
            zero.program(),
            Err(PolicyConfigError::Zero { field: "period" })
        ));

        let reversed = PeriodicPayment {
            start_round: 300,
            ..terms()
        };
        assert!(matches!(
            reversed.validate(),
            Err(PolicyConfigError::RoundRange {
                start: 300,
                end: 200
            })
        ));
    }

    #[test]
    fn test_from_toml() {
        let source = format!(
            "max_fee = 2000\nstart_round = 100\nend_round = 200\nperiod = 10\namount = 50\n\
             receiver = \"{}\"\nlease = \"{}\"\n",
            Address::from_index(5).to_hex(),
            "07".repeat(32),
        );
        let config = PeriodicPaymentConfig::from_toml_str(&source).unwrap();
        assert_eq!(PeriodicPayment::try_from(config).unwrap(), terms());
    }
}
