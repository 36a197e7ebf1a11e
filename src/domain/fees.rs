use super::money::Amount;
use crate::error::{OddJobsError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Share of the job amount the platform charges the employer.
pub const PLATFORM_FEE_RATE: Decimal = dec!(0.15);

/// Computes platform fees and charge totals.
///
/// Pure and deterministic: identical inputs always yield identical results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    rate: Decimal,
}

/// How a job payment splits between employer charge and worker receipt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub job_amount: Amount,
    pub platform_fee: Amount,
    pub tip: Amount,
    /// `job_amount + platform_fee + tip`
    pub employer_total: Amount,
    /// `job_amount + tip`; tips are not charged a fee.
    pub worker_net: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            rate: PLATFORM_FEE_RATE,
        }
    }
}

impl FeeSchedule {
    pub fn new(rate: Decimal) -> Result<Self> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(OddJobsError::ValidationError(format!(
                "Platform fee rate {rate} must be between 0 and 1"
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// `round(amount * rate)` to whole currency units, halves rounded up.
    pub fn platform_fee(&self, amount: Amount) -> Amount {
        let fee = (amount.value() * self.rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        // Non-negative amount times a non-negative rate.
        Amount::new(fee).unwrap_or(Amount::ZERO)
    }

    pub fn total_amount(&self, amount: Amount) -> Amount {
        amount + self.platform_fee(amount)
    }

    pub fn breakdown(&self, job_amount: Amount, tip: Amount) -> PaymentBreakdown {
        let platform_fee = self.platform_fee(job_amount);
        PaymentBreakdown {
            job_amount,
            platform_fee,
            tip,
            employer_total: job_amount + platform_fee + tip,
            worker_net: job_amount + tip,
        }
    }
}
