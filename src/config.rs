use crate::domain::fees::{FeeSchedule, PLATFORM_FEE_RATE};
use crate::domain::money::DEFAULT_CURRENCY;
use crate::domain::payment::PaymentChannel;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Marketplace settings, usually read from a JSON file.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Share of the job amount charged to the employer, e.g. `0.15`.
    pub platform_fee_rate: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub payment_provider: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            platform_fee_rate: PLATFORM_FEE_RATE,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method: "card".to_string(),
            payment_provider: "payfast".to_string(),
        }
    }
}

impl MarketplaceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn fee_schedule(&self) -> Result<FeeSchedule> {
        FeeSchedule::new(self.platform_fee_rate)
    }

    pub fn payment_channel(&self) -> PaymentChannel {
        PaymentChannel {
            method: self.payment_method.clone(),
            provider: self.payment_provider.clone(),
            currency: self.currency.clone(),
        }
    }
}
