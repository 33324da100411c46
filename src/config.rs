use crate::domain::cart::CartLimits;
use crate::domain::commission::{CommissionPolicyBox, FlatCommission, TieredCommission};
use crate::domain::money::Rate;
use crate::error::ConfigError;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which commission policy the engine applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommissionSettings {
    Flat { rate: Rate },
    Tiered(TieredCommission),
}

impl Default for CommissionSettings {
    fn default() -> Self {
        CommissionSettings::Flat {
            rate: Rate::from_decimal_unchecked(dec!(0.10)),
        }
    }
}

impl CommissionSettings {
    pub fn into_policy(self) -> CommissionPolicyBox {
        match self {
            CommissionSettings::Flat { rate } => Box::new(FlatCommission(rate)),
            CommissionSettings::Tiered(tiered) => Box::new(tiered),
        }
    }
}

/// Tunables of the order engine. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tax_rate: Rate,
    pub commission: CommissionSettings,
    /// How many times a conflicting transaction body runs before giving up.
    pub max_attempts: u32,
    pub commit_timeout_ms: u64,
    pub limits: CartLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tax_rate: Rate::from_decimal_unchecked(dec!(0.08)),
            commission: CommissionSettings::default(),
            max_attempts: 3,
            commit_timeout_ms: 10_000,
            limits: CartLimits::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.commit_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "commit_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.commit_timeout(), Duration::from_secs(10));
        assert_eq!(config.tax_rate.value(), dec!(0.08));
        assert_eq!(config.limits.max_line_quantity, 100);
    }

    #[test]
    fn test_flat_commission_config() {
        let config =
            EngineConfig::from_json(r#"{"commission": {"kind": "flat", "rate": "0.15"}}"#).unwrap();
        let policy = config.commission.into_policy();
        assert_eq!(policy.rate("v", "c", Money::ZERO, Money::ZERO).value(), dec!(0.15));
    }

    #[test]
    fn test_tiered_commission_config() {
        let raw = r#"{
            "tax_rate": "0",
            "commission": {
                "kind": "tiered",
                "default_rate": "0.10",
                "category_rates": [{"category": "fuel_bunker", "rate": "0.02"}]
            },
            "limits": {"max_line_quantity": 10}
        }"#;
        let config = EngineConfig::from_json(raw).unwrap();
        assert_eq!(config.limits.max_line_quantity, 10);
        assert_eq!(config.limits.max_total_items, 1000);
        let policy = config.commission.into_policy();
        assert_eq!(policy.rate("v", "fuel_bunker", Money::new(dec!(50)), Money::ZERO).value(), dec!(0.02));
        assert_eq!(policy.rate("v", "other", Money::new(dec!(50)), Money::ZERO).value(), dec!(0.10));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"tax_rate": "1.2"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_attempts": 0}"#),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
