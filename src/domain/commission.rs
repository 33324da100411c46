use super::money::{Money, Rate};
use serde::{Deserialize, Serialize};

/// Decides the platform's cut for a vendor's sales.
pub trait CommissionPolicy: Send + Sync {
    /// `amount` is the value of the cart line being charged.
    fn rate(&self, vendor_id: &str, category: &str, amount: Money, monthly_revenue_to_date: Money) -> Rate;
}

pub type CommissionPolicyBox = Box<dyn CommissionPolicy>;

/// Same rate for every vendor and category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCommission(pub Rate);

impl CommissionPolicy for FlatCommission {
    fn rate(&self, _vendor_id: &str, _category: &str, _amount: Money, _revenue: Money) -> Rate {
        self.0
    }
}

/// Whether a rate or tier is currently in force. Inactive entries are kept
/// in the config but ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// Rate override for one product category, for line amounts between
/// `min_amount` and `max_amount` (inclusive, open-ended when `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRate {
    pub category: String,
    pub rate: Rate,
    #[serde(default)]
    pub min_amount: Money,
    #[serde(default)]
    pub max_amount: Option<Money>,
    #[serde(default)]
    pub status: RuleStatus,
}

impl CategoryRate {
    fn applies(&self, category: &str, amount: Money) -> bool {
        self.status == RuleStatus::Active
            && self.category == category
            && amount >= self.min_amount
            && self.max_amount.is_none_or(|max| amount <= max)
    }
}

/// Rate applied once a vendor's month-to-date revenue reaches `monthly_revenue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueTier {
    pub monthly_revenue: Money,
    pub rate: Rate,
    #[serde(default)]
    pub status: RuleStatus,
}

/// Category rates first, then the highest revenue tier reached, then the
/// default rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredCommission {
    pub default_rate: Rate,
    #[serde(default)]
    pub category_rates: Vec<CategoryRate>,
    #[serde(default)]
    pub revenue_tiers: Vec<RevenueTier>,
}

impl CommissionPolicy for TieredCommission {
    fn rate(&self, _vendor_id: &str, category: &str, amount: Money, revenue: Money) -> Rate {
        if let Some(found) = self.category_rates.iter().find(|c| c.applies(category, amount)) {
            return found.rate;
        }

        self.revenue_tiers
            .iter()
            .filter(|tier| tier.status == RuleStatus::Active && revenue >= tier.monthly_revenue)
            .max_by_key(|tier| tier.monthly_revenue)
            .map_or(self.default_rate, |tier| tier.rate)
    }
}
