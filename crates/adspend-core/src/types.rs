use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Prefix for budget change ids: `chg_<ulid>`.
pub const CHANGE_ID_PREFIX: &str = "chg";

/// Prefix for cost ids: `cost_<ulid>`.
pub const COST_ID_PREFIX: &str = "cost";

/// Campaign identifier as assigned by the campaign store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CampaignId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CampaignId)
    }
}

/// A campaign record. The engine only reads it; its lifecycle belongs to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub current_budget: Decimal,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Campaign {
    /// Paused means inactive or running on a zero budget.
    pub fn is_paused(&self) -> bool {
        !self.is_active || self.current_budget.is_zero()
    }
}

/// One entry of a campaign's budget change log. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetChange {
    pub change_id: String,
    pub campaign_id: CampaignId,
    pub previous_value: Decimal,
    pub new_value: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub effective_at: OffsetDateTime,
}

impl BudgetChange {
    pub fn delta(&self) -> Decimal {
        self.new_value - self.previous_value
    }

    pub fn was_increased(&self) -> bool {
        self.new_value > self.previous_value
    }

    pub fn was_decreased(&self) -> bool {
        self.new_value < self.previous_value
    }
}

/// A synthesized cost record, carrying the constraints in force when it was created.
///
/// `amount` is non-negative with two decimal places. An amount of exactly zero marks
/// a day on which the campaign was explicitly paused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendEvent {
    pub cost_id: String,
    pub campaign_id: CampaignId,
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub budget_in_effect: Decimal,
    pub daily_limit_in_effect: Decimal,
}

impl SpendEvent {
    pub fn is_zero_marker(&self) -> bool {
        self.amount.is_zero() && self.daily_limit_in_effect.is_zero()
    }

    /// Share of the daily limit consumed by this record, in percent.
    pub fn daily_utilization(&self) -> Decimal {
        if self.daily_limit_in_effect.is_zero() {
            return Decimal::ZERO;
        }
        self.amount / self.daily_limit_in_effect * Decimal::ONE_HUNDRED
    }

    pub fn exceeded_budget(&self) -> bool {
        self.amount > self.budget_in_effect
    }

    pub fn exceeded_daily_limit(&self) -> bool {
        self.amount > self.daily_limit_in_effect
    }
}
