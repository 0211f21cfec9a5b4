//! Spend statistics for one campaign as of a given instant.

use crate::summary::{cost_trend, in_range, TrendPoint};
use adspend_core::clock::{months_before, start_of_day, start_of_month, start_of_week, utc_date};
use adspend_core::money::round_cents;
use adspend_core::{BudgetTimeline, CapacityCalculator, Campaign, SpendEvent, ValueError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Reporting window, always ending at "now" unless custom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Today,
    /// From Monday of the current ISO week.
    Week,
    Month,
    /// Defaults: one month before now, through now.
    Custom {
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
    },
}

impl Period {
    pub fn resolve(&self, now: OffsetDateTime) -> Result<(OffsetDateTime, OffsetDateTime), ValueError> {
        let today = utc_date(now);
        Ok(match *self {
            Self::Today => (start_of_day(today), now),
            Self::Week => (start_of_day(start_of_week(today)), now),
            Self::Month => (start_of_day(start_of_month(today)), now),
            Self::Custom { from, to } => {
                let from = match from {
                    Some(t) => t,
                    None => months_before(now, 1)?,
                };
                (from, to.unwrap_or(now))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    /// Parses a period name; `custom` starts with both bounds defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "custom" => Ok(Self::Custom {
                from: None,
                to: None,
            }),
            other => anyhow::bail!("unknown period '{other}' (expected today, week, month or custom)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignStatistics {
    pub period: String,
    #[serde(with = "time::serde::rfc3339")]
    pub period_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_end: OffsetDateTime,
    pub daily_spent: Decimal,
    pub daily_budget: Decimal,
    pub daily_limit: Decimal,
    pub daily_remaining: Decimal,
    pub monthly_spent: Decimal,
    pub monthly_limit: Decimal,
    pub monthly_remaining: Decimal,
    pub period_spent: Decimal,
    pub period_costs_count: usize,
    pub average_cost: Decimal,
    pub cost_trend: Vec<TrendPoint>,
}

/// Statistics at `now`. `costs` must cover both the period and the current month
/// up to `now`; records outside those ranges are ignored.
pub fn statistics(
    campaign: &Campaign,
    costs: &[SpendEvent],
    timeline: &BudgetTimeline,
    period: Period,
    now: OffsetDateTime,
) -> Result<CampaignStatistics, ValueError> {
    let (start, end) = period.resolve(now)?;
    let today = utc_date(now);
    let sum = |from: OffsetDateTime, to: OffsetDateTime| -> Decimal {
        in_range(costs, from, to).map(|c| c.amount).sum()
    };

    let daily_spent = sum(start_of_day(today), now);
    let daily_limit = campaign.current_budget * Decimal::TWO;
    let monthly_spent = sum(start_of_day(start_of_month(today)), now);
    let monthly_limit = CapacityCalculator::new(timeline).monthly_limit(now);

    let period_costs: Vec<_> = in_range(costs, start, end).collect();
    let period_spent: Decimal = period_costs.iter().map(|c| c.amount).sum();
    let average_cost = if period_costs.is_empty() {
        Decimal::ZERO
    } else {
        round_cents(period_spent / Decimal::from(period_costs.len()))
    };

    Ok(CampaignStatistics {
        period: period.name().to_string(),
        period_start: start,
        period_end: end,
        daily_spent,
        daily_budget: campaign.current_budget,
        daily_limit,
        daily_remaining: (daily_limit - daily_spent).max(Decimal::ZERO),
        monthly_spent,
        monthly_limit,
        monthly_remaining: (monthly_limit - monthly_spent).max(Decimal::ZERO),
        period_spent,
        period_costs_count: period_costs.len(),
        average_cost,
        cost_trend: cost_trend(costs, start, end),
    })
}
