//! The two live spend constraints.
//!
//! Daily limit: twice the budget in effect. Monthly limit: the sum, over every day of
//! the month so far, of the highest budget reached that day. Both are measured against
//! amounts already persisted in the ledger.

use crate::clock::{
    days_between, days_to_month_end, end_of_day, start_of_day, start_of_month, utc_date,
};
use crate::ports::CostLedger;
use crate::timeline::BudgetTimeline;
use crate::types::CampaignId;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

/// Budget state of a day, resolved from the timeline at the window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBudget {
    /// No change precedes the instant; nothing is generated.
    NotStarted,
    /// Budget explicitly zero.
    Paused,
    Active(Decimal),
}

impl DayBudget {
    pub fn from_value(value: Option<Decimal>) -> Self {
        match value {
            None => Self::NotStarted,
            Some(v) if v.is_zero() => Self::Paused,
            Some(v) => Self::Active(v),
        }
    }

    /// `None` when the campaign has not started.
    pub fn daily_limit(&self) -> Option<Decimal> {
        match self {
            Self::NotStarted => None,
            Self::Paused => Some(Decimal::ZERO),
            Self::Active(budget) => Some(*budget * Decimal::TWO),
        }
    }
}

/// Running consumption against a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPool {
    limit: Decimal,
    spent: Decimal,
}

impl CapacityPool {
    pub fn new(limit: Decimal, spent: Decimal) -> Self {
        Self { limit, spent }
    }

    pub fn record(&mut self, amount: Decimal) {
        self.spent += amount;
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn spent(&self) -> Decimal {
        self.spent
    }

    /// Floored at zero.
    pub fn remaining(&self) -> Decimal {
        (self.limit - self.spent).max(Decimal::ZERO)
    }

    pub fn is_exhausted(&self) -> bool {
        self.spent >= self.limit
    }
}

/// Derives limits from a loaded timeline and reads consumption from a ledger.
#[derive(Debug, Clone, Copy)]
pub struct CapacityCalculator<'a> {
    timeline: &'a BudgetTimeline,
}

impl<'a> CapacityCalculator<'a> {
    pub fn new(timeline: &'a BudgetTimeline) -> Self {
        Self { timeline }
    }

    pub fn day_budget(&self, at: OffsetDateTime) -> DayBudget {
        DayBudget::from_value(self.timeline.value_at(at))
    }

    pub fn daily_limit(&self, at: OffsetDateTime) -> Option<Decimal> {
        self.day_budget(at).daily_limit()
    }

    /// Sum of each day's peak budget from the 1st of `at`'s month through `at`'s day.
    pub fn monthly_limit(&self, at: OffsetDateTime) -> Decimal {
        let today = utc_date(at);
        days_between(start_of_month(today), today)
            .map(|d| self.timeline.max_value_on_date(d))
            .sum()
    }

    pub fn daily_cumulative(
        &self,
        ledger: &dyn CostLedger,
        campaign: CampaignId,
        day: Date,
    ) -> anyhow::Result<Decimal> {
        ledger.sum_amount(campaign, start_of_day(day), end_of_day(day))
    }

    /// Persisted spend from the start of `at`'s month through `at`.
    pub fn monthly_cumulative(
        &self,
        ledger: &dyn CostLedger,
        campaign: CampaignId,
        at: OffsetDateTime,
    ) -> anyhow::Result<Decimal> {
        let month_start = start_of_day(start_of_month(utc_date(at)));
        ledger.sum_amount(campaign, month_start, at)
    }

    /// Monthly pool for new spend on `date`.
    ///
    /// Anything added on `date` also counts toward the month-to-date total of every
    /// later day of the month, and earlier runs may already have stored spend there.
    /// The pool therefore allows only the tightest headroom over `date` and the rest
    /// of its month, where a day's headroom is its monthly limit minus the spend
    /// stored from the 1st through that day. The returned limit is `date`'s own.
    pub fn monthly_pool(
        &self,
        ledger: &dyn CostLedger,
        campaign: CampaignId,
        date: Date,
    ) -> anyhow::Result<CapacityPool> {
        let limit_today = self.monthly_limit(end_of_day(date));
        let mut limit = limit_today;
        let mut spent = self.monthly_cumulative(ledger, campaign, end_of_day(date))?;
        let mut headroom = limit - spent;
        for day in days_to_month_end(date).skip(1) {
            limit += self.timeline.max_value_on_date(day);
            spent += self.daily_cumulative(ledger, campaign, day)?;
            headroom = headroom.min(limit - spent);
        }
        Ok(CapacityPool::new(limit_today, limit_today - headroom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::new_budget_change;
    use crate::types::SpendEvent;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use time::macros::{date, datetime};

    #[derive(Default)]
    struct VecLedger(RefCell<Vec<SpendEvent>>);

    impl CostLedger for VecLedger {
        fn sum_amount(
            &self,
            id: CampaignId,
            start: OffsetDateTime,
            end: OffsetDateTime,
        ) -> anyhow::Result<Decimal> {
            Ok(self
                .0
                .borrow()
                .iter()
                .filter(|e| e.campaign_id == id && e.occurred_at >= start && e.occurred_at <= end)
                .map(|e| e.amount)
                .sum())
        }

        fn insert(&self, event: &SpendEvent) -> anyhow::Result<()> {
            self.0.borrow_mut().push(event.clone());
            Ok(())
        }

        fn delete_range(
            &self,
            _id: CampaignId,
            _start: OffsetDateTime,
            _end: OffsetDateTime,
        ) -> anyhow::Result<usize> {
            Ok(0)
        }
    }

    fn raised_then_lowered() -> BudgetTimeline {
        let id = CampaignId(1);
        BudgetTimeline::new(vec![
            new_budget_change(id, dec!(0), dec!(100), datetime!(2025-02-20 00:00 UTC)),
            new_budget_change(id, dec!(100), dec!(200), datetime!(2025-03-11 10:00 UTC)),
            new_budget_change(id, dec!(200), dec!(150), datetime!(2025-03-11 18:00 UTC)),
        ])
    }

    #[test]
    fn day_budget_classification() {
        assert_eq!(DayBudget::from_value(None), DayBudget::NotStarted);
        assert_eq!(DayBudget::from_value(Some(Decimal::ZERO)), DayBudget::Paused);
        assert_eq!(DayBudget::from_value(Some(dec!(80))), DayBudget::Active(dec!(80)));
        assert_eq!(DayBudget::NotStarted.daily_limit(), None);
        assert_eq!(DayBudget::Paused.daily_limit(), Some(Decimal::ZERO));
        assert_eq!(DayBudget::Active(dec!(80)).daily_limit(), Some(dec!(160)));
    }

    #[test]
    fn daily_limit_is_twice_budget() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        for (at, expected) in [
            (datetime!(2025-02-19 12:00 UTC), None),
            (datetime!(2025-03-01 00:00 UTC), Some(dec!(200))),
            (datetime!(2025-03-11 12:00 UTC), Some(dec!(400))),
            (datetime!(2025-03-31 23:59:59 UTC), Some(dec!(300))),
        ] {
            assert_eq!(calc.daily_limit(at), expected);
            if let Some(v) = t.value_at(at) {
                assert_eq!(calc.daily_limit(at), Some(v * dec!(2)));
            }
        }
    }

    #[test]
    fn monthly_limit_sums_daily_peaks() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        // March 1..10 at 100, March 11 peaks at 200, March 12..31 at 150.
        let expected = dec!(100) * dec!(10) + dec!(200) + dec!(150) * dec!(20);
        assert_eq!(calc.monthly_limit(datetime!(2025-03-31 23:59:59 UTC)), expected);
        assert_eq!(calc.monthly_limit(datetime!(2025-03-11 00:00 UTC)), dec!(1200));
        assert_eq!(calc.monthly_limit(datetime!(2025-03-01 08:00 UTC)), dec!(100));
    }

    #[test]
    fn monthly_limit_ignores_days_before_start() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        // February 1..19 contribute nothing; 20..28 contribute 100 each.
        assert_eq!(calc.monthly_limit(datetime!(2025-02-28 12:00 UTC)), dec!(900));
    }

    #[test]
    fn cumulative_reads_from_ledger() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        let ledger = VecLedger::default();
        let id = CampaignId(1);
        for (amount, at) in [
            (dec!(10.00), datetime!(2025-03-01 09:00 UTC)),
            (dec!(20.00), datetime!(2025-03-02 09:00 UTC)),
            (dec!(5.50), datetime!(2025-03-02 21:00 UTC)),
            (dec!(99.00), datetime!(2025-02-28 21:00 UTC)),
        ] {
            ledger
                .insert(&crate::event::new_spend_event(id, amount, at, dec!(100), dec!(200)))
                .unwrap();
        }
        assert_eq!(
            calc.daily_cumulative(&ledger, id, date!(2025 - 03 - 02)).unwrap(),
            dec!(25.50)
        );
        assert_eq!(
            calc.monthly_cumulative(&ledger, id, datetime!(2025-03-02 12:00 UTC)).unwrap(),
            dec!(30.00)
        );
        let pool = calc.monthly_pool(&ledger, id, date!(2025 - 03 - 02)).unwrap();
        assert_eq!(pool.limit(), dec!(200));
        assert_eq!(pool.spent(), dec!(30.00));
        assert_eq!(pool.remaining(), dec!(170.00));
    }

    fn spend(ledger: &VecLedger, amount: Decimal, at: OffsetDateTime) {
        ledger
            .insert(&crate::event::new_spend_event(CampaignId(1), amount, at, dec!(100), dec!(200)))
            .unwrap();
    }

    #[test]
    fn monthly_pool_counts_spend_on_later_days() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        let ledger = VecLedger::default();
        let id = CampaignId(1);
        // Limits through the 1st, 2nd and 3rd are 100, 200 and 300.
        spend(&ledger, dec!(40.00), datetime!(2025-03-01 09:00 UTC));
        spend(&ledger, dec!(100.00), datetime!(2025-03-02 09:00 UTC));
        spend(&ledger, dec!(130.00), datetime!(2025-03-03 09:00 UTC));

        // The 1st and 2nd each leave 60, but the 3rd leaves only 30.
        let pool = calc.monthly_pool(&ledger, id, date!(2025 - 03 - 01)).unwrap();
        assert_eq!(pool.limit(), dec!(100));
        assert_eq!(pool.remaining(), dec!(30.00));

        spend(&ledger, dec!(30.00), datetime!(2025-03-03 20:00 UTC));
        let pool = calc.monthly_pool(&ledger, id, date!(2025 - 03 - 01)).unwrap();
        assert!(pool.is_exhausted());
        assert!(calc.monthly_pool(&ledger, id, date!(2025 - 03 - 02)).unwrap().is_exhausted());
    }

    #[test]
    fn monthly_pool_ignores_next_month() {
        let t = raised_then_lowered();
        let calc = CapacityCalculator::new(&t);
        let ledger = VecLedger::default();
        let id = CampaignId(1);
        spend(&ledger, dec!(50.00), datetime!(2025-02-28 09:00 UTC));
        spend(&ledger, dec!(100.00), datetime!(2025-03-01 09:00 UTC));

        // February 20..28 allow 900; March spend belongs to the next month.
        let pool = calc.monthly_pool(&ledger, id, date!(2025 - 02 - 27)).unwrap();
        assert_eq!(pool.limit(), dec!(800));
        assert_eq!(pool.remaining(), dec!(800.00));
        let pool = calc.monthly_pool(&ledger, id, date!(2025 - 02 - 28)).unwrap();
        assert_eq!(pool.remaining(), dec!(850.00));
    }

    #[test]
    fn pool_floors_at_zero() {
        let mut pool = CapacityPool::new(dec!(10), dec!(4));
        assert!(!pool.is_exhausted());
        pool.record(dec!(6));
        assert!(pool.is_exhausted());
        assert_eq!(pool.remaining(), Decimal::ZERO);
        pool.record(dec!(1));
        assert_eq!(pool.remaining(), Decimal::ZERO);
    }
}
