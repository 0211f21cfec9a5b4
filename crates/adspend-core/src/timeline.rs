//! Budget-as-of-time reconstruction from a campaign's change log.

use crate::clock::{end_of_day, start_of_day};
use crate::types::BudgetChange;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

/// Changes for one campaign, ordered by `effective_at`.
///
/// Changes sharing an instant keep their load order; the last one wins.
#[derive(Debug, Clone, Default)]
pub struct BudgetTimeline {
    changes: Vec<BudgetChange>,
}

impl BudgetTimeline {
    pub fn new(mut changes: Vec<BudgetChange>) -> Self {
        changes.sort_by_key(|c| c.effective_at);
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[BudgetChange] {
        &self.changes
    }

    /// Budget in effect at `instant`: the `new_value` of the latest change at or
    /// before it. `None` means the campaign had not started, which is distinct
    /// from an explicit zero.
    pub fn value_at(&self, instant: OffsetDateTime) -> Option<Decimal> {
        let idx = self.changes.partition_point(|c| c.effective_at <= instant);
        idx.checked_sub(1).map(|i| self.changes[i].new_value)
    }

    /// Highest budget active at any point in `[day_start, day_end]`: the opening
    /// value and every value set inside the range. Zero when nothing applies.
    pub fn max_value_on_day(&self, day_start: OffsetDateTime, day_end: OffsetDateTime) -> Decimal {
        let opening = self.value_at(day_start);
        let lo = self.changes.partition_point(|c| c.effective_at < day_start);
        let hi = self.changes.partition_point(|c| c.effective_at <= day_end);
        self.changes
            .get(lo..hi)
            .unwrap_or(&[])
            .iter()
            .map(|c| c.new_value)
            .chain(opening)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// [`max_value_on_day`](Self::max_value_on_day) over a whole calendar day.
    pub fn max_value_on_date(&self, date: Date) -> Decimal {
        self.max_value_on_day(start_of_day(date), end_of_day(date))
    }

    /// Most recent non-zero budget, used when resuming a paused campaign.
    pub fn last_non_zero(&self) -> Option<Decimal> {
        self.changes
            .iter()
            .rev()
            .map(|c| c.new_value)
            .find(|v| !v.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::new_budget_change;
    use crate::types::CampaignId;
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};

    fn change(prev: Decimal, new: Decimal, at: OffsetDateTime) -> BudgetChange {
        new_budget_change(CampaignId(1), prev, new, at)
    }

    fn sample() -> BudgetTimeline {
        // Deliberately out of order: construction sorts.
        BudgetTimeline::new(vec![
            change(dec!(100), dec!(200), datetime!(2025-03-10 09:00 UTC)),
            change(dec!(0), dec!(100), datetime!(2025-03-01 00:00 UTC)),
            change(dec!(200), dec!(150), datetime!(2025-03-10 17:00 UTC)),
            change(dec!(150), dec!(0), datetime!(2025-03-20 12:00 UTC)),
        ])
    }

    #[test]
    fn value_before_first_change_is_none() {
        let t = sample();
        assert_eq!(t.value_at(datetime!(2025-02-28 23:59:59 UTC)), None);
    }

    #[test]
    fn value_at_is_inclusive_of_change_instant() {
        let t = sample();
        assert_eq!(t.value_at(datetime!(2025-03-01 00:00 UTC)), Some(dec!(100)));
        assert_eq!(t.value_at(datetime!(2025-03-10 08:59:59 UTC)), Some(dec!(100)));
        assert_eq!(t.value_at(datetime!(2025-03-10 09:00 UTC)), Some(dec!(200)));
        assert_eq!(t.value_at(datetime!(2025-03-15 00:00 UTC)), Some(dec!(150)));
    }

    #[test]
    fn explicit_zero_is_some_zero() {
        let t = sample();
        assert_eq!(t.value_at(datetime!(2025-03-21 00:00 UTC)), Some(Decimal::ZERO));
    }

    #[test]
    fn max_on_day_credits_intraday_peak() {
        let t = sample();
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 09)), dec!(100));
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 10)), dec!(200));
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 11)), dec!(150));
        // Paused at noon: the morning's 150 still counts.
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 20)), dec!(150));
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 21)), Decimal::ZERO);
    }

    #[test]
    fn max_on_day_without_history_is_zero() {
        let t = sample();
        assert_eq!(t.max_value_on_date(date!(2025 - 02 - 01)), Decimal::ZERO);
        assert_eq!(BudgetTimeline::default().max_value_on_date(date!(2025 - 02 - 01)), Decimal::ZERO);
    }

    #[test]
    fn same_instant_changes_last_wins() {
        let at = datetime!(2025-03-01 00:00 UTC);
        let t = BudgetTimeline::new(vec![
            change(dec!(0), dec!(100), at),
            change(dec!(100), dec!(120), at),
        ]);
        assert_eq!(t.value_at(at), Some(dec!(120)));
        assert_eq!(t.max_value_on_date(date!(2025 - 03 - 01)), dec!(120));
    }

    #[test]
    fn last_non_zero_skips_pauses() {
        let t = sample();
        assert_eq!(t.last_non_zero(), Some(dec!(150)));
        assert_eq!(BudgetTimeline::default().last_non_zero(), None);
    }
}
