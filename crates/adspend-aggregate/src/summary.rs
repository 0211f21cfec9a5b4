use adspend_core::clock::utc_date;
use adspend_core::money::round_cents;
use adspend_core::SpendEvent;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime};

/// One UTC day of stored spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    #[serde(serialize_with = "date_str")]
    pub date: Date,
    pub cost_count: usize,
    pub total_cost: Decimal,
    /// Highest daily limit recorded on the day's costs.
    pub daily_limit: Decimal,
    pub max_budget: Decimal,
    /// `total_cost / daily_limit` as a percentage, 0 when the limit is 0.
    pub utilization: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    #[serde(serialize_with = "date_str")]
    pub date: Date,
    pub total: Decimal,
}

pub(crate) fn date_str<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(date)
}

pub(crate) fn in_range<'a>(
    costs: &'a [SpendEvent],
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> impl Iterator<Item = &'a SpendEvent> {
    costs
        .iter()
        .filter(move |c| c.occurred_at >= from && c.occurred_at <= to)
}

/// Per-day rollup of `costs` within `[from, to]`, ordered by date. Days without
/// records are absent.
pub fn daily_summary(costs: &[SpendEvent], from: OffsetDateTime, to: OffsetDateTime) -> Vec<DailySummary> {
    let mut days: BTreeMap<Date, DailySummary> = BTreeMap::new();
    for c in in_range(costs, from, to) {
        let date = utc_date(c.occurred_at);
        let day = days.entry(date).or_insert_with(|| DailySummary {
            date,
            cost_count: 0,
            total_cost: Decimal::ZERO,
            daily_limit: Decimal::ZERO,
            max_budget: Decimal::ZERO,
            utilization: Decimal::ZERO,
        });
        day.cost_count += 1;
        day.total_cost += c.amount;
        day.daily_limit = day.daily_limit.max(c.daily_limit_in_effect);
        day.max_budget = day.max_budget.max(c.budget_in_effect);
    }

    days.into_values()
        .map(|mut day| {
            if day.daily_limit > Decimal::ZERO {
                day.utilization = round_cents(day.total_cost / day.daily_limit * Decimal::ONE_HUNDRED);
            }
            day
        })
        .collect()
}

/// Per-day totals within `[from, to]`.
pub fn cost_trend(costs: &[SpendEvent], from: OffsetDateTime, to: OffsetDateTime) -> Vec<TrendPoint> {
    let mut days: BTreeMap<Date, Decimal> = BTreeMap::new();
    for c in in_range(costs, from, to) {
        *days.entry(utc_date(c.occurred_at)).or_default() += c.amount;
    }
    days.into_iter()
        .map(|(date, total)| TrendPoint { date, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adspend_core::event::{new_spend_event, new_zero_marker};
    use adspend_core::CampaignId;
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};

    fn sample() -> Vec<SpendEvent> {
        let id = CampaignId(1);
        vec![
            new_spend_event(id, dec!(40.00), datetime!(2025-03-01 08:00 UTC), dec!(100), dec!(200)),
            new_spend_event(id, dec!(60.00), datetime!(2025-03-01 20:00 UTC), dec!(100), dec!(200)),
            new_zero_marker(id, datetime!(2025-03-02 0:00 UTC)),
            new_spend_event(id, dec!(33.33), datetime!(2025-03-03 10:00 UTC), dec!(150), dec!(300)),
            new_spend_event(id, dec!(5.00), datetime!(2025-04-01 10:00 UTC), dec!(150), dec!(300)),
        ]
    }

    #[test]
    fn groups_by_day_in_order() {
        let rows = daily_summary(
            &sample(),
            datetime!(2025-03-01 0:00 UTC),
            datetime!(2025-03-31 23:59:59 UTC),
        );
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].date, date!(2025 - 03 - 01));
        assert_eq!(rows[0].cost_count, 2);
        assert_eq!(rows[0].total_cost, dec!(100.00));
        assert_eq!(rows[0].daily_limit, dec!(200));
        assert_eq!(rows[0].max_budget, dec!(100));
        assert_eq!(rows[0].utilization, dec!(50.00));

        assert_eq!(rows[1].cost_count, 1);
        assert_eq!(rows[1].utilization, Decimal::ZERO);

        // 33.33 / 300 = 11.11%
        assert_eq!(rows[2].utilization, dec!(11.11));
    }

    #[test]
    fn empty_range_is_empty() {
        assert!(daily_summary(
            &sample(),
            datetime!(2025-05-01 0:00 UTC),
            datetime!(2025-05-31 0:00 UTC)
        )
        .is_empty());
    }

    #[test]
    fn trend_sums_per_day() {
        let trend = cost_trend(
            &sample(),
            datetime!(2025-03-01 12:00 UTC),
            datetime!(2025-04-30 0:00 UTC),
        );
        let totals: Vec<_> = trend.iter().map(|t| (t.date, t.total)).collect();
        assert_eq!(
            totals,
            vec![
                (date!(2025 - 03 - 01), dec!(60.00)),
                (date!(2025 - 03 - 02), dec!(0)),
                (date!(2025 - 03 - 03), dec!(33.33)),
                (date!(2025 - 04 - 01), dec!(5.00)),
            ]
        );
    }

    #[test]
    fn dates_serialize_as_calendar_text() {
        let point = TrendPoint {
            date: date!(2025 - 03 - 01),
            total: dec!(1.50),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2025-03-01");
        assert_eq!(json["total"], "1.50");
    }
}
