//! Per-day spend synthesis.
//!
//! A day's records are drawn at random instants inside its window. Each amount is
//! bounded by whichever of the daily or monthly remaining capacity is smaller, so
//! neither limit is ever crossed.

use adspend_core::capacity::{CapacityCalculator, CapacityPool, DayBudget};
use adspend_core::clock::utc_date;
use adspend_core::event::{new_spend_event, new_zero_marker};
use adspend_core::money::{one_cent, round_cents};
use adspend_core::{CampaignId, CostLedger, SpendEvent};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use time::{Duration, OffsetDateTime};

/// Inclusive instant range inside one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// How a day's synthesis ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    /// No budget had been set yet.
    Skipped,
    /// Budget explicitly zero; a single zero marker is written.
    ///
    /// Markers are not de-duplicated: regenerating a paused day adds another one
    /// unless the period was cleared first.
    Zeroed,
    /// A limit ran out, possibly before the first draw.
    Exhausted,
    /// Every drawn instant was processed.
    WindowEnd,
}

impl DayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Zeroed => "zeroed",
            Self::Exhausted => "exhausted",
            Self::WindowEnd => "window_end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySynthesis {
    pub state: DayState,
    /// Chronological.
    pub events: Vec<SpendEvent>,
}

impl DaySynthesis {
    fn empty(state: DayState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisSettings {
    pub min_events: u32,
    pub max_events: u32,
    /// Lower end of the amount band, as a fraction of the capacity available.
    pub min_amount_fraction: Decimal,
}

impl SynthesisSettings {
    /// Draw range for the day's event count: at least one, and never inverted.
    pub fn event_range(&self) -> std::ops::RangeInclusive<u32> {
        let lo = self.min_events.max(1);
        lo..=self.max_events.max(lo)
    }
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            min_events: 1,
            max_events: 10,
            min_amount_fraction: Decimal::new(1, 1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventSynthesizer {
    settings: SynthesisSettings,
}

impl EventSynthesizer {
    pub fn new(settings: SynthesisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Synthesize one day. Nothing is written: the caller persists `events`.
    ///
    /// Capacity already used is read from `ledger`, so records from earlier runs
    /// reduce what this run may add. That includes spend stored on later days of the
    /// month, which the monthly pool must leave room for.
    ///
    /// A paused day always yields a fresh zero marker, so rerunning over one appends
    /// a duplicate. Callers wanting a clean rerun clear the period first.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        calc: &CapacityCalculator<'_>,
        ledger: &dyn CostLedger,
        campaign: CampaignId,
        budget: DayBudget,
        window: DayWindow,
    ) -> anyhow::Result<DaySynthesis> {
        let budget = match budget {
            DayBudget::NotStarted => return Ok(DaySynthesis::empty(DayState::Skipped)),
            DayBudget::Paused => {
                return Ok(DaySynthesis {
                    state: DayState::Zeroed,
                    events: vec![new_zero_marker(campaign, window.start)],
                })
            }
            DayBudget::Active(budget) => budget,
        };

        let date = utc_date(window.start);
        let daily_limit = budget * Decimal::TWO;
        let spent_today = calc.daily_cumulative(ledger, campaign, date)?;
        let mut daily = CapacityPool::new(daily_limit, spent_today);
        if daily.is_exhausted() {
            return Ok(DaySynthesis::empty(DayState::Exhausted));
        }
        let mut monthly = calc.monthly_pool(ledger, campaign, date)?;

        let count = rng.gen_range(self.settings.event_range());
        let instants = draw_instants(rng, window, count);

        let mut events = Vec::with_capacity(instants.len());
        let mut state = DayState::WindowEnd;

        for at in instants {
            if daily.is_exhausted() || monthly.is_exhausted() {
                state = DayState::Exhausted;
                break;
            }
            let cap = daily.remaining().min(monthly.remaining());
            if cap < one_cent() {
                state = DayState::Exhausted;
                break;
            }
            let amount = self.draw_amount(rng, cap);
            if amount <= Decimal::ZERO {
                continue;
            }
            events.push(new_spend_event(campaign, amount, at, budget, daily_limit));
            daily.record(amount);
            monthly.record(amount);
        }

        Ok(DaySynthesis { state, events })
    }

    /// Uniform in `[fraction * cap, cap]`, rounded half-up to cents.
    fn draw_amount<R: Rng + ?Sized>(&self, rng: &mut R, cap: Decimal) -> Decimal {
        let low = cap * self.settings.min_amount_fraction;
        let t = Decimal::from_f64(rng.gen_range(0.0..=1.0)).unwrap_or(Decimal::ZERO);
        round_cents(low + (cap - low) * t).min(cap)
    }
}

/// `count` uniform whole-second instants in the window, de-duplicated and ascending.
fn draw_instants<R: Rng + ?Sized>(
    rng: &mut R,
    window: DayWindow,
    count: u32,
) -> BTreeSet<OffsetDateTime> {
    let span = (window.end - window.start).whole_seconds();
    if span < 0 {
        return BTreeSet::new();
    }
    (0..count)
        .map(|_| window.start + Duration::seconds(rng.gen_range(0..=span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use adspend_core::event::new_budget_change;
    use adspend_core::BudgetTimeline;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    const ID: CampaignId = CampaignId(1);

    fn full_day() -> DayWindow {
        DayWindow {
            start: datetime!(2025-03-10 0:00 UTC),
            end: datetime!(2025-03-10 23:59:59 UTC),
        }
    }

    fn timeline(value: Decimal) -> BudgetTimeline {
        BudgetTimeline::new(vec![new_budget_change(
            ID,
            Decimal::ZERO,
            value,
            datetime!(2025-03-01 0:00 UTC),
        )])
    }

    fn run(
        store: &MemoryStore,
        t: &BudgetTimeline,
        settings: SynthesisSettings,
        budget: DayBudget,
        seed: u64,
    ) -> DaySynthesis {
        let mut rng = StdRng::seed_from_u64(seed);
        EventSynthesizer::new(settings)
            .synthesize(
                &mut rng,
                &CapacityCalculator::new(t),
                store,
                ID,
                budget,
                full_day(),
            )
            .unwrap()
    }

    #[test]
    fn not_started_produces_nothing() {
        let store = MemoryStore::new();
        let out = run(
            &store,
            &BudgetTimeline::default(),
            SynthesisSettings::default(),
            DayBudget::NotStarted,
            1,
        );
        assert_eq!(out.state, DayState::Skipped);
        assert!(out.events.is_empty());
    }

    #[test]
    fn paused_day_yields_one_zero_marker() {
        let store = MemoryStore::new();
        let settings = SynthesisSettings {
            min_events: 10,
            max_events: 10,
            ..SynthesisSettings::default()
        };
        let out = run(&store, &timeline(Decimal::ZERO), settings, DayBudget::Paused, 1);
        assert_eq!(out.state, DayState::Zeroed);
        assert_eq!(out.events.len(), 1);
        let marker = &out.events[0];
        assert!(marker.is_zero_marker());
        assert_eq!(marker.occurred_at, full_day().start);
        assert_eq!(marker.budget_in_effect, Decimal::ZERO);
        assert_eq!(marker.daily_limit_in_effect, Decimal::ZERO);
    }

    #[test]
    fn active_day_respects_daily_limit() {
        let t = timeline(dec!(150.00));
        for seed in 0..50 {
            let store = MemoryStore::new();
            let out = run(
                &store,
                &t,
                SynthesisSettings::default(),
                DayBudget::Active(dec!(150.00)),
                seed,
            );
            assert!((1..=10).contains(&out.events.len()), "seed {seed}");
            let mut running = Decimal::ZERO;
            let mut last = None;
            for e in &out.events {
                assert!(e.amount > Decimal::ZERO);
                assert!(e.amount <= e.daily_limit_in_effect);
                assert_eq!(e.amount, e.amount.round_dp(2));
                assert_eq!(e.budget_in_effect, dec!(150.00));
                assert_eq!(e.daily_limit_in_effect, dec!(300.00));
                assert!(e.occurred_at >= full_day().start && e.occurred_at <= full_day().end);
                if let Some(prev) = last {
                    assert!(e.occurred_at > prev, "instants must be strictly ascending");
                }
                last = Some(e.occurred_at);
                running += e.amount;
                assert!(running <= dec!(300.00));
            }
        }
    }

    #[test]
    fn prior_spend_short_circuits_exhausted_day() {
        let t = timeline(dec!(50.00));
        let store = MemoryStore::new();
        store
            .insert(&new_spend_event(
                ID,
                dec!(100.00),
                datetime!(2025-03-10 06:00 UTC),
                dec!(50.00),
                dec!(100.00),
            ))
            .unwrap();
        let out = run(
            &store,
            &t,
            SynthesisSettings::default(),
            DayBudget::Active(dec!(50.00)),
            7,
        );
        assert_eq!(out.state, DayState::Exhausted);
        assert!(out.events.is_empty());
    }

    #[test]
    fn prior_spend_reduces_remaining_capacity() {
        let t = timeline(dec!(50.00));
        for seed in 0..20 {
            let store = MemoryStore::new();
            store
                .insert(&new_spend_event(
                    ID,
                    dec!(90.00),
                    datetime!(2025-03-10 00:00 UTC),
                    dec!(50.00),
                    dec!(100.00),
                ))
                .unwrap();
            let out = run(
                &store,
                &t,
                SynthesisSettings::default(),
                DayBudget::Active(dec!(50.00)),
                seed,
            );
            let added: Decimal = out.events.iter().map(|e| e.amount).sum();
            assert!(added <= dec!(10.00), "seed {seed}: added {added}");
        }
    }

    #[test]
    fn monthly_limit_caps_amounts() {
        // Budget set on the 10th: the monthly limit on the 10th is a single day's 20.00
        // while the daily limit is 40.00.
        let t = BudgetTimeline::new(vec![new_budget_change(
            ID,
            Decimal::ZERO,
            dec!(20.00),
            datetime!(2025-03-10 0:00 UTC),
        )]);
        for seed in 0..20 {
            let store = MemoryStore::new();
            let out = run(
                &store,
                &t,
                SynthesisSettings::default(),
                DayBudget::Active(dec!(20.00)),
                seed,
            );
            let total: Decimal = out.events.iter().map(|e| e.amount).sum();
            assert!(total <= dec!(20.00), "seed {seed}: total {total}");
        }
    }

    #[test]
    fn full_band_exhausts_in_one_draw() {
        let t = timeline(dec!(10.00));
        let store = MemoryStore::new();
        let settings = SynthesisSettings {
            min_events: 5,
            max_events: 5,
            min_amount_fraction: Decimal::ONE,
        };
        let out = run(&store, &t, settings, DayBudget::Active(dec!(10.00)), 3);
        // Daily 20.00 is below the monthly 100.00, so the first draw takes all of it.
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].amount, dec!(20.00));
        assert_eq!(out.state, DayState::Exhausted);
    }

    #[test]
    fn event_range_is_never_empty() {
        let range = |min_events, max_events| {
            SynthesisSettings {
                min_events,
                max_events,
                ..SynthesisSettings::default()
            }
            .event_range()
        };
        assert_eq!(range(1, 10), 1..=10);
        assert_eq!(range(0, 0), 1..=1);
        assert_eq!(range(0, 4), 1..=4);
        assert_eq!(range(5, 2), 5..=5);
    }

    #[test]
    fn degenerate_counts_still_draw() {
        let t = timeline(dec!(150.00));
        let zero = SynthesisSettings {
            min_events: 0,
            max_events: 0,
            ..SynthesisSettings::default()
        };
        let inverted = SynthesisSettings {
            min_events: 5,
            max_events: 2,
            ..SynthesisSettings::default()
        };
        for seed in 0..10 {
            let out = run(&MemoryStore::new(), &t, zero, DayBudget::Active(dec!(150.00)), seed);
            assert_eq!(out.events.len(), 1, "seed {seed}");
            let out = run(&MemoryStore::new(), &t, inverted, DayBudget::Active(dec!(150.00)), seed);
            assert!((1..=5).contains(&out.events.len()), "seed {seed}");
        }
    }

    #[test]
    fn monthly_pool_leaves_room_for_later_days() {
        // Through the 10th the month allows 200.00 with 100.00 spent, and the day
        // allows 40.00. The 11th already holds 110.00, so through the 11th only 10.00
        // of its 220.00 is left, and that bounds the 10th too.
        let t = timeline(dec!(20.00));
        for seed in 0..20 {
            let store = MemoryStore::new();
            for (amount, at) in [
                (dec!(100.00), datetime!(2025-03-09 12:00 UTC)),
                (dec!(110.00), datetime!(2025-03-11 12:00 UTC)),
            ] {
                store
                    .insert(&new_spend_event(ID, amount, at, dec!(20.00), dec!(40.00)))
                    .unwrap();
            }
            let out = run(
                &store,
                &t,
                SynthesisSettings::default(),
                DayBudget::Active(dec!(20.00)),
                seed,
            );
            let added: Decimal = out.events.iter().map(|e| e.amount).sum();
            assert!(added <= dec!(10.00), "seed {seed}: added {added}");
        }
    }

    #[test]
    fn same_seed_same_amounts() {
        let t = timeline(dec!(150.00));
        let a = run(
            &MemoryStore::new(),
            &t,
            SynthesisSettings::default(),
            DayBudget::Active(dec!(150.00)),
            42,
        );
        let b = run(
            &MemoryStore::new(),
            &t,
            SynthesisSettings::default(),
            DayBudget::Active(dec!(150.00)),
            42,
        );
        let amounts = |s: &DaySynthesis| -> Vec<(OffsetDateTime, Decimal)> {
            s.events.iter().map(|e| (e.occurred_at, e.amount)).collect()
        };
        assert_eq!(amounts(&a), amounts(&b));
    }

    #[test]
    fn instants_stay_in_clamped_window() {
        let mut rng = StdRng::seed_from_u64(9);
        let window = DayWindow {
            start: datetime!(2025-03-10 12:00 UTC),
            end: datetime!(2025-03-10 12:00:05 UTC),
        };
        let instants = draw_instants(&mut rng, window, 50);
        assert!(instants.len() <= 6);
        assert!(instants.iter().all(|t| *t >= window.start && *t <= window.end));

        let single = DayWindow {
            start: window.start,
            end: window.start,
        };
        assert_eq!(draw_instants(&mut rng, single, 4).len(), 1);
    }
}
