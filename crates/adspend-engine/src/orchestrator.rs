//! Drives a campaign's generation over a period, one UTC day at a time.
//!
//! Each day is synthesized against the ledger's current totals and persisted as a
//! single batch before the next day starts, so later days see earlier ones. A
//! failure stops the run; days already written stay written.

use crate::error::GenerationError;
use crate::synthesizer::{DayState, DayWindow, EventSynthesizer, SynthesisSettings};
use adspend_core::capacity::CapacityCalculator;
use adspend_core::clock::{
    days_between, days_to_month_end, end_of_day, start_of_day, truncate_to_second, utc_date,
};
use adspend_core::{BudgetTimeline, CampaignId, CostLedger, TimelineReader};
use rand::Rng;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayOutcome {
    pub date: Date,
    pub window: DayWindow,
    pub state: DayState,
    pub created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub campaign: CampaignId,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub days: Vec<DayOutcome>,
}

impl GenerationReport {
    /// Events written across the period.
    pub fn events_created(&self) -> usize {
        self.days.iter().map(|d| d.created).sum()
    }

    pub fn days_in(&self, state: DayState) -> usize {
        self.days.iter().filter(|d| d.state == state).count()
    }
}

pub struct GenerationOrchestrator<'a> {
    timelines: &'a dyn TimelineReader,
    ledger: &'a dyn CostLedger,
    synthesizer: EventSynthesizer,
}

impl<'a> GenerationOrchestrator<'a> {
    pub fn new(
        timelines: &'a dyn TimelineReader,
        ledger: &'a dyn CostLedger,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            timelines,
            ledger,
            synthesizer: EventSynthesizer::new(settings),
        }
    }

    /// Generate spend for every day intersecting `[start, end]`.
    ///
    /// Reruns are additive: capacity used by earlier runs is read back from the
    /// ledger, so an exhausted day gains nothing and topping up an earlier day never
    /// pushes a later day past its monthly limit. Paused days gain another zero
    /// marker on each run; use [`Self::clear_for_period`] first for a clean rerun.
    pub fn generate_for_period<R: Rng + ?Sized>(
        &self,
        campaign: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
        rng: &mut R,
    ) -> Result<GenerationReport, GenerationError> {
        let (start, end) = validate_period(start, end)?;
        let first_day = utc_date(start);
        self.require_campaign(campaign, first_day)?;

        // Monthly pools look ahead to the end of each day's month.
        let horizon = days_to_month_end(utc_date(end)).last().map_or(end, end_of_day);
        let history = self
            .timelines
            .load_budget_history(campaign, horizon)
            .map_err(|source| GenerationError::Storage {
                day: first_day,
                generated: 0,
                source,
            })?;
        let timeline = BudgetTimeline::new(history);
        let calc = CapacityCalculator::new(&timeline);

        let mut report = GenerationReport {
            campaign,
            start,
            end,
            days: Vec::new(),
        };

        for date in days_between(first_day, utc_date(end)) {
            let window = DayWindow {
                start: start.max(start_of_day(date)),
                end: end.min(end_of_day(date)),
            };
            let budget = calc.day_budget(window.start);
            let generated = report.events_created();
            let fail = |source: anyhow::Error| {
                tracing::warn!(%campaign, %date, generated, error = %source, "generation aborted");
                GenerationError::Storage {
                    day: date,
                    generated,
                    source,
                }
            };

            let day = self
                .synthesizer
                .synthesize(rng, &calc, self.ledger, campaign, budget, window)
                .map_err(fail)?;
            if !day.events.is_empty() {
                self.ledger.insert_batch(&day.events).map_err(fail)?;
            }

            tracing::debug!(
                %campaign,
                %date,
                ?budget,
                state = day.state.as_str(),
                created = day.events.len(),
                "day generated"
            );
            report.days.push(DayOutcome {
                date,
                window,
                state: day.state,
                created: day.events.len(),
            });
        }

        tracing::info!(
            %campaign,
            start = %start,
            end = %end,
            days = report.days.len(),
            created = report.events_created(),
            "generation finished"
        );
        Ok(report)
    }

    /// Delete the campaign's records in `[start, end]`. Returns how many were removed.
    pub fn clear_for_period(
        &self,
        campaign: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<usize, GenerationError> {
        let (start, end) = validate_period(start, end)?;
        let first_day = utc_date(start);
        self.require_campaign(campaign, first_day)?;

        let deleted = self
            .ledger
            .delete_range(campaign, start, end)
            .map_err(|source| GenerationError::Storage {
                day: first_day,
                generated: 0,
                source,
            })?;
        tracing::info!(%campaign, start = %start, end = %end, deleted, "costs cleared");
        Ok(deleted)
    }

    fn require_campaign(&self, campaign: CampaignId, day: Date) -> Result<(), GenerationError> {
        match self.timelines.find_campaign(campaign) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(GenerationError::UnknownCampaign(campaign)),
            Err(source) => Err(GenerationError::Storage {
                day,
                generated: 0,
                source,
            }),
        }
    }
}

fn validate_period(
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<(OffsetDateTime, OffsetDateTime), GenerationError> {
    let (start, end) = (truncate_to_second(start), truncate_to_second(end));
    if end < start {
        return Err(GenerationError::InvalidPeriod { start, end });
    }
    Ok((start, end))
}
