//! Storage collaborators consumed by the generation engine.

use crate::types::{BudgetChange, Campaign, CampaignId, SpendEvent};
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// Read access to campaigns and their budget change logs.
pub trait TimelineReader {
    fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>>;

    /// Every change with `effective_at <= up_to`, ascending by `effective_at`.
    fn load_budget_history(
        &self,
        id: CampaignId,
        up_to: OffsetDateTime,
    ) -> anyhow::Result<Vec<BudgetChange>>;
}

/// The persisted cost ledger. Ranges are inclusive on both ends.
pub trait CostLedger {
    fn sum_amount(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Decimal>;

    fn insert(&self, event: &SpendEvent) -> anyhow::Result<()>;

    /// Insert a day's records. Stores that can should make this atomic.
    fn insert_batch(&self, events: &[SpendEvent]) -> anyhow::Result<()> {
        for event in events {
            self.insert(event)?;
        }
        Ok(())
    }

    fn delete_range(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<usize>;
}
