//! Process-local store implementing both collaborator traits.

use adspend_core::{BudgetChange, Campaign, CampaignId, CostLedger, SpendEvent, TimelineReader};
use rust_decimal::Decimal;
use std::cell::RefCell;
use time::OffsetDateTime;

#[derive(Debug, Default)]
pub struct MemoryStore {
    campaigns: RefCell<Vec<Campaign>>,
    changes: RefCell<Vec<BudgetChange>>,
    costs: RefCell<Vec<SpendEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_campaign(&self, campaign: Campaign) {
        self.campaigns.borrow_mut().push(campaign);
    }

    pub fn add_change(&self, change: BudgetChange) {
        self.changes.borrow_mut().push(change);
    }

    /// Snapshot of stored costs for one campaign, in insertion order.
    pub fn costs(&self, id: CampaignId) -> Vec<SpendEvent> {
        self.costs
            .borrow()
            .iter()
            .filter(|e| e.campaign_id == id)
            .cloned()
            .collect()
    }
}

impl TimelineReader for MemoryStore {
    fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>> {
        Ok(self.campaigns.borrow().iter().find(|c| c.id == id).cloned())
    }

    fn load_budget_history(
        &self,
        id: CampaignId,
        up_to: OffsetDateTime,
    ) -> anyhow::Result<Vec<BudgetChange>> {
        let mut out: Vec<_> = self
            .changes
            .borrow()
            .iter()
            .filter(|c| c.campaign_id == id && c.effective_at <= up_to)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.effective_at);
        Ok(out)
    }
}

impl CostLedger for MemoryStore {
    fn sum_amount(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Decimal> {
        Ok(self
            .costs
            .borrow()
            .iter()
            .filter(|e| e.campaign_id == id && e.occurred_at >= start && e.occurred_at <= end)
            .map(|e| e.amount)
            .sum())
    }

    fn insert(&self, event: &SpendEvent) -> anyhow::Result<()> {
        self.costs.borrow_mut().push(event.clone());
        Ok(())
    }

    fn delete_range(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<usize> {
        let mut costs = self.costs.borrow_mut();
        let before = costs.len();
        costs.retain(|e| {
            !(e.campaign_id == id && e.occurred_at >= start && e.occurred_at <= end)
        });
        Ok(before - costs.len())
    }
}
