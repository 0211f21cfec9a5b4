use crate::clock::truncate_to_second;
use crate::types::{BudgetChange, CampaignId, SpendEvent, CHANGE_ID_PREFIX, COST_ID_PREFIX};
use rust_decimal::Decimal;
use time::OffsetDateTime;

fn new_record_id(prefix: &str) -> String {
    format!("{prefix}_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Create a budget change entry.
pub fn new_budget_change(
    campaign_id: CampaignId,
    previous_value: Decimal,
    new_value: Decimal,
    effective_at: OffsetDateTime,
) -> BudgetChange {
    BudgetChange {
        change_id: new_record_id(CHANGE_ID_PREFIX),
        campaign_id,
        previous_value,
        new_value,
        effective_at: truncate_to_second(effective_at),
    }
}

/// Create a cost record with the constraints it was generated under.
pub fn new_spend_event(
    campaign_id: CampaignId,
    amount: Decimal,
    occurred_at: OffsetDateTime,
    budget_in_effect: Decimal,
    daily_limit_in_effect: Decimal,
) -> SpendEvent {
    SpendEvent {
        cost_id: new_record_id(COST_ID_PREFIX),
        campaign_id,
        amount,
        occurred_at: truncate_to_second(occurred_at),
        budget_in_effect,
        daily_limit_in_effect,
    }
}

/// The single record written for a day the campaign was explicitly paused.
pub fn new_zero_marker(campaign_id: CampaignId, at: OffsetDateTime) -> SpendEvent {
    new_spend_event(campaign_id, Decimal::ZERO, at, Decimal::ZERO, Decimal::ZERO)
}
