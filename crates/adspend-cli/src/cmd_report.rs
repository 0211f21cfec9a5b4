use crate::timeargs::{end_arg, start_arg};
use adspend_aggregate::{daily_summary, statistics, Period};
use adspend_core::clock::{format_instant, months_before, now_utc, start_of_day, start_of_month, utc_date};
use adspend_core::{BudgetTimeline, Campaign, CampaignId, TimelineReader};
use adspend_ledger::Ledger;
use std::path::Path;

pub struct ReportParams<'a> {
    pub repo_root: &'a Path,
    pub campaign: CampaignId,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub limit: usize,
    pub json: bool,
}

fn require_campaign(ledger: &Ledger, id: CampaignId) -> anyhow::Result<Campaign> {
    ledger
        .store
        .find_campaign(id)?
        .ok_or_else(|| anyhow::anyhow!("campaign {id} not found"))
}

/// `adspend costs <id>`
pub fn costs(params: &ReportParams<'_>) -> anyhow::Result<()> {
    let ledger = Ledger::open(params.repo_root)?;
    let cfg = ledger.config()?;
    let id = require_campaign(&ledger, params.campaign)?.id;
    let now = now_utc();
    let from = start_arg(params.from, months_before(now, cfg.default_lookback_months)?)?;
    let to = end_arg(params.to, now)?;

    let mut costs = ledger.store.costs_in_range(id, from, to)?;
    costs.reverse(); // newest first
    if params.limit > 0 {
        costs.truncate(params.limit);
    }

    if params.json {
        for c in &costs {
            println!("{}", serde_json::to_string(c)?);
        }
        return Ok(());
    }
    if costs.is_empty() {
        println!("No costs in range.");
        return Ok(());
    }
    for c in &costs {
        let flag = if c.is_zero_marker() {
            "  paused"
        } else if c.exceeded_daily_limit() {
            "  over limit"
        } else if c.exceeded_budget() {
            "  over budget"
        } else {
            ""
        };
        println!(
            "[{}] {:>10}  budget {:>10}  limit {:>10}  {:>6}%{flag}",
            format_instant(c.occurred_at),
            c.amount,
            c.budget_in_effect,
            c.daily_limit_in_effect,
            c.daily_utilization()
        );
    }
    println!("\n({} costs shown)", costs.len());
    Ok(())
}

/// `adspend summary <id>`
pub fn summary(params: &ReportParams<'_>) -> anyhow::Result<()> {
    let ledger = Ledger::open(params.repo_root)?;
    let id = require_campaign(&ledger, params.campaign)?.id;
    let now = now_utc();
    let from = start_arg(params.from, months_before(now, 1)?)?;
    let to = end_arg(params.to, now)?;

    let costs = ledger.store.costs_in_range(id, from, to)?;
    let rows = daily_summary(&costs, from, to);

    if params.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No costs in range.");
        return Ok(());
    }
    println!(
        "{:<10} {:>6} {:>12} {:>12} {:>12} {:>8}",
        "DATE", "COUNT", "TOTAL", "LIMIT", "MAX BUDGET", "UTIL%"
    );
    for r in &rows {
        println!(
            "{:<10} {:>6} {:>12} {:>12} {:>12} {:>8}",
            r.date.to_string(),
            r.cost_count,
            r.total_cost,
            r.daily_limit,
            r.max_budget,
            r.utilization
        );
    }
    Ok(())
}

/// `adspend stats <id>`
pub fn stats(params: &ReportParams<'_>, period: &str) -> anyhow::Result<()> {
    let ledger = Ledger::open(params.repo_root)?;
    let campaign = require_campaign(&ledger, params.campaign)?;
    let now = now_utc();

    let mut period: Period = period.parse()?;
    if let Period::Custom { from, to } = &mut period {
        *from = params.from.map(|f| start_arg(Some(f), now)).transpose()?;
        *to = params.to.map(|t| end_arg(Some(t), now)).transpose()?;
    } else if params.from.is_some() || params.to.is_some() {
        anyhow::bail!("--from/--to only apply to --period custom");
    }

    let (period_start, period_end) = period.resolve(now)?;
    let range_start = period_start.min(start_of_day(start_of_month(utc_date(now))));
    let range_end = period_end.max(now);
    let costs = ledger.store.costs_in_range(campaign.id, range_start, range_end)?;
    let timeline = BudgetTimeline::new(ledger.store.load_budget_history(campaign.id, now)?);
    let s = statistics(&campaign, &costs, &timeline, period, now)?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }
    println!("Campaign {}: {} ({})", campaign.id, campaign.name, s.period);
    println!(
        "  period:     {} .. {}",
        format_instant(s.period_start),
        format_instant(s.period_end)
    );
    println!(
        "  today:      {} spent of {} limit ({} remaining, budget {})",
        s.daily_spent, s.daily_limit, s.daily_remaining, s.daily_budget
    );
    println!(
        "  this month: {} spent of {} limit ({} remaining)",
        s.monthly_spent, s.monthly_limit, s.monthly_remaining
    );
    println!(
        "  period:     {} spent over {} costs (average {})",
        s.period_spent, s.period_costs_count, s.average_cost
    );
    if !s.cost_trend.is_empty() {
        println!("  trend:");
        for p in &s.cost_trend {
            println!("    {}  {:>12}", p.date, p.total);
        }
    }
    Ok(())
}
