use crate::timeargs::{end_arg, start_arg};
use adspend_core::clock::{format_instant, now_utc};
use adspend_core::money::parse_money;
use adspend_core::CampaignId;
use adspend_ledger::Ledger;
use clap::Subcommand;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum BudgetCmd {
    /// Change a campaign's daily budget
    Set {
        campaign: CampaignId,
        value: String,
        /// When the change takes effect (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Pause: budget to zero, campaign inactive
    Pause {
        campaign: CampaignId,
        #[arg(long)]
        at: Option<String>,
    },
    /// Resume with a budget, else the last non-zero one
    Resume {
        campaign: CampaignId,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Budget change log, newest first
    History {
        campaign: CampaignId,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

// ── Dispatch ──

pub fn run(cmd: BudgetCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        BudgetCmd::Set {
            campaign,
            value,
            at,
        } => set(repo_root, campaign, &value, at.as_deref()),
        BudgetCmd::Pause { campaign, at } => pause(repo_root, campaign, at.as_deref()),
        BudgetCmd::Resume {
            campaign,
            budget,
            at,
        } => resume(repo_root, campaign, budget.as_deref(), at.as_deref()),
        BudgetCmd::History {
            campaign,
            from,
            to,
            json,
        } => history(repo_root, campaign, from.as_deref(), to.as_deref(), json),
    }
}

// ── Command Implementations ──

fn set(repo_root: &Path, id: CampaignId, value: &str, at: Option<&str>) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let value = parse_money(value)?;
    let at = start_arg(at, now_utc())?;
    match ledger.store.set_budget(id, value, at)? {
        Some(change) => println!(
            "Campaign {id}: budget {} -> {} at {}",
            change.previous_value,
            change.new_value,
            format_instant(change.effective_at)
        ),
        None => println!("Campaign {id}: budget already {value}, nothing recorded"),
    }
    Ok(())
}

fn pause(repo_root: &Path, id: CampaignId, at: Option<&str>) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let at = start_arg(at, now_utc())?;
    ledger.store.pause(id, at)?;
    println!("Campaign {id}: paused at {}", format_instant(at));
    Ok(())
}

fn resume(
    repo_root: &Path,
    id: CampaignId,
    budget: Option<&str>,
    at: Option<&str>,
) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let cfg = ledger.config()?;
    let budget = budget.map(parse_money).transpose()?;
    let at = start_arg(at, now_utc())?;
    let campaign = ledger
        .store
        .resume(id, budget, cfg.default_resume_budget, at)?;
    println!(
        "Campaign {id}: resumed with budget {} at {}",
        campaign.current_budget,
        format_instant(at)
    );
    Ok(())
}

fn history(
    repo_root: &Path,
    id: CampaignId,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    if ledger.store.find_campaign(id)?.is_none() {
        anyhow::bail!("campaign {id} not found");
    }
    let from = from.map(|f| start_arg(Some(f), now_utc())).transpose()?;
    let to = to.map(|t| end_arg(Some(t), now_utc())).transpose()?;
    let changes = ledger.store.budget_history(id, from, to)?;

    if json {
        for c in &changes {
            println!("{}", serde_json::to_string(c)?);
        }
        return Ok(());
    }
    if changes.is_empty() {
        println!("No budget changes in range.");
        return Ok(());
    }
    for c in &changes {
        let arrow = if c.was_increased() {
            "up"
        } else if c.was_decreased() {
            "down"
        } else {
            "same"
        };
        println!(
            "[{}] {:>10} -> {:<10} {:<4} ({:+})",
            format_instant(c.effective_at),
            c.previous_value,
            c.new_value,
            arrow,
            c.delta()
        );
    }
    println!("\n({} changes shown)", changes.len());
    Ok(())
}
