use crate::timeargs::start_arg;
use adspend_core::clock::{format_instant, now_utc};
use adspend_core::money::parse_money;
use adspend_core::{Campaign, CampaignId};
use adspend_ledger::Ledger;
use clap::Subcommand;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum CampaignCmd {
    /// Create a campaign with an opening daily budget
    Create {
        #[arg(long)]
        name: String,
        /// Daily budget, e.g. 150 or 150.00
        #[arg(long)]
        budget: String,
        /// When the campaign starts (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// List campaigns
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a campaign and its latest budget changes
    Show { campaign: CampaignId },
}

// ── Dispatch ──

pub fn run(cmd: CampaignCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        CampaignCmd::Create { name, budget, at } => create(repo_root, &name, &budget, at.as_deref()),
        CampaignCmd::List { json } => list(repo_root, json),
        CampaignCmd::Show { campaign } => show(repo_root, campaign),
    }
}

// ── Command Implementations ──

fn create(repo_root: &Path, name: &str, budget: &str, at: Option<&str>) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("campaign name must not be empty");
    }
    let ledger = Ledger::open(repo_root)?;
    let budget = parse_money(budget)?;
    let at = start_arg(at, now_utc())?;
    let campaign = ledger.store.create_campaign(name, budget, at)?;
    println!(
        "Created campaign {} \"{}\" with budget {}",
        campaign.id, campaign.name, campaign.current_budget
    );
    Ok(())
}

fn list(repo_root: &Path, json: bool) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let campaigns = ledger.store.list_campaigns()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&campaigns)?);
        return Ok(());
    }
    if campaigns.is_empty() {
        println!("No campaigns. Create one with `adspend campaign create`.");
        return Ok(());
    }
    println!("{:<5} {:<30} {:>12} {:<8} CREATED", "ID", "NAME", "BUDGET", "STATUS");
    for c in &campaigns {
        print_campaign_line(c);
    }
    Ok(())
}

fn show(repo_root: &Path, id: CampaignId) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let campaign = ledger
        .store
        .find_campaign(id)?
        .ok_or_else(|| anyhow::anyhow!("campaign {id} not found"))?;

    println!("Campaign {}: {}", campaign.id, campaign.name);
    println!("  status:       {}", status(&campaign));
    println!("  budget:       {}", campaign.current_budget);
    println!("  daily limit:  {}", campaign.current_budget * rust_decimal::Decimal::TWO);
    println!("  created:      {}", format_instant(campaign.created_at));
    println!("  costs stored: {}", ledger.store.count_costs(id)?);

    let history = ledger.store.budget_history(id, None, None)?;
    if !history.is_empty() {
        println!("  recent budget changes:");
        for change in history.iter().take(5) {
            println!(
                "    {}  {:>10} -> {:<10}",
                format_instant(change.effective_at),
                change.previous_value,
                change.new_value
            );
        }
    }
    Ok(())
}

fn status(c: &Campaign) -> &'static str {
    if c.is_paused() {
        "paused"
    } else {
        "active"
    }
}

fn print_campaign_line(c: &Campaign) {
    let name = if c.name.len() > 30 {
        format!("{}...", c.name.chars().take(27).collect::<String>())
    } else {
        c.name.clone()
    };
    println!(
        "{:<5} {:<30} {:>12} {:<8} {}",
        c.id,
        name,
        c.current_budget,
        status(c),
        format_instant(c.created_at)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use adspend_ledger::{init_workspace, AdspendPaths};
    use rust_decimal_macros::dec;

    #[test]
    fn create_then_list() {
        let tmp = tempfile::tempdir().unwrap();
        init_workspace(&AdspendPaths::discover(tmp.path())).unwrap();
        create(tmp.path(), "Launch", "120.5", Some("2025-01-01")).unwrap();
        list(tmp.path(), true).unwrap();

        let ledger = Ledger::open(tmp.path()).unwrap();
        let all = ledger.store.list_campaigns().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].current_budget, dec!(120.50));
        show(tmp.path(), all[0].id).unwrap();
    }

    #[test]
    fn create_rejects_bad_input() {
        let tmp = tempfile::tempdir().unwrap();
        init_workspace(&AdspendPaths::discover(tmp.path())).unwrap();
        assert!(create(tmp.path(), "  ", "10", None).is_err());
        assert!(create(tmp.path(), "x", "-1", None).is_err());
        assert!(create(tmp.path(), "x", "abc", None).is_err());
        assert!(show(tmp.path(), CampaignId(1)).is_err());
    }
}
