use crate::timeargs::{end_arg, start_arg};
use adspend_core::clock::{format_instant, months_before, now_utc, parse_instant, DayBound};
use adspend_core::CampaignId;
use adspend_engine::{DayState, GenerationError, GenerationOrchestrator, SynthesisSettings};
use adspend_ledger::{CampaignLock, Ledger, QuotaDecision, RunQuota, SimConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

pub struct GenerateParams<'a> {
    pub repo_root: &'a Path,
    pub campaign: Option<CampaignId>,
    pub all: bool,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub seed: Option<u64>,
}

fn settings(cfg: &SimConfig) -> SynthesisSettings {
    SynthesisSettings {
        min_events: cfg.min_events_per_day,
        max_events: cfg.max_events_per_day,
        min_amount_fraction: cfg.min_amount_fraction,
    }
}

pub fn execute(params: &GenerateParams<'_>) -> anyhow::Result<()> {
    let ledger = Ledger::open(params.repo_root)?;
    let cfg = ledger.config()?;
    let now = now_utc();
    let start = start_arg(params.from, months_before(now, cfg.default_lookback_months)?)?;
    let end = end_arg(params.to, now)?;

    let targets: Vec<CampaignId> = match (params.campaign, params.all) {
        (Some(id), _) => vec![id],
        (None, true) => ledger.store.list_campaigns()?.into_iter().map(|c| c.id).collect(),
        (None, false) => anyhow::bail!("specify a campaign id or --all"),
    };
    if targets.is_empty() {
        println!("No campaigns to generate for.");
        return Ok(());
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let orch = GenerationOrchestrator::new(&ledger.store, &ledger.store, settings(&cfg));

    println!(
        "Generating costs from {} to {}",
        format_instant(start),
        format_instant(end)
    );
    let mut total = 0;
    for id in targets {
        let _lock = CampaignLock::acquire(&ledger.paths, id)?;

        if let Some(limit) = cfg.max_runs_per_day {
            let quota = RunQuota::new(&ledger.store, limit, cfg.run_window_secs);
            if let QuotaDecision::Denied { limit, resets_at } =
                quota.try_acquire(&format!("generate:{id}"), now)?
            {
                tracing::warn!(campaign = %id, limit, "generation refused by run quota");
                println!(
                    "  campaign {id}: skipped, {limit} runs already used (window resets {})",
                    format_instant(resets_at)
                );
                continue;
            }
        }

        match orch.generate_for_period(id, start, end, &mut rng) {
            Ok(report) => {
                println!(
                    "  campaign {id}: {} costs over {} days ({} paused, {} not started, {} exhausted)",
                    report.events_created(),
                    report.days.len(),
                    report.days_in(DayState::Zeroed),
                    report.days_in(DayState::Skipped),
                    report.days_in(DayState::Exhausted),
                );
                total += report.events_created();
            }
            Err(GenerationError::Storage {
                day,
                generated,
                source,
            }) => {
                anyhow::bail!(
                    "campaign {id}: generation stopped on {day} after {generated} costs \
                     ({total} from earlier campaigns kept): {source:#}"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!("Total: {total} costs generated");
    Ok(())
}

/// `adspend clear <id> --from --to`
pub fn clear(repo_root: &Path, id: CampaignId, from: &str, to: &str) -> anyhow::Result<()> {
    let ledger = Ledger::open(repo_root)?;
    let start = parse_instant(from, DayBound::Start)?;
    let end = parse_instant(to, DayBound::End)?;
    let _lock = CampaignLock::acquire(&ledger.paths, id)?;

    let cfg = ledger.config()?;
    let orch = GenerationOrchestrator::new(&ledger.store, &ledger.store, settings(&cfg));
    let deleted = orch.clear_for_period(id, start, end)?;
    println!(
        "Campaign {id}: deleted {deleted} costs between {} and {}",
        format_instant(start),
        format_instant(end)
    );
    Ok(())
}
