use crate::timeargs::end_arg;
use adspend_core::clock::{months_before, now_utc};
use adspend_core::{Campaign, CampaignId};
use adspend_ledger::{Ledger, SqliteStore};
use rust_decimal::Decimal;
use std::path::Path;
use time::{Duration, OffsetDateTime};

/// Offset back from "now": whole months, then days.
#[derive(Clone, Copy)]
struct Ago(u32, i64);

enum Step {
    Set(Ago, Decimal),
    Pause(Ago),
    Resume(Ago, Decimal),
}

struct Demo {
    name: &'static str,
    opened: Ago,
    budget: Decimal,
    steps: Vec<Step>,
}

fn cents(c: i64) -> Decimal {
    Decimal::new(c, 2)
}

fn demos() -> Vec<Demo> {
    vec![
        Demo {
            name: "Stable Budget Campaign",
            opened: Ago(3, 0),
            budget: cents(15_000),
            steps: vec![],
        },
        Demo {
            name: "Dynamic Budget Campaign",
            opened: Ago(3, 0),
            budget: cents(10_000),
            steps: vec![
                Step::Set(Ago(2, 15), cents(20_000)),
                Step::Set(Ago(2, 0), cents(15_000)),
                Step::Set(Ago(1, 10), cents(30_000)),
                Step::Set(Ago(1, 0), cents(20_000)),
                Step::Set(Ago(0, 15), cents(25_000)),
            ],
        },
        Demo {
            name: "Pause/Resume Campaign",
            opened: Ago(3, 0),
            budget: cents(20_000),
            steps: vec![
                Step::Pause(Ago(2, 20)),
                Step::Resume(Ago(2, 10), cents(15_000)),
                Step::Pause(Ago(1, 5)),
                Step::Resume(Ago(0, 20), cents(18_000)),
            ],
        },
    ]
}

fn instant(now: OffsetDateTime, ago: Ago) -> anyhow::Result<OffsetDateTime> {
    Ok(months_before(now, ago.0)? - Duration::days(ago.1))
}

fn seed_one(store: &SqliteStore, demo: &Demo, now: OffsetDateTime) -> anyhow::Result<Campaign> {
    let id = store
        .create_campaign(demo.name, demo.budget, instant(now, demo.opened)?)?
        .id;
    for step in &demo.steps {
        match *step {
            Step::Set(ago, value) => {
                store.set_budget(id, value, instant(now, ago)?)?;
            }
            Step::Pause(ago) => {
                store.pause(id, instant(now, ago)?)?;
            }
            Step::Resume(ago, value) => {
                store.resume(id, Some(value), value, instant(now, ago)?)?;
            }
        }
    }
    store
        .find_campaign(id)?
        .ok_or_else(|| anyhow::anyhow!("campaign {id} vanished while seeding"))
}

/// `adspend seed [--now <instant>]`
pub fn execute(repo_root: &Path, now: Option<&str>) -> anyhow::Result<Vec<CampaignId>> {
    let ledger = Ledger::open(repo_root)?;
    let now = end_arg(now, now_utc())?;

    println!("Creating campaigns with 3-month budget history...");
    let mut ids = Vec::new();
    for demo in demos() {
        let campaign = seed_one(&ledger.store, &demo, now)?;
        let changes = ledger.store.budget_history(campaign.id, None, None)?.len();
        tracing::info!(campaign = %campaign.id, changes, "seeded demo campaign");
        println!(
            "  Created: {} (ID: {}) - {} budget changes, budget now {}",
            campaign.name, campaign.id, changes, campaign.current_budget
        );
        ids.push(campaign.id);
    }
    println!();
    println!("Generate spend for them with `adspend generate --all`.");
    Ok(ids)
}
