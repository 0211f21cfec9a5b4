mod cmd_budget;
mod cmd_campaign;
mod cmd_config;
mod cmd_generate;
mod cmd_init;
mod cmd_report;
mod cmd_seed;
mod timeargs;

use adspend_core::CampaignId;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "adspend", version, about = "Campaign budgets and simulated ad spend")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .adspend/ workspace
    Init,
    /// Campaign operations (create, list, show)
    Campaign {
        #[command(subcommand)]
        cmd: cmd_campaign::CampaignCmd,
    },
    /// Budget operations (set, pause, resume, history)
    Budget {
        #[command(subcommand)]
        cmd: cmd_budget::BudgetCmd,
    },
    /// Generate simulated costs over a period
    Generate {
        /// Campaign id (omit with --all)
        campaign: Option<CampaignId>,
        /// Generate for every campaign
        #[arg(long, conflicts_with = "campaign")]
        all: bool,
        /// Period start (RFC 3339 or YYYY-MM-DD); defaults to the configured lookback
        #[arg(long)]
        from: Option<String>,
        /// Period end; a bare date means the end of that day. Defaults to now
        #[arg(long)]
        to: Option<String>,
        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Delete a campaign's costs in a period
    Clear {
        campaign: CampaignId,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// List stored costs, newest first
    Costs {
        campaign: CampaignId,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Maximum number of costs to show (0 = unlimited)
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Per-day totals, limits, and utilization
    Summary {
        campaign: CampaignId,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Spend statistics against daily and monthly limits
    Stats {
        campaign: CampaignId,
        /// today, week, month or custom
        #[arg(long, default_value = "today")]
        period: String,
        /// Start of a custom period
        #[arg(long)]
        from: Option<String>,
        /// End of a custom period
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Workspace configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Create three demo campaigns with three months of budget history
    Seed {
        /// Anchor instant for the history (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },
}

/// Structured logs go to stderr; stdout stays clean for `--json`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let repo_root = adspend_ledger::AdspendPaths::find_root(&cwd).unwrap_or(cwd);

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Campaign { cmd } => cmd_campaign::run(cmd, &repo_root),
        Command::Budget { cmd } => cmd_budget::run(cmd, &repo_root),
        Command::Generate {
            campaign,
            all,
            from,
            to,
            seed,
        } => cmd_generate::execute(&cmd_generate::GenerateParams {
            repo_root: &repo_root,
            campaign,
            all,
            from: from.as_deref(),
            to: to.as_deref(),
            seed,
        }),
        Command::Clear { campaign, from, to } => {
            cmd_generate::clear(&repo_root, campaign, &from, &to)
        }
        Command::Costs {
            campaign,
            from,
            to,
            limit,
            json,
        } => cmd_report::costs(&cmd_report::ReportParams {
            repo_root: &repo_root,
            campaign,
            from: from.as_deref(),
            to: to.as_deref(),
            limit,
            json,
        }),
        Command::Summary {
            campaign,
            from,
            to,
            json,
        } => cmd_report::summary(&cmd_report::ReportParams {
            repo_root: &repo_root,
            campaign,
            from: from.as_deref(),
            to: to.as_deref(),
            limit: 0,
            json,
        }),
        Command::Stats {
            campaign,
            period,
            from,
            to,
            json,
        } => cmd_report::stats(
            &cmd_report::ReportParams {
                repo_root: &repo_root,
                campaign,
                from: from.as_deref(),
                to: to.as_deref(),
                limit: 0,
                json,
            },
            &period,
        ),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
        Command::Seed { now } => cmd_seed::execute(&repo_root, now.as_deref()).map(|_| ()),
    }
}
