//! SQLite-backed storage for campaigns, budget changes, and the cost ledger.
//!
//! Money is kept as integer cents so sums are exact. Instants are fixed-width UTC
//! text, so range predicates compare lexicographically.

use adspend_core::clock::{format_instant, parse_stored};
use adspend_core::event::new_budget_change;
use adspend_core::money::{from_cents, to_cents, validate_budget};
use adspend_core::{BudgetChange, Campaign, CampaignId, CostLedger, SpendEvent, TimelineReader};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use std::path::Path;
use time::OffsetDateTime;

const SCHEMA_SQL: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    current_budget_cents INTEGER NOT NULL DEFAULT 0 CHECK (current_budget_cents >= 0),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS budget_changes (
    rowid INTEGER PRIMARY KEY,
    change_id TEXT UNIQUE NOT NULL,
    campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
    previous_cents INTEGER NOT NULL,
    new_cents INTEGER NOT NULL CHECK (new_cents >= 0),
    effective_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_budget_changes_campaign_at ON budget_changes(campaign_id, effective_at);

CREATE TABLE IF NOT EXISTS costs (
    rowid INTEGER PRIMARY KEY,
    cost_id TEXT UNIQUE NOT NULL,
    campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
    amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
    occurred_at TEXT NOT NULL,
    budget_cents INTEGER NOT NULL,
    daily_limit_cents INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_costs_campaign_at ON costs(campaign_id, occurred_at);

CREATE TABLE IF NOT EXISTS run_quota (
    key TEXT PRIMARY KEY,
    window_start TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('version', '1');
";

/// SQLite-backed storage engine.
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open an existing ledger.db.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.apply_pragmas()?;
        Ok(store)
    }

    /// Open or create ledger.db with full schema.
    pub fn open_or_create(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    /// Private in-memory database with full schema.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn apply_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn schema_version(&self) -> anyhow::Result<u32> {
        let version_str: String = self
            .conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .unwrap_or_else(|_| "1".to_string());
        Ok(version_str.parse().unwrap_or(1))
    }

    // ── Campaigns ───────────────────────────────────────────────────

    /// Create a campaign. A positive opening budget is also recorded as the first
    /// budget change, in the same transaction.
    pub fn create_campaign(
        &self,
        name: &str,
        budget: Decimal,
        at: OffsetDateTime,
    ) -> anyhow::Result<Campaign> {
        let budget = validate_budget(budget)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO campaigns (name, current_budget_cents, is_active, created_at)
             VALUES (?1, ?2, TRUE, ?3)",
            params![name, to_cents(budget)?, format_instant(at)],
        )?;
        let id = CampaignId(tx.last_insert_rowid());
        if budget > Decimal::ZERO {
            insert_change(&tx, &new_budget_change(id, Decimal::ZERO, budget, at))?;
        }
        tx.commit()?;
        self.find_campaign(id)?
            .ok_or_else(|| anyhow::anyhow!("campaign {id} vanished after insert"))
    }

    pub fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, current_budget_cents, is_active, created_at
                 FROM campaigns WHERE id = ?1",
                params![id.0],
                map_campaign_row,
            )
            .optional()?;
        row.map(row_to_campaign).transpose()
    }

    pub fn list_campaigns(&self) -> anyhow::Result<Vec<Campaign>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, current_budget_cents, is_active, created_at
             FROM campaigns ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], map_campaign_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(row_to_campaign).collect()
    }

    /// Set a campaign's budget. Appends a change only when the value differs.
    pub fn set_budget(
        &self,
        id: CampaignId,
        value: Decimal,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<BudgetChange>> {
        self.update_campaign(id, value, None, at)
    }

    /// Pause: budget to zero and mark inactive.
    pub fn pause(&self, id: CampaignId, at: OffsetDateTime) -> anyhow::Result<Campaign> {
        self.update_campaign(id, Decimal::ZERO, Some(false), at)?;
        self.require_campaign(id)
    }

    /// Resume with `budget`, else the last non-zero budget in history, else `fallback`.
    pub fn resume(
        &self,
        id: CampaignId,
        budget: Option<Decimal>,
        fallback: Decimal,
        at: OffsetDateTime,
    ) -> anyhow::Result<Campaign> {
        let budget = match budget {
            Some(b) => b,
            None => self.last_non_zero_budget(id)?.unwrap_or(fallback),
        };
        self.update_campaign(id, budget, Some(true), at)?;
        self.require_campaign(id)
    }

    fn require_campaign(&self, id: CampaignId) -> anyhow::Result<Campaign> {
        self.find_campaign(id)?
            .ok_or_else(|| anyhow::anyhow!("campaign {id} not found"))
    }

    fn update_campaign(
        &self,
        id: CampaignId,
        value: Decimal,
        active: Option<bool>,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<BudgetChange>> {
        let value = validate_budget(value)?;
        let tx = self.conn.unchecked_transaction()?;
        let previous: Option<i64> = tx
            .query_row(
                "SELECT current_budget_cents FROM campaigns WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous) = previous.map(from_cents) else {
            anyhow::bail!("campaign {id} not found");
        };

        tx.execute(
            "UPDATE campaigns SET current_budget_cents = ?1 WHERE id = ?2",
            params![to_cents(value)?, id.0],
        )?;
        if let Some(active) = active {
            tx.execute(
                "UPDATE campaigns SET is_active = ?1 WHERE id = ?2",
                params![active, id.0],
            )?;
        }

        let change = if previous != value {
            let change = new_budget_change(id, previous, value, at);
            insert_change(&tx, &change)?;
            Some(change)
        } else {
            None
        };
        tx.commit()?;
        Ok(change)
    }

    fn last_non_zero_budget(&self, id: CampaignId) -> anyhow::Result<Option<Decimal>> {
        let cents: Option<i64> = self
            .conn
            .query_row(
                "SELECT new_cents FROM budget_changes
                 WHERE campaign_id = ?1 AND new_cents > 0
                 ORDER BY effective_at DESC, rowid DESC LIMIT 1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cents.map(from_cents))
    }

    // ── Budget changes ──────────────────────────────────────────────

    /// Changes in an optional range, newest first.
    pub fn budget_history(
        &self,
        id: CampaignId,
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
    ) -> anyhow::Result<Vec<BudgetChange>> {
        let from = from.map(format_instant).unwrap_or_default();
        let to = to.map(format_instant).unwrap_or_else(|| "9999".to_string());
        let mut stmt = self.conn.prepare(
            "SELECT change_id, campaign_id, previous_cents, new_cents, effective_at
             FROM budget_changes
             WHERE campaign_id = ?1 AND effective_at >= ?2 AND effective_at <= ?3
             ORDER BY effective_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![id.0, from, to], map_change_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(row_to_change).collect()
    }

    // ── Costs ───────────────────────────────────────────────────────

    /// Costs in `[start, end]`, oldest first.
    pub fn costs_in_range(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<SpendEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT cost_id, campaign_id, amount_cents, occurred_at, budget_cents, daily_limit_cents
             FROM costs
             WHERE campaign_id = ?1 AND occurred_at >= ?2 AND occurred_at <= ?3
             ORDER BY occurred_at, rowid",
        )?;
        let rows = stmt
            .query_map(
                params![id.0, format_instant(start), format_instant(end)],
                map_cost_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(row_to_cost).collect()
    }

    pub fn count_costs(&self, id: CampaignId) -> anyhow::Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM costs WHERE campaign_id = ?1",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n)?)
    }
}

impl TimelineReader for SqliteStore {
    fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>> {
        SqliteStore::find_campaign(self, id)
    }

    fn load_budget_history(
        &self,
        id: CampaignId,
        up_to: OffsetDateTime,
    ) -> anyhow::Result<Vec<BudgetChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT change_id, campaign_id, previous_cents, new_cents, effective_at
             FROM budget_changes
             WHERE campaign_id = ?1 AND effective_at <= ?2
             ORDER BY effective_at, rowid",
        )?;
        let rows = stmt
            .query_map(params![id.0, format_instant(up_to)], map_change_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(row_to_change).collect()
    }
}

impl CostLedger for SqliteStore {
    fn sum_amount(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Decimal> {
        let cents: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM costs
             WHERE campaign_id = ?1 AND occurred_at >= ?2 AND occurred_at <= ?3",
            params![id.0, format_instant(start), format_instant(end)],
            |row| row.get(0),
        )?;
        Ok(from_cents(cents))
    }

    /// Append a cost. Append-only; rows are never updated.
    fn insert(&self, event: &SpendEvent) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_cost(&tx, event)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_batch(&self, events: &[SpendEvent]) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for event in events {
            insert_cost(&tx, event)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_range(
        &self,
        id: CampaignId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM costs
             WHERE campaign_id = ?1 AND occurred_at >= ?2 AND occurred_at <= ?3",
            params![id.0, format_instant(start), format_instant(end)],
        )?;
        Ok(n)
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Merge WAL back into main DB so users see a single file when idle.
        let _ = self
            .conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
    }
}

// ── Internal helpers ────────────────────────────────────────────────

fn insert_change(tx: &Transaction<'_>, change: &BudgetChange) -> anyhow::Result<()> {
    tx.execute(
        "INSERT INTO budget_changes
         (change_id, campaign_id, previous_cents, new_cents, effective_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            change.change_id,
            change.campaign_id.0,
            to_cents(change.previous_value)?,
            to_cents(change.new_value)?,
            format_instant(change.effective_at),
        ],
    )?;
    Ok(())
}

fn insert_cost(tx: &Transaction<'_>, event: &SpendEvent) -> anyhow::Result<()> {
    if event.amount.is_sign_negative() && !event.amount.is_zero() {
        anyhow::bail!("refusing negative cost {} ({})", event.amount, event.cost_id);
    }
    tx.execute(
        "INSERT INTO costs
         (cost_id, campaign_id, amount_cents, occurred_at, budget_cents, daily_limit_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.cost_id,
            event.campaign_id.0,
            to_cents(event.amount)?,
            format_instant(event.occurred_at),
            to_cents(event.budget_in_effect)?,
            to_cents(event.daily_limit_in_effect)?,
            format_instant(OffsetDateTime::now_utc()),
        ],
    )?;
    Ok(())
}

/// Intermediate row structs: timestamps stay text until converted.
struct CampaignRow {
    id: i64,
    name: String,
    budget_cents: i64,
    is_active: bool,
    created_at: String,
}

struct ChangeRow {
    change_id: String,
    campaign_id: i64,
    previous_cents: i64,
    new_cents: i64,
    effective_at: String,
}

struct CostRow {
    cost_id: String,
    campaign_id: i64,
    amount_cents: i64,
    occurred_at: String,
    budget_cents: i64,
    daily_limit_cents: i64,
}

fn map_campaign_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CampaignRow> {
    Ok(CampaignRow {
        id: row.get(0)?,
        name: row.get(1)?,
        budget_cents: row.get(2)?,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_change_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChangeRow> {
    Ok(ChangeRow {
        change_id: row.get(0)?,
        campaign_id: row.get(1)?,
        previous_cents: row.get(2)?,
        new_cents: row.get(3)?,
        effective_at: row.get(4)?,
    })
}

fn map_cost_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CostRow> {
    Ok(CostRow {
        cost_id: row.get(0)?,
        campaign_id: row.get(1)?,
        amount_cents: row.get(2)?,
        occurred_at: row.get(3)?,
        budget_cents: row.get(4)?,
        daily_limit_cents: row.get(5)?,
    })
}

fn row_to_campaign(row: CampaignRow) -> anyhow::Result<Campaign> {
    Ok(Campaign {
        id: CampaignId(row.id),
        name: row.name,
        current_budget: from_cents(row.budget_cents),
        is_active: row.is_active,
        created_at: parse_stored(&row.created_at)?,
    })
}

fn row_to_change(row: ChangeRow) -> anyhow::Result<BudgetChange> {
    Ok(BudgetChange {
        change_id: row.change_id,
        campaign_id: CampaignId(row.campaign_id),
        previous_value: from_cents(row.previous_cents),
        new_value: from_cents(row.new_cents),
        effective_at: parse_stored(&row.effective_at)?,
    })
}

fn row_to_cost(row: CostRow) -> anyhow::Result<SpendEvent> {
    Ok(SpendEvent {
        cost_id: row.cost_id,
        campaign_id: CampaignId(row.campaign_id),
        amount: from_cents(row.amount_cents),
        occurred_at: parse_stored(&row.occurred_at)?,
        budget_in_effect: from_cents(row.budget_cents),
        daily_limit_in_effect: from_cents(row.daily_limit_cents),
    })
}
