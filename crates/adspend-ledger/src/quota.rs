//! Counts generation runs per key inside a fixed window, persisted in `run_quota`.

use crate::sqlite_store::SqliteStore;
use adspend_core::clock::{format_instant, parse_stored};
use rusqlite::{params, OptionalExtension};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Run admitted; `used` includes this one.
    Allowed { used: u32, limit: u32 },
    Denied { limit: u32, resets_at: OffsetDateTime },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

pub struct RunQuota<'a> {
    store: &'a SqliteStore,
    limit: u32,
    window: Duration,
}

impl<'a> RunQuota<'a> {
    pub fn new(store: &'a SqliteStore, limit: u32, window_secs: i64) -> Self {
        Self {
            store,
            limit,
            window: Duration::seconds(window_secs),
        }
    }

    /// Count a run against `key` at `now`. An expired window starts over.
    pub fn try_acquire(&self, key: &str, now: OffsetDateTime) -> anyhow::Result<QuotaDecision> {
        let conn = &self.store.conn;
        let tx = conn.unchecked_transaction()?;
        let row: Option<(String, i64)> = tx
            .query_row(
                "SELECT window_start, count FROM run_quota WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (window_start, used) = match row {
            Some((start, count)) => {
                let start = parse_stored(&start)?;
                if now >= start + self.window {
                    (now, 0)
                } else {
                    (start, u32::try_from(count)?)
                }
            }
            None => (now, 0),
        };

        if used >= self.limit {
            tracing::debug!(key, used, limit = self.limit, "run quota exhausted");
            return Ok(QuotaDecision::Denied {
                limit: self.limit,
                resets_at: window_start + self.window,
            });
        }

        tx.execute(
            "INSERT OR REPLACE INTO run_quota (key, window_start, count) VALUES (?1, ?2, ?3)",
            params![key, format_instant(window_start), used + 1],
        )?;
        tx.commit()?;
        Ok(QuotaDecision::Allowed {
            used: used + 1,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn admits_up_to_limit_then_denies() {
        let store = SqliteStore::open_in_memory().unwrap();
        let quota = RunQuota::new(&store, 2, 3600);
        let t0 = datetime!(2025-01-01 10:00 UTC);

        assert_eq!(
            quota.try_acquire("generate:1", t0).unwrap(),
            QuotaDecision::Allowed { used: 1, limit: 2 }
        );
        assert!(quota
            .try_acquire("generate:1", t0 + Duration::minutes(5))
            .unwrap()
            .is_allowed());
        assert_eq!(
            quota
                .try_acquire("generate:1", t0 + Duration::minutes(10))
                .unwrap(),
            QuotaDecision::Denied {
                limit: 2,
                resets_at: datetime!(2025-01-01 11:00 UTC)
            }
        );
    }

    #[test]
    fn keys_are_independent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let quota = RunQuota::new(&store, 1, 3600);
        let t0 = datetime!(2025-01-01 10:00 UTC);
        assert!(quota.try_acquire("generate:1", t0).unwrap().is_allowed());
        assert!(quota.try_acquire("generate:2", t0).unwrap().is_allowed());
        assert!(!quota.try_acquire("generate:1", t0).unwrap().is_allowed());
    }

    #[test]
    fn window_expiry_resets_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        let quota = RunQuota::new(&store, 1, 3600);
        let t0 = datetime!(2025-01-01 10:00 UTC);
        assert!(quota.try_acquire("k", t0).unwrap().is_allowed());
        assert!(!quota.try_acquire("k", t0 + Duration::minutes(59)).unwrap().is_allowed());
        assert_eq!(
            quota.try_acquire("k", t0 + Duration::hours(1)).unwrap(),
            QuotaDecision::Allowed { used: 1, limit: 1 }
        );
    }
}
