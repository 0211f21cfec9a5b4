//! `.adspend/config.json`: a flat JSON object with a typed view for the simulator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Tunables for generation and budget management. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub min_events_per_day: u32,
    pub max_events_per_day: u32,
    /// Lower end of the amount band as a fraction of available capacity.
    pub min_amount_fraction: Decimal,
    pub default_lookback_months: u32,
    pub default_resume_budget: Decimal,
    pub max_runs_per_day: Option<u32>,
    pub run_window_secs: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            min_events_per_day: 1,
            max_events_per_day: 10,
            min_amount_fraction: Decimal::new(1, 1),
            default_lookback_months: 3,
            default_resume_budget: Decimal::new(10_000, 2),
            max_runs_per_day: None,
            run_window_secs: 86_400,
        }
    }
}

impl SimConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let map = read_config(path)?;
        let cfg: SimConfig = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Every recognised key with its default value.
    pub fn default_map() -> ConfigMap {
        match serde_json::to_value(Self::default()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ConfigMap::new(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_events_per_day == 0 {
            anyhow::bail!("min_events_per_day must be at least 1");
        }
        if self.min_events_per_day > self.max_events_per_day {
            anyhow::bail!(
                "min_events_per_day ({}) exceeds max_events_per_day ({})",
                self.min_events_per_day,
                self.max_events_per_day
            );
        }
        if self.min_amount_fraction < Decimal::ZERO || self.min_amount_fraction > Decimal::ONE {
            anyhow::bail!(
                "min_amount_fraction must be within 0..=1, got {}",
                self.min_amount_fraction
            );
        }
        if self.run_window_secs <= 0 {
            anyhow::bail!("run_window_secs must be positive");
        }
        adspend_core::money::validate_budget(self.default_resume_budget)?;
        Ok(())
    }
}

/// Read the raw map. Returns an empty map if the file doesn't exist.
pub fn read_config(path: &Path) -> anyhow::Result<ConfigMap> {
    if !path.exists() {
        return Ok(ConfigMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(ConfigMap::new()),
    }
}

pub fn write_config(path: &Path, config: &ConfigMap) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Atomic write: temp file in the same directory, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Parse CLI text into a JSON value (bool/integer/string).
///
/// Decimals stay strings: money keys are stored as text to keep them exact.
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        "null" => serde_json::Value::Null,
        _ => match s.parse::<i64>() {
            Ok(n) => serde_json::Value::Number(n.into()),
            Err(_) => serde_json::Value::String(s.to_string()),
        },
    }
}
