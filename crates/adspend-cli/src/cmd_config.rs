use adspend_ledger::config::{parse_value, read_config, write_config, ConfigMap};
use adspend_ledger::{AdspendPaths, SimConfig};
use clap::Subcommand;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. max_events_per_day)
        key: String,
        /// Config value (true/false/null/integer/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values, defaults included
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

fn initialized_paths(repo_root: &Path) -> anyhow::Result<AdspendPaths> {
    let paths = AdspendPaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("No .adspend/ workspace found. Run `adspend init` first.");
    }
    Ok(paths)
}

/// Typed view of a raw map, rejecting values the simulator cannot use.
fn check(map: &ConfigMap) -> anyhow::Result<SimConfig> {
    let cfg: SimConfig = serde_json::from_value(serde_json::Value::Object(map.clone()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Effective settings as a flat map: stored keys over defaults.
fn effective(map: &ConfigMap) -> anyhow::Result<ConfigMap> {
    match serde_json::to_value(check(map)?)? {
        serde_json::Value::Object(mut all) => {
            for (k, v) in map {
                all.entry(k.clone()).or_insert_with(|| v.clone());
            }
            Ok(all)
        }
        _ => Ok(map.clone()),
    }
}

/// `adspend config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = initialized_paths(repo_root)?;
    let mut config = read_config(&paths.config_json)?;
    config.insert(key.to_string(), parse_value(value));
    check(&config).map_err(|e| anyhow::anyhow!("rejected {key} = {value}: {e}"))?;
    if !SimConfig::default_map().contains_key(key) {
        tracing::warn!(key, "config key is not used by adspend");
    }
    write_config(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `adspend config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = initialized_paths(repo_root)?;
    let config = effective(&read_config(&paths.config_json)?)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `adspend config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = initialized_paths(repo_root)?;
    let stored = read_config(&paths.config_json)?;
    for (k, v) in &effective(&stored)? {
        let marker = if stored.contains_key(k) { "" } else { "  (default)" };
        println!("{k} = {v}{marker}");
    }
    Ok(())
}
