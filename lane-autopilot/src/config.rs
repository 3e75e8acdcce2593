//! Effective simulation settings for the CLI: defaults, an optional JSON
//! file, then environment overrides.

use anyhow::{Context, Result};
use lane_core::SimConfig;
use std::env;
use std::fs;
use std::path::Path;

pub const MAX_TICKS_ENV: &str = "LANE_MAX_TICKS";

/// Loads `path` as a partial JSON `SimConfig` (missing fields keep their
/// defaults) and validates the result.
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    let mut cfg = match path {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_slice::<SimConfig>(&raw)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };

    cfg.race.max_ticks = read_env_u32(MAX_TICKS_ENV, cfg.race.max_ticks);
    cfg.validate().context("invalid simulation config")?;
    tracing::debug!(max_ticks = cfg.race.max_ticks, "simulation config loaded");
    Ok(cfg)
}

/// A `--max-ticks` flag beats the configured budget.
pub fn resolve_max_ticks(flag: Option<u32>, cfg: &SimConfig) -> u32 {
    match flag {
        Some(0) => {
            tracing::warn!(
                "--max-ticks 0 ignored, using configured {}",
                cfg.race.max_ticks
            );
            cfg.race.max_ticks
        }
        Some(ticks) => ticks,
        None => cfg.race.max_ticks,
    }
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
