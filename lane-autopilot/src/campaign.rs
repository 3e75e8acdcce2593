//! Level progression: each level pits the driver against a faster cruise
//! opponent. A win advances to the next level; a loss ends the campaign.

use crate::drivers::opponent_for_level;
use crate::runner::{run_match, RunOptions};
use anyhow::{anyhow, Result};
use lane_core::controller::Difficulty;
use lane_core::SimConfig;
use serde::Serialize;

pub const FIRST_LEVEL: u32 = 1;
pub const LAST_LEVEL: u32 = 3;

#[derive(Clone, Debug)]
pub struct CampaignConfig {
    pub driver: String,
    pub seed: u32,
    pub start_level: u32,
    pub max_ticks: u32,
    pub sim: SimConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelResult {
    pub level: u32,
    pub difficulty: Difficulty,
    pub opponent_id: String,
    pub seed: u32,
    pub won: bool,
    pub ticks: u32,
    pub checkpoints: usize,
    pub opponent_checkpoints: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CampaignReport {
    pub driver_id: String,
    pub levels: Vec<LevelResult>,
    /// Every level from the start level through the last was won.
    pub cleared: bool,
    pub reached_level: u32,
}

pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    if !(FIRST_LEVEL..=LAST_LEVEL).contains(&config.start_level) {
        return Err(anyhow!(
            "start level must be within {FIRST_LEVEL}..={LAST_LEVEL}, got {}",
            config.start_level
        ));
    }

    let mut levels = Vec::new();
    let mut level = config.start_level;
    let cleared = loop {
        let opponent_id = opponent_for_level(level);
        let seed = config.seed.wrapping_add(level);
        let artifact = run_match(
            &config.driver,
            Some(opponent_id),
            seed,
            &config.sim,
            config.max_ticks,
            RunOptions::default(),
        )?;
        let won = artifact.metrics.won;
        let opponent_checkpoints = artifact
            .outcome
            .entrants
            .get(1)
            .map_or(0, |entrant| entrant.checkpoints);

        tracing::info!(
            level,
            opponent = opponent_id,
            won,
            ticks = artifact.metrics.ticks,
            "level complete"
        );

        levels.push(LevelResult {
            level,
            difficulty: Difficulty::for_level(level),
            opponent_id: opponent_id.to_string(),
            seed,
            won,
            ticks: artifact.metrics.ticks,
            checkpoints: artifact.metrics.checkpoints,
            opponent_checkpoints,
        });

        if !won {
            break false;
        }
        if level == LAST_LEVEL {
            break true;
        }
        level += 1;
    };

    Ok(CampaignReport {
        driver_id: config.driver.clone(),
        levels,
        cleared,
        reached_level: level,
    })
}
