use crate::drivers::create_driver;
use anyhow::{anyhow, Context, Result};
use lane_core::race::RaceOutcome;
use lane_core::record::{FrameRecord, SessionRecorder, DEFAULT_MIN_RECORD_SPEED};
use lane_core::{Race, SimConfig};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub driver_id: String,
    pub controller_id: String,
    pub opponent_id: Option<String>,
    pub seed: u32,
    pub max_ticks: u32,
    pub ticks: u32,
    pub won: bool,
    pub winner: Option<String>,
    pub checkpoints: usize,
    pub checkpoint_total: usize,
    pub progress: f64,
    pub total_distance: f64,
    pub crashed: bool,
    pub crash_ticks: u32,
    pub final_x: f64,
    pub final_y: f64,
    pub steering_ticks: u32,
    pub reverse_ticks: u32,
    pub avg_throttle: f64,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub outcome: RaceOutcome,
    pub frames: Vec<FrameRecord>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    pub record: bool,
}

/// Solo run of one driver against the clock.
pub fn run_driver(driver_id: &str, seed: u32, cfg: &SimConfig, max_ticks: u32) -> Result<RunArtifact> {
    run_match(driver_id, None, seed, cfg, max_ticks, RunOptions::default())
}

/// Races `driver_id` in lane 0 against an optional opponent in lane 1.
pub fn run_match(
    driver_id: &str,
    opponent_id: Option<&str>,
    seed: u32,
    cfg: &SimConfig,
    max_ticks: u32,
    options: RunOptions,
) -> Result<RunArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    let driver =
        create_driver(driver_id, cfg, seed).ok_or_else(|| anyhow!("unknown driver '{driver_id}'"))?;
    let controller_id = driver.id().to_string();

    let mut race = Race::new(cfg.clone()).context("invalid simulation config")?;
    race.add_entrant(driver_id, driver);
    if let Some(opponent_id) = opponent_id {
        let opponent = create_driver(opponent_id, cfg, seed)
            .ok_or_else(|| anyhow!("unknown opponent driver '{opponent_id}'"))?;
        race.add_entrant(opponent_id, opponent);
    }
    race.reset(seed);

    let mut recorder = SessionRecorder::new(DEFAULT_MIN_RECORD_SPEED);
    if options.record {
        recorder.start();
    }

    let mut steering_ticks = 0u32;
    let mut reverse_ticks = 0u32;
    let mut throttle_sum = 0.0;
    let mut action_ticks = 0u32;
    while race.winner().is_none() && race.tick_count() < max_ticks {
        let report = if options.record {
            race.tick_recorded(&mut recorder)
        } else {
            race.tick()
        };
        if let Some(action) = report.actions.first() {
            action_ticks += 1;
            throttle_sum += action.throttle;
            if action.steering != 0.0 {
                steering_ticks += 1;
            }
            if action.throttle < 0.0 {
                reverse_ticks += 1;
            }
        }
    }

    let outcome = race.outcome();
    let player = outcome
        .entrants
        .first()
        .ok_or_else(|| anyhow!("race finished without entrants"))?;
    let checkpoint_total = race.track().checkpoint_count();

    tracing::debug!(
        driver = driver_id,
        seed,
        ticks = outcome.ticks,
        winner = outcome.winner_label.as_deref().unwrap_or("none"),
        "run complete"
    );

    Ok(RunArtifact {
        metrics: RunMetrics {
            driver_id: driver_id.to_string(),
            controller_id,
            opponent_id: opponent_id.map(str::to_string),
            seed,
            max_ticks,
            ticks: outcome.ticks,
            won: outcome.winner == Some(0),
            winner: outcome.winner_label.clone(),
            checkpoints: player.checkpoints,
            checkpoint_total,
            progress: player.progress,
            total_distance: player.total_distance,
            crashed: player.crashed,
            crash_ticks: player.crash_ticks,
            final_x: player.final_x,
            final_y: player.final_y,
            steering_ticks,
            reverse_ticks,
            avg_throttle: if action_ticks == 0 {
                0.0
            } else {
                throttle_sum / action_ticks as f64
            },
        },
        frames: recorder.stop(),
        outcome,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let encoded = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_rejected() {
        let err = run_driver("hybrid", 1, &SimConfig::default(), 0).expect_err("must fail");
        assert!(err.to_string().contains("max_ticks"));
    }

    #[test]
    fn unknown_driver_is_rejected() {
        let err = run_driver("ghost", 1, &SimConfig::default(), 10).expect_err("must fail");
        assert!(err.to_string().contains("unknown driver 'ghost'"));
    }

    #[test]
    fn recording_captures_player_frames() -> Result<()> {
        let artifact = run_match(
            "hybrid",
            Some("cruise-easy"),
            3,
            &SimConfig::default(),
            3_600,
            RunOptions { record: true },
        )?;
        assert!(artifact.metrics.won);
        assert!(!artifact.frames.is_empty());
        assert!(artifact.frames.len() < artifact.metrics.ticks as usize);
        Ok(())
    }
}
