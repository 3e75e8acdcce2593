//! Supervised samples for an external policy: the hybrid controller drives
//! while every `(state vector, action)` pair it produces is collected.

use anyhow::{anyhow, Context, Result};
use lane_core::controller::HybridController;
use lane_core::rng::SeededRng;
use lane_core::{Agent, Controller, SimConfig, Track, SENSOR_COUNT, STATE_LEN};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub samples: usize,
    pub max_episodes: u32,
    pub episode_ticks: u32,
    /// Every n-th episode is followed by a burst of synthetic states.
    pub noise_every: u32,
    pub noise_samples: usize,
    pub seed: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            samples: 5_000,
            max_episodes: 100,
            episode_ticks: 500,
            noise_every: 10,
            noise_samples: 50,
            seed: 0x5EED_0001,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub state: [f64; STATE_LEN],
    pub action: [f64; 2],
    pub synthetic: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ColumnStats {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut stats = Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
        };
        for value in values {
            count += 1;
            stats.min = stats.min.min(value);
            stats.max = stats.max.max(value);
            stats.mean += value;
        }
        if count == 0 {
            return Self::default();
        }
        stats.mean /= count as f64;
        stats
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DatasetStats {
    pub samples: usize,
    pub synthetic: usize,
    pub episodes: u32,
    pub crashes: u32,
    pub speed: ColumnStats,
    pub steering: ColumnStats,
    pub throttle: ColumnStats,
}

#[derive(Clone, Debug)]
pub struct DatasetSplit {
    pub train: Vec<Sample>,
    pub validation: Vec<Sample>,
    pub test: Vec<Sample>,
}

#[derive(Clone, Debug)]
pub struct Dataset {
    samples: Vec<Sample>,
    episodes: u32,
    crashes: u32,
}

impl Dataset {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            samples: self.samples.len(),
            synthetic: self.samples.iter().filter(|s| s.synthetic).count(),
            episodes: self.episodes,
            crashes: self.crashes,
            speed: ColumnStats::of(self.samples.iter().map(|s| s.state[0])),
            steering: ColumnStats::of(self.samples.iter().map(|s| s.action[0])),
            throttle: ColumnStats::of(self.samples.iter().map(|s| s.action[1])),
        }
    }

    /// Shuffles with `seed` and cuts into train / validation / test; the
    /// test set takes whatever the two ratios leave over.
    pub fn split(&self, train_ratio: f64, val_ratio: f64, seed: u32) -> Result<DatasetSplit> {
        let ratios_valid = (0.0..=1.0).contains(&train_ratio)
            && (0.0..=1.0).contains(&val_ratio)
            && train_ratio + val_ratio <= 1.0;
        if !ratios_valid {
            return Err(anyhow!(
                "invalid split ratios train={train_ratio} validation={val_ratio}"
            ));
        }

        let mut shuffled = self.samples.clone();
        let mut rng = SeededRng::new(seed);
        for i in (1..shuffled.len()).rev() {
            let j = rng.next() as usize % (i + 1);
            shuffled.swap(i, j);
        }

        let n = shuffled.len();
        let n_train = (n as f64 * train_ratio) as usize;
        let n_val = ((n as f64 * val_ratio) as usize).min(n - n_train);
        let test = shuffled.split_off(n_train + n_val);
        let validation = shuffled.split_off(n_train);
        Ok(DatasetSplit {
            train: shuffled,
            validation,
            test,
        })
    }
}

pub fn generate(cfg: &DatasetConfig, sim: &SimConfig) -> Result<Dataset> {
    if cfg.samples == 0 {
        return Err(anyhow!("sample count must be > 0"));
    }
    if cfg.episode_ticks == 0 {
        return Err(anyhow!("episode_ticks must be > 0"));
    }
    let track = Track::new(sim.track.clone()).context("invalid track config")?;
    let start = track.start_pose(0);

    let mut agent = Agent::new(sim.agent.clone(), start);
    let mut expert = HybridController::new(sim.hybrid.clone(), cfg.seed);
    let mut noise = SeededRng::new(cfg.seed ^ 0xA5A5_A5A5);
    let mut samples = Vec::with_capacity(cfg.samples);
    let mut episodes = 0u32;
    let mut crashes = 0u32;

    while samples.len() < cfg.samples && episodes < cfg.max_episodes {
        episodes += 1;
        agent.reset(start);
        expert.reset(cfg.seed.wrapping_add(episodes));

        for _ in 0..cfg.episode_ticks {
            agent.refresh_sensors(&track);
            let action = expert.compute(&agent);
            samples.push(Sample {
                state: agent.state_vector(),
                action: action.as_array(),
                synthetic: false,
            });
            if samples.len() >= cfg.samples {
                break;
            }

            agent.apply_controller_action(action);
            agent.integrate();
            if track.detect_collision(&agent) {
                crashes += 1;
                break;
            }
        }

        if cfg.noise_every > 0 && episodes % cfg.noise_every == 0 {
            for _ in 0..cfg.noise_samples {
                if samples.len() >= cfg.samples {
                    break;
                }
                samples.push(synthetic_sample(&mut noise, &expert, sim, &track));
            }
        }

        tracing::debug!(episode = episodes, samples = samples.len(), "episode done");
    }

    tracing::info!(
        samples = samples.len(),
        episodes,
        crashes,
        "sample generation complete"
    );

    Ok(Dataset {
        samples,
        episodes,
        crashes,
    })
}

/// Random but plausible state: speed anywhere in the allowed band and
/// arbitrary sensor readings, labelled by the rule set alone.
fn synthetic_sample(
    rng: &mut SeededRng,
    expert: &HybridController,
    sim: &SimConfig,
    track: &Track,
) -> Sample {
    let mut probe = Agent::new(sim.agent.clone(), track.start_pose(0));
    probe.set_speed((rng.next_unit() - 0.5) * 2.0 * sim.agent.max_speed);
    let mut readings = [0.0; SENSOR_COUNT];
    for reading in readings.iter_mut() {
        *reading = rng.next_unit() * sim.agent.sensor_range;
    }
    probe.set_sensor_readings(readings);
    Sample {
        state: probe.state_vector(),
        action: expert.decide(&probe).as_array(),
        synthetic: true,
    }
}
