use crate::drivers::{create_driver, driver_ids};
use crate::runner::{run_match, RunMetrics, RunOptions};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use lane_core::SimConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Reaching the finish and passing checkpoints.
    Completion,
    /// Finishing in as few ticks as possible.
    Pace,
    /// Progress with heavy penalties for wall contact.
    Safety,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        let finished = if metrics.won { 1.0 } else { 0.0 };
        match self {
            Self::Completion => {
                finished * 1_000.0 + metrics.progress * 500.0 - metrics.crash_ticks as f64
            }
            Self::Pace => {
                let spare = metrics.max_ticks.saturating_sub(metrics.ticks) as f64;
                finished * spare + metrics.progress * 100.0
            }
            Self::Safety => {
                let crashed = if metrics.crashed { 1.0 } else { 0.0 };
                metrics.progress * 500.0 - crashed * 400.0 - metrics.crash_ticks as f64 * 5.0
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Pace => "pace",
            Self::Safety => "safety",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub drivers: Vec<String>,
    pub opponent: Option<String>,
    pub seeds: Vec<u32>,
    pub max_ticks: u32,
    pub objective: Objective,
    pub sim: SimConfig,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub driver_id: String,
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u32,
    pub won: bool,
    pub checkpoints: usize,
    pub progress: f64,
    pub total_distance: f64,
    pub crashed: bool,
    pub crash_ticks: u32,
    pub objective_value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverAggregate {
    pub driver_id: String,
    pub runs: usize,
    pub finish_rate: f64,
    pub avg_finish_ticks: Option<f64>,
    pub best_finish_ticks: Option<u32>,
    pub avg_progress: f64,
    pub avg_distance: f64,
    pub crash_rate: f64,
    pub objective_value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub opponent: Option<String>,
    pub max_ticks: u32,
    pub jobs: Option<usize>,
    pub drivers: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub driver_rankings: Vec<DriverAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_drivers(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(driver_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let drivers: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if drivers.is_empty() {
                return Err(anyhow!("--drivers resolved to empty list"));
            }
            Ok(drivers)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.drivers.is_empty() {
        return Err(anyhow!("benchmark requires at least one driver"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    for id in config.drivers.iter().chain(config.opponent.iter()) {
        if create_driver(id, &config.sim, 0).is_none() {
            let available = driver_ids().join(", ");
            return Err(anyhow!("unknown driver '{id}'. available: {available}"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .drivers
        .iter()
        .flat_map(|driver| config.seeds.iter().map(move |seed| (driver.clone(), *seed)))
        .collect();

    tracing::info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark started"
    );

    let run_one = |(driver_id, seed): &(String, u32)| -> Result<RunRecord> {
        let artifact = run_match(
            driver_id,
            config.opponent.as_deref(),
            *seed,
            &config.sim,
            config.max_ticks,
            RunOptions::default(),
        )
        .with_context(|| format!("benchmark run failed for driver={driver_id} seed={seed:#x}"))?;
        let m = &artifact.metrics;
        Ok(RunRecord {
            driver_id: m.driver_id.clone(),
            seed: m.seed,
            seed_hex: seed_to_hex(m.seed),
            ticks: m.ticks,
            won: m.won,
            checkpoints: m.checkpoints,
            progress: m.progress,
            total_distance: m.total_distance,
            crashed: m.crashed,
            crash_ticks: m.crash_ticks,
            objective_value: config.objective.run_value(m),
        })
    };

    let run_results: Vec<Result<RunRecord>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let mut rankings = aggregate(&runs);
    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.finish_rate.total_cmp(&a.finish_rate))
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    runs.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| a.ticks.cmp(&b.ticks))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    write_runs_csv(&config.out_dir.join("runs.csv"), &runs)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        opponent: config.opponent,
        max_ticks: config.max_ticks,
        jobs: config.jobs,
        drivers: config.drivers,
        seeds: config.seeds,
        run_count: runs.len(),
        driver_rankings: rankings,
        runs,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn aggregate(runs: &[RunRecord]) -> Vec<DriverAggregate> {
    let mut grouped: HashMap<&str, Vec<&RunRecord>> = HashMap::new();
    for run in runs {
        grouped.entry(run.driver_id.as_str()).or_default().push(run);
    }

    grouped
        .into_iter()
        .map(|(driver_id, driver_runs)| {
            let count = driver_runs.len() as f64;
            let finish_ticks: Vec<u32> = driver_runs
                .iter()
                .filter(|r| r.won)
                .map(|r| r.ticks)
                .collect();
            let avg_finish_ticks = if finish_ticks.is_empty() {
                None
            } else {
                Some(finish_ticks.iter().map(|t| *t as f64).sum::<f64>() / finish_ticks.len() as f64)
            };
            DriverAggregate {
                driver_id: driver_id.to_string(),
                runs: driver_runs.len(),
                finish_rate: finish_ticks.len() as f64 / count,
                avg_finish_ticks,
                best_finish_ticks: finish_ticks.iter().copied().min(),
                avg_progress: driver_runs.iter().map(|r| r.progress).sum::<f64>() / count,
                avg_distance: driver_runs.iter().map(|r| r.total_distance).sum::<f64>() / count,
                crash_rate: driver_runs.iter().filter(|r| r.crashed).count() as f64 / count,
                objective_value: driver_runs.iter().map(|r| r.objective_value).sum::<f64>()
                    / count,
            }
        })
        .collect()
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "driver_id,seed_hex,seed,ticks,won,checkpoints,progress,total_distance,crashed,crash_ticks,objective_value\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{:.4},{:.2},{},{},{:.4}\n",
            row.driver_id,
            row.seed_hex,
            row.seed,
            row.ticks,
            row.won,
            row.checkpoints,
            row.progress,
            row.total_distance,
            row.crashed,
            row.crash_ticks,
            row.objective_value
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[DriverAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,driver_id,runs,finish_rate,avg_finish_ticks,best_finish_ticks,avg_progress,avg_distance,crash_rate,objective_value\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{:.4},{},{},{:.4},{:.2},{:.4},{:.4}\n",
            idx + 1,
            row.driver_id,
            row.runs,
            row.finish_rate,
            row.avg_finish_ticks
                .map(|t| format!("{t:.1}"))
                .unwrap_or_default(),
            row.best_finish_ticks
                .map(|t| t.to_string())
                .unwrap_or_default(),
            row.avg_progress,
            row.avg_distance,
            row.crash_rate,
            row.objective_value
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
