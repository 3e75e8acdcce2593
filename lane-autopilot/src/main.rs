use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lane_autopilot::benchmark::{resolve_drivers, run_benchmark, BenchmarkConfig, Objective};
use lane_autopilot::campaign::{run_campaign, CampaignConfig, FIRST_LEVEL};
use lane_autopilot::config::{load_sim_config, resolve_max_ticks};
use lane_autopilot::dataset::{generate, DatasetConfig};
use lane_autopilot::drivers::{create_driver, describe_drivers, driver_ids, driver_manifest_entries};
use lane_autopilot::runner::{run_match, write_json, RunOptions};
use lane_autopilot::util::{parse_seed, resolve_seeds, seed_to_hex, DEFAULT_SEED_START};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "lane-autopilot")]
#[command(about = "Deterministic lane racing: drivers, races, benchmarks and sample generation")]
struct Cli {
    /// JSON file with simulation overrides (missing fields keep defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available drivers
    ListDrivers,
    /// Export the driver manifest as JSON
    DriverManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective simulation config as JSON
    ShowConfig,
    /// Run one race, optionally against an opponent in the second lane
    Race {
        #[arg(long, default_value = "hybrid")]
        driver: String,
        #[arg(long)]
        opponent: Option<String>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        max_ticks: Option<u32>,
        /// Keep the driver's per-tick frames and report how many were captured
        #[arg(long, default_value_t = false)]
        record: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a multi-seed benchmark across one or more drivers
    Benchmark {
        #[arg(long)]
        drivers: Option<String>,
        #[arg(long)]
        opponent: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long)]
        max_ticks: Option<u32>,
        #[arg(long, value_enum, default_value_t = CliObjective::Completion)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Play levels 1-3 against increasingly fast opponents
    Campaign {
        #[arg(long, default_value = "hybrid")]
        driver: String,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = FIRST_LEVEL)]
        start_level: u32,
        #[arg(long)]
        max_ticks: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Collect (state, action) samples from the hybrid controller
    Sample {
        #[arg(long, default_value_t = 5_000)]
        samples: usize,
        #[arg(long, default_value_t = 100)]
        max_episodes: u32,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = 0.8)]
        train_ratio: f64,
        #[arg(long, default_value_t = 0.1)]
        val_ratio: f64,
        /// Write the sample statistics as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Completion,
    Pace,
    Safety,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Completion => Objective::Completion,
            CliObjective::Pace => Objective::Pace,
            CliObjective::Safety => Objective::Safety,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Cli { config, command } = Cli::parse();
    let sim = load_sim_config(config.as_deref())?;

    match command {
        Commands::ListDrivers => {
            for (id, description) in describe_drivers() {
                println!("{id:16} {description}");
            }
        }
        Commands::DriverManifest { output } => {
            let manifest = driver_manifest_entries(&sim);
            if let Some(path) = output {
                write_json(&path, &manifest)?;
                println!("wrote={}", path.display());
                println!("drivers={}", manifest.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&sim)?);
        }
        Commands::Race {
            driver,
            opponent,
            seed,
            max_ticks,
            record,
            output,
        } => {
            ensure_driver(&driver, &sim)?;
            if let Some(opponent) = opponent.as_deref() {
                ensure_driver(opponent, &sim)?;
            }
            let seed = seed_or_default(seed.as_deref())?;
            let max_ticks = resolve_max_ticks(max_ticks, &sim);
            let artifact = run_match(
                &driver,
                opponent.as_deref(),
                seed,
                &sim,
                max_ticks,
                RunOptions { record },
            )?;
            let m = &artifact.metrics;

            println!("driver={}", m.driver_id);
            println!("controller={}", m.controller_id);
            if let Some(opponent) = &m.opponent_id {
                println!("opponent={opponent}");
            }
            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", m.ticks);
            println!("winner={}", m.winner.as_deref().unwrap_or("none"));
            println!("checkpoints={}/{}", m.checkpoints, m.checkpoint_total);
            println!("progress={:.0}%", m.progress * 100.0);
            println!("distance={:.1}", m.total_distance);
            println!("crashed={} crash_ticks={}", m.crashed, m.crash_ticks);
            if record {
                println!("recorded_frames={}", artifact.frames.len());
            }
            if let Some(path) = output {
                write_json(&path, &artifact.metrics)?;
                println!("output={}", path.display());
            }
        }
        Commands::Benchmark {
            drivers,
            opponent,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            max_ticks,
            objective,
            out_dir,
            jobs,
        } => {
            let drivers = resolve_drivers(drivers.as_deref())?;
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let objective: Objective = objective.into();
            let max_ticks = resolve_max_ticks(max_ticks, &sim);
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                drivers,
                opponent,
                seeds,
                max_ticks,
                objective,
                sim,
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, driver) in report.driver_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  objective={:.2} finish={:.0}% avg_ticks={} progress={:.0}% crash={:.0}%",
                    idx + 1,
                    driver.driver_id,
                    driver.objective_value,
                    driver.finish_rate * 100.0,
                    driver
                        .avg_finish_ticks
                        .map(|t| format!("{t:.1}"))
                        .unwrap_or_else(|| "-".to_string()),
                    driver.avg_progress * 100.0,
                    driver.crash_rate * 100.0,
                );
            }
        }
        Commands::Campaign {
            driver,
            seed,
            start_level,
            max_ticks,
            output,
        } => {
            ensure_driver(&driver, &sim)?;
            let seed = seed_or_default(seed.as_deref())?;
            let max_ticks = resolve_max_ticks(max_ticks, &sim);
            let report = run_campaign(&CampaignConfig {
                driver,
                seed,
                start_level,
                max_ticks,
                sim,
            })?;

            println!("driver={}", report.driver_id);
            for level in &report.levels {
                println!(
                    "  level {} vs {}: {} ticks={} checkpoints={} opponent_checkpoints={}",
                    level.level,
                    level.opponent_id,
                    if level.won { "won" } else { "lost" },
                    level.ticks,
                    level.checkpoints,
                    level.opponent_checkpoints,
                );
            }
            println!("reached_level={}", report.reached_level);
            println!("cleared={}", report.cleared);
            if let Some(path) = output {
                write_json(&path, &report)?;
                println!("output={}", path.display());
            }
        }
        Commands::Sample {
            samples,
            max_episodes,
            seed,
            train_ratio,
            val_ratio,
            output,
        } => {
            let mut cfg = DatasetConfig {
                samples,
                max_episodes,
                ..DatasetConfig::default()
            };
            if let Some(seed) = seed.as_deref() {
                cfg.seed = parse_seed(seed)?;
            }
            let dataset = generate(&cfg, &sim)?;
            let split = dataset.split(train_ratio, val_ratio, cfg.seed)?;
            let stats = dataset.stats();

            println!("samples={} synthetic={}", stats.samples, stats.synthetic);
            println!("episodes={} crashes={}", stats.episodes, stats.crashes);
            for (name, column) in [
                ("speed", stats.speed),
                ("steering", stats.steering),
                ("throttle", stats.throttle),
            ] {
                println!(
                    "{name:9} min={:.3} max={:.3} mean={:.3}",
                    column.min, column.max, column.mean
                );
            }
            println!(
                "split train={} validation={} test={}",
                split.train.len(),
                split.validation.len(),
                split.test.len()
            );
            if let Some(path) = output {
                write_json(&path, &stats)?;
                println!("output={}", path.display());
            }
        }
    }

    Ok(())
}

fn ensure_driver(id: &str, sim: &lane_core::SimConfig) -> Result<()> {
    if create_driver(id, sim, 0).is_none() {
        let available = driver_ids().join(", ");
        return Err(anyhow!("unknown driver '{id}'. available: {available}"));
    }
    Ok(())
}

fn seed_or_default(seed: Option<&str>) -> Result<u32> {
    seed.map_or(Ok(DEFAULT_SEED_START), parse_seed)
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
