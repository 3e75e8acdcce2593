use anyhow::Result;
use lane_autopilot::benchmark::{run_benchmark, BenchmarkConfig, Objective};
use lane_autopilot::drivers::driver_ids;
use lane_autopilot::runner::run_driver;
use lane_core::SimConfig;

#[test]
fn all_drivers_complete_a_smoke_run() -> Result<()> {
    let cfg = SimConfig::default();
    for driver in driver_ids() {
        let artifact = run_driver(driver, 0xDEAD_BEEF, &cfg, 900)?;
        assert!(artifact.metrics.ticks > 0, "driver={driver}");
        assert!(artifact.metrics.ticks <= 900, "driver={driver}");
        assert_eq!(artifact.metrics.driver_id, *driver);
        assert!(artifact.metrics.total_distance > 0.0, "driver={driver}");
    }
    Ok(())
}

#[test]
fn solo_hybrid_finishes_on_multiple_seeds() -> Result<()> {
    let cfg = SimConfig::default();
    for seed in [0xDEAD_BEEF, 0xC0FF_EE11, 0x1234_5678] {
        let artifact = run_driver("hybrid", seed, &cfg, 3_600)?;
        assert!(artifact.metrics.won, "seed={seed:#x}");
        assert_eq!(artifact.metrics.checkpoints, artifact.metrics.checkpoint_total);
        assert_eq!(artifact.metrics.reverse_ticks, 0, "seed={seed:#x}");
    }
    Ok(())
}

#[test]
fn runs_repeat_exactly_for_a_seed() -> Result<()> {
    let cfg = SimConfig::default();
    let a = run_driver("hybrid", 77, &cfg, 3_600)?;
    let b = run_driver("hybrid", 77, &cfg, 3_600)?;
    assert_eq!(a.outcome, b.outcome);
    Ok(())
}

#[test]
fn benchmark_smoke_outputs_expected_metadata() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let report = run_benchmark(BenchmarkConfig {
        drivers: vec!["hybrid".to_string(), "cruise-easy".to_string()],
        opponent: None,
        seeds: vec![0xDEAD_BEEF, 0xC0FF_EE11],
        max_ticks: 3_600,
        objective: Objective::Pace,
        sim: SimConfig::default(),
        out_dir: tmp.path().to_path_buf(),
        jobs: Some(2),
    })?;

    assert_eq!(report.run_count, 4);
    assert_eq!(report.driver_rankings.len(), 2);
    assert_eq!(report.driver_rankings[0].driver_id, "hybrid");
    assert!(tmp.path().join("summary.json").exists());
    assert!(tmp.path().join("runs.csv").exists());
    assert!(tmp.path().join("rankings.csv").exists());

    let raw = std::fs::read(tmp.path().join("summary.json"))?;
    let summary: serde_json::Value = serde_json::from_slice(&raw)?;
    assert_eq!(summary["objective"], "pace");
    assert_eq!(summary["run_count"], 4);
    Ok(())
}

#[test]
fn benchmark_rejects_unknown_drivers() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let err = run_benchmark(BenchmarkConfig {
        drivers: vec!["hybrid".to_string()],
        opponent: Some("phantom".to_string()),
        seeds: vec![1],
        max_ticks: 100,
        objective: Objective::Completion,
        sim: SimConfig::default(),
        out_dir: tmp.path().to_path_buf(),
        jobs: None,
    })
    .expect_err("unknown opponent must fail");
    assert!(err.to_string().contains("phantom"));
    Ok(())
}
