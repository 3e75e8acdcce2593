use lane_core::controller::{
    CruiseController, Difficulty, HybridController, PolicyController,
};
use lane_core::{Controller, SimConfig};
use serde::Serialize;

const DRIVER_IDS: [&str; 5] = [
    "hybrid",
    "cruise-easy",
    "cruise-medium",
    "cruise-hard",
    "policy-default",
];

#[derive(Clone, Debug, Serialize)]
pub struct DriverManifestEntry {
    pub id: String,
    pub controller_id: String,
    pub description: String,
}

pub fn driver_ids() -> &'static [&'static str] {
    &DRIVER_IDS
}

pub fn describe_drivers() -> Vec<(&'static str, &'static str)> {
    let cfg = SimConfig::default();
    DRIVER_IDS
        .iter()
        .filter_map(|id| create_driver(id, &cfg, 0).map(|driver| (*id, driver.description())))
        .collect()
}

pub fn driver_manifest_entries(cfg: &SimConfig) -> Vec<DriverManifestEntry> {
    DRIVER_IDS
        .iter()
        .filter_map(|id| {
            create_driver(id, cfg, 0).map(|driver| DriverManifestEntry {
                id: (*id).to_string(),
                controller_id: driver.id().to_string(),
                description: driver.description().to_string(),
            })
        })
        .collect()
}

/// Opponent driver id for a campaign level.
pub fn opponent_for_level(level: u32) -> &'static str {
    match Difficulty::for_level(level) {
        Difficulty::Easy => "cruise-easy",
        Difficulty::Medium => "cruise-medium",
        Difficulty::Hard => "cruise-hard",
    }
}

pub fn create_driver(id: &str, cfg: &SimConfig, seed: u32) -> Option<Box<dyn Controller>> {
    let driver: Box<dyn Controller> = match id {
        "hybrid" => Box::new(HybridController::new(cfg.hybrid.clone(), seed)),
        "cruise-easy" => Box::new(CruiseController::new(Difficulty::Easy, &cfg.cruise)),
        "cruise-medium" => Box::new(CruiseController::new(Difficulty::Medium, &cfg.cruise)),
        "cruise-hard" => Box::new(CruiseController::new(Difficulty::Hard, &cfg.cruise)),
        "policy-default" => Box::new(PolicyController::untrained()),
        _ => return None,
    };
    Some(driver)
}
