use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::CruiseConfig;
use crate::controller::{Action, Controller};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Level 1 is easy, level 2 medium, anything later hard.
    pub fn for_level(level: u32) -> Self {
        match level {
            0 | 1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn throttle(self, cfg: &CruiseConfig) -> f64 {
        match self {
            Difficulty::Easy => cfg.easy,
            Difficulty::Medium => cfg.medium,
            Difficulty::Hard => cfg.hard,
        }
    }
}

/// Drives straight ahead at a throttle fixed by difficulty.
pub struct CruiseController {
    difficulty: Difficulty,
    throttle: f64,
}

impl CruiseController {
    pub fn new(difficulty: Difficulty, cfg: &CruiseConfig) -> Self {
        Self {
            difficulty,
            throttle: difficulty.throttle(cfg),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

impl Controller for CruiseController {
    fn id(&self) -> &'static str {
        match self.difficulty {
            Difficulty::Easy => "cruise-easy",
            Difficulty::Medium => "cruise-medium",
            Difficulty::Hard => "cruise-hard",
        }
    }

    fn description(&self) -> &'static str {
        "Constant throttle, no steering."
    }

    fn reset(&mut self, _seed: u32) {}

    fn compute(&mut self, _agent: &Agent) -> Action {
        Action::new(0.0, self.throttle).clamped()
    }
}
