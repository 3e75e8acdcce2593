//! Rule-based lane keeper with a stuck detector.
//!
//! In normal driving the action is a pure function of the lateral and
//! forward sensors plus the crash flag. When the agent sits still for too
//! long the controller runs a fixed reverse-and-turn maneuver whose phase is
//! chosen only by the ticks left on the recovery timer.

use crate::agent::{Agent, FORWARD_SENSOR, LEFT_SENSOR, RIGHT_SENSOR};
use crate::config::{HybridConfig, Maneuver};
use crate::controller::{Action, Controller};
use crate::rng::SeededRng;
use crate::track::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerPhase {
    Normal,
    Recovering { remaining: u32, direction: i8 },
}

pub struct HybridController {
    cfg: HybridConfig,
    rng: SeededRng,
    stuck_counter: u32,
    recovery_timer: u32,
    recovery_direction: i8,
    last_position: Option<Point>,
}

impl HybridController {
    pub fn new(cfg: HybridConfig, seed: u32) -> Self {
        Self {
            cfg,
            rng: SeededRng::new(seed),
            stuck_counter: 0,
            recovery_timer: 0,
            recovery_direction: 0,
            last_position: None,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        if self.recovery_timer > 0 {
            ControllerPhase::Recovering {
                remaining: self.recovery_timer,
                direction: self.recovery_direction,
            }
        } else {
            ControllerPhase::Normal
        }
    }

    pub fn stuck_counter(&self) -> u32 {
        self.stuck_counter
    }

    pub fn recovery_timer(&self) -> u32 {
        self.recovery_timer
    }

    pub fn recovery_direction(&self) -> i8 {
        self.recovery_direction
    }

    fn track_motion(&mut self, agent: &Agent) {
        let position = agent.position();
        // No reference yet counts as not having moved.
        let displacement = self
            .last_position
            .map_or(0.0, |last| last.distance(position));
        self.last_position = Some(position);

        if self.recovery_timer > 0 {
            return;
        }

        if displacement < self.cfg.stuck_displacement
            && agent.speed().abs() < self.cfg.stuck_speed
            && !agent.crashed()
        {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = self.stuck_counter.saturating_sub(1);
        }

        if self.stuck_counter > self.cfg.stuck_limit {
            self.recovery_timer = self.cfg.recovery_ticks;
            self.recovery_direction = self.rng.next_sign();
            self.stuck_counter = 0;
            tracing::debug!(
                direction = self.recovery_direction,
                x = position.x,
                y = position.y,
                "stuck, starting recovery"
            );
        }
    }

    fn recovery_step(&mut self) -> Action {
        self.recovery_timer -= 1;
        let maneuver = self.maneuver_for(self.recovery_timer);
        let direction = f64::from(self.recovery_direction);
        let action = Action::new(direction * maneuver.steering, maneuver.throttle);

        if self.recovery_timer == 0 {
            self.recovery_direction = 0;
            tracing::debug!("recovery finished");
        }
        action.clamped()
    }

    fn maneuver_for(&self, remaining: u32) -> Maneuver {
        if remaining > self.cfg.recovery_hard_above {
            self.cfg.hard_reverse
        } else if remaining > self.cfg.recovery_reverse_above {
            self.cfg.reverse
        } else {
            self.cfg.forward
        }
    }

    /// Normal-mode decision from the sensor ring and crash flag.
    pub fn decide(&self, agent: &Agent) -> Action {
        let cfg = &self.cfg;
        let left = agent.sensor(LEFT_SENSOR);
        let right = agent.sensor(RIGHT_SENSOR);
        let forward = agent.sensor(FORWARD_SENSOR);

        // Positive steering turns right, away from the left edge.
        let steering = if left < cfg.edge_hard_distance {
            cfg.hard_steering
        } else if right < cfg.edge_hard_distance {
            -cfg.hard_steering
        } else if left < cfg.edge_soft_distance {
            cfg.soft_steering
        } else if right < cfg.edge_soft_distance {
            -cfg.soft_steering
        } else {
            0.0
        };

        let mut throttle = if agent.crashed() {
            cfg.crashed_throttle
        } else if left < cfg.near_edge_distance || right < cfg.near_edge_distance {
            cfg.near_edge_throttle
        } else if forward < cfg.front_clearance {
            cfg.blocked_throttle
        } else {
            cfg.clear_throttle
        };

        if steering.abs() > cfg.sharp_steering {
            throttle *= cfg.sharp_throttle_scale;
        }

        Action::new(steering, throttle).clamped()
    }
}

impl Controller for HybridController {
    fn id(&self) -> &'static str {
        "hybrid"
    }

    fn description(&self) -> &'static str {
        "Rule-based lane keeper with stuck detection and a scripted recovery maneuver."
    }

    fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed);
        self.stuck_counter = 0;
        self.recovery_timer = 0;
        self.recovery_direction = 0;
        self.last_position = None;
    }

    fn compute(&mut self, agent: &Agent) -> Action {
        self.track_motion(agent);
        if self.recovery_timer > 0 {
            return self.recovery_step();
        }
        self.decide(agent)
    }
}

#[cfg(test)]
mod tests;
