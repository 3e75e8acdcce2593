//! Tunables for the track, the agents and the controllers.
//!
//! Every struct deserializes with `#[serde(default)]`, so a partial JSON
//! document only overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_FIELD_WIDTH: f64 = 1200.0;
pub const DEFAULT_FIELD_HEIGHT: f64 = 800.0;
pub const DEFAULT_TICK_RATE: u32 = 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Left edge of the lane rectangle.
    pub x: f64,
    /// Top edge of the lane rectangle.
    pub y: f64,
    pub width: f64,
    pub length: f64,
    pub lanes: u32,
    /// Distance from the top edge to the start line.
    pub start_line_offset: f64,
    /// Distance from the bottom edge to the finish line.
    pub finish_line_offset: f64,
    /// Spawn distance past the start line.
    pub spawn_offset: f64,
    pub checkpoints: u32,
    pub checkpoint_tolerance: f64,
}

impl TrackConfig {
    /// Lane centered horizontally in a `field_width` x `field_height` field
    /// with a 50-unit margin above and below.
    pub fn centered(field_width: f64, field_height: f64) -> Self {
        let width = 200.0;
        Self {
            x: ((field_width - width) / 2.0).floor(),
            y: 50.0,
            width,
            length: field_height - 100.0,
            lanes: 2,
            start_line_offset: 30.0,
            finish_line_offset: 30.0,
            spawn_offset: 10.0,
            checkpoints: 5,
            checkpoint_tolerance: 25.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("track.width", self.width)?;
        positive("track.length", self.length)?;
        non_negative("track.checkpoint_tolerance", self.checkpoint_tolerance)?;
        if self.lanes == 0 {
            return Err(ConfigError::ZeroLanes);
        }
        if self.checkpoints == 0 {
            return Err(ConfigError::ZeroCheckpoints);
        }
        let start_y = self.y + self.start_line_offset;
        let finish_y = self.y + self.length - self.finish_line_offset;
        if start_y >= finish_y {
            return Err(ConfigError::StartBeyondFinish { start_y, finish_y });
        }
        Ok(())
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self::centered(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub width: f64,
    pub height: f64,
    pub max_speed: f64,
    /// Speed change per tick, used both to speed up and to slow down.
    pub acceleration: f64,
    /// Decrement toward zero applied on every integration step.
    pub friction: f64,
    /// Heading change in degrees per tick at full steering.
    pub turn_rate: f64,
    /// Below this absolute speed, steering has no effect.
    pub steer_min_speed: f64,
    pub sensor_range: f64,
    pub sensor_step: f64,
}

impl AgentConfig {
    pub fn reverse_limit(&self) -> f64 {
        -self.max_speed / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("agent.width", self.width)?;
        positive("agent.height", self.height)?;
        positive("agent.max_speed", self.max_speed)?;
        positive("agent.acceleration", self.acceleration)?;
        non_negative("agent.friction", self.friction)?;
        non_negative("agent.turn_rate", self.turn_rate)?;
        non_negative("agent.steer_min_speed", self.steer_min_speed)?;
        positive("agent.sensor_range", self.sensor_range)?;
        positive("agent.sensor_step", self.sensor_step)?;
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 60.0,
            max_speed: 8.0,
            acceleration: 0.3,
            friction: 0.05,
            turn_rate: 4.0,
            steer_min_speed: 0.5,
            sensor_range: 150.0,
            sensor_step: 5.0,
        }
    }
}

/// One phase of the scripted recovery maneuver. Steering is multiplied by
/// the recovery direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    pub steering: f64,
    pub throttle: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub stuck_displacement: f64,
    pub stuck_speed: f64,
    /// Recovery starts once the stuck counter exceeds this value.
    pub stuck_limit: u32,
    pub recovery_ticks: u32,
    /// Remaining ticks above which the hard reverse phase runs.
    pub recovery_hard_above: u32,
    /// Remaining ticks above which the reverse phase runs; at or below, the
    /// forward phase runs.
    pub recovery_reverse_above: u32,
    pub hard_reverse: Maneuver,
    pub reverse: Maneuver,
    pub forward: Maneuver,
    pub edge_hard_distance: f64,
    pub edge_soft_distance: f64,
    pub hard_steering: f64,
    pub soft_steering: f64,
    pub crashed_throttle: f64,
    pub near_edge_distance: f64,
    pub near_edge_throttle: f64,
    pub front_clearance: f64,
    pub blocked_throttle: f64,
    pub clear_throttle: f64,
    /// Throttle is scaled when |steering| is strictly above this.
    pub sharp_steering: f64,
    pub sharp_throttle_scale: f64,
}

impl HybridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("hybrid.stuck_displacement", self.stuck_displacement)?;
        non_negative("hybrid.stuck_speed", self.stuck_speed)?;
        if !(self.recovery_ticks > self.recovery_hard_above
            && self.recovery_hard_above > self.recovery_reverse_above)
        {
            return Err(ConfigError::RecoveryPhasesUnordered {
                ticks: self.recovery_ticks,
                hard_above: self.recovery_hard_above,
                reverse_above: self.recovery_reverse_above,
            });
        }
        for (field, value) in [
            ("hybrid.hard_reverse.steering", self.hard_reverse.steering),
            ("hybrid.hard_reverse.throttle", self.hard_reverse.throttle),
            ("hybrid.reverse.steering", self.reverse.steering),
            ("hybrid.reverse.throttle", self.reverse.throttle),
            ("hybrid.forward.steering", self.forward.steering),
            ("hybrid.forward.throttle", self.forward.throttle),
            ("hybrid.hard_steering", self.hard_steering),
            ("hybrid.soft_steering", self.soft_steering),
            ("hybrid.crashed_throttle", self.crashed_throttle),
            ("hybrid.near_edge_throttle", self.near_edge_throttle),
            ("hybrid.blocked_throttle", self.blocked_throttle),
            ("hybrid.clear_throttle", self.clear_throttle),
        ] {
            unit_range(field, value)?;
        }
        Ok(())
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            stuck_displacement: 2.0,
            stuck_speed: 0.5,
            stuck_limit: 20,
            recovery_ticks: 30,
            recovery_hard_above: 20,
            recovery_reverse_above: 10,
            hard_reverse: Maneuver {
                steering: 0.8,
                throttle: -0.6,
            },
            reverse: Maneuver {
                steering: 0.9,
                throttle: -0.4,
            },
            forward: Maneuver {
                steering: 0.5,
                throttle: 0.8,
            },
            edge_hard_distance: 20.0,
            edge_soft_distance: 35.0,
            hard_steering: 0.7,
            soft_steering: 0.3,
            crashed_throttle: 0.2,
            near_edge_distance: 18.0,
            near_edge_throttle: 0.4,
            front_clearance: 60.0,
            blocked_throttle: 0.6,
            clear_throttle: 1.0,
            sharp_steering: 0.5,
            sharp_throttle_scale: 0.8,
        }
    }
}

/// Throttle of the constant-speed controller per difficulty tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruiseConfig {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl CruiseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("cruise.easy", self.easy)?;
        unit_range("cruise.medium", self.medium)?;
        unit_range("cruise.hard", self.hard)
    }
}

impl Default for CruiseConfig {
    fn default() -> Self {
        Self {
            easy: 0.35,
            medium: 0.5,
            hard: 0.65,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Speed multiplier applied on every tick an agent is found colliding.
    pub crash_speed_factor: f64,
    pub max_ticks: u32,
    /// When set, crossing the finish coordinate only wins after every
    /// checkpoint has been passed.
    pub require_all_checkpoints: bool,
}

impl RaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("race.crash_speed_factor", self.crash_speed_factor)?;
        if self.max_ticks == 0 {
            return Err(ConfigError::NonPositive {
                field: "race.max_ticks",
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            crash_speed_factor: 0.5,
            max_ticks: 60 * DEFAULT_TICK_RATE,
            require_all_checkpoints: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub track: TrackConfig,
    pub agent: AgentConfig,
    pub hybrid: HybridConfig,
    pub cruise: CruiseConfig,
    pub race: RaceConfig,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.track.validate()?;
        self.agent.validate()?;
        self.hybrid.validate()?;
        self.cruise.validate()?;
        self.race.validate()
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default()
            .validate()
            .expect("default config must be valid");
    }

    #[test]
    fn centered_track_matches_field_layout() {
        let track = TrackConfig::centered(1200.0, 800.0);
        assert_eq!(track.x, 500.0);
        assert_eq!(track.y, 50.0);
        assert_eq!(track.length, 700.0);
        assert_eq!(track.width, 200.0);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{ "agent": { "max_speed": 10.0 }, "race": { "max_ticks": 5 } }"#)
                .expect("partial config should parse");
        assert_eq!(cfg.agent.max_speed, 10.0);
        assert_eq!(cfg.agent.sensor_range, 150.0);
        assert_eq!(cfg.race.max_ticks, 5);
        assert_eq!(cfg.hybrid, HybridConfig::default());
    }

    #[test]
    fn rejects_zero_sensor_step() {
        let mut cfg = SimConfig::default();
        cfg.agent.sensor_step = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                field: "agent.sensor_step",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_unordered_recovery_phases() {
        let mut cfg = HybridConfig::default();
        cfg.recovery_reverse_above = 25;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RecoveryPhasesUnordered { .. })
        ));
    }

    #[test]
    fn rejects_start_after_finish() {
        let mut cfg = TrackConfig::default();
        cfg.length = 50.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::StartBeyondFinish { .. })
        ));
    }
}
