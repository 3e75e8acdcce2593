//! Kinematic agent with a ring of distance sensors.
//!
//! Headings are in degrees, 0 facing north (negative y) and increasing
//! clockwise. Motion and sensor rays share the same projection.

use serde::Serialize;

use crate::config::AgentConfig;
use crate::controller::Action;
use crate::track::{Point, Track};

pub const SENSOR_COUNT: usize = 16;
/// Normalized speed followed by every normalized sensor reading.
pub const STATE_LEN: usize = SENSOR_COUNT + 1;
pub const SENSOR_SPACING_DEG: f64 = 360.0 / SENSOR_COUNT as f64;

pub const FORWARD_SENSOR: usize = 0;
pub const RIGHT_SENSOR: usize = 4;
pub const LEFT_SENSOR: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// Keyboard-style control signals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualInput {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

impl ManualInput {
    /// Equivalent controller action, as stored by recorders.
    pub fn as_action(self) -> Action {
        let steering = if self.steer_left {
            -1.0
        } else if self.steer_right {
            1.0
        } else {
            0.0
        };
        let throttle = if self.accelerate {
            1.0
        } else if self.brake {
            -0.5
        } else {
            0.0
        };
        Action::new(steering, throttle)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub speed: f64,
    pub sensors: [f64; SENSOR_COUNT],
    pub checkpoints: usize,
    pub total_distance: f64,
    pub crashed: bool,
}

#[derive(Clone, Debug)]
pub struct Agent {
    cfg: AgentConfig,
    x: f64,
    y: f64,
    heading: f64,
    speed: f64,
    sensors: [f64; SENSOR_COUNT],
    checkpoints: usize,
    total_distance: f64,
    crashed: bool,
    prev: Point,
}

/// Unit vector for a heading in degrees.
pub fn heading_vector(heading_deg: f64) -> (f64, f64) {
    let rad = heading_deg.to_radians();
    (rad.sin(), -rad.cos())
}

impl Agent {
    pub fn new(cfg: AgentConfig, pose: Pose) -> Self {
        let mut agent = Self {
            cfg,
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            speed: 0.0,
            sensors: [0.0; SENSOR_COUNT],
            checkpoints: 0,
            total_distance: 0.0,
            crashed: false,
            prev: Point::default(),
        };
        agent.reset(pose);
        agent
    }

    pub fn reset(&mut self, pose: Pose) {
        self.x = pose.x;
        self.y = pose.y;
        self.heading = pose.heading.rem_euclid(360.0);
        self.speed = 0.0;
        self.sensors = [0.0; SENSOR_COUNT];
        self.checkpoints = 0;
        self.total_distance = 0.0;
        self.crashed = false;
        self.prev = Point::new(pose.x, pose.y);
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn previous_position(&self) -> Point {
        self.prev
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn sensors(&self) -> &[f64; SENSOR_COUNT] {
        &self.sensors
    }

    pub fn sensor(&self, index: usize) -> f64 {
        self.sensors[index]
    }

    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn crashed(&self) -> bool {
        self.crashed
    }

    /// Sets speed directly, clamped to the reverse/forward limits.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(self.cfg.reverse_limit(), self.cfg.max_speed);
    }

    /// Replaces the sensor ring with synthetic readings, clamped to the
    /// sensor range. Used to probe controllers with states that never come
    /// out of a real track.
    pub fn set_sensor_readings(&mut self, readings: [f64; SENSOR_COUNT]) {
        let range = self.cfg.sensor_range;
        self.sensors = readings.map(|d| if d.is_nan() { 0.0 } else { d.clamp(0.0, range) });
    }

    pub fn refresh_sensors(&mut self, track: &Track) {
        let range = self.cfg.sensor_range;
        let step = self.cfg.sensor_step;
        for (i, reading) in self.sensors.iter_mut().enumerate() {
            let (dx, dy) = heading_vector(self.heading + i as f64 * SENSOR_SPACING_DEG);
            let mut distance = 0.0;
            while distance < range {
                distance += step;
                let sample = Point::new(self.x + dx * distance, self.y + dy * distance);
                if !track.is_within_bounds(sample) {
                    break;
                }
            }
            *reading = distance.min(range);
        }
    }

    pub fn apply_manual_input(&mut self, input: ManualInput) {
        if input.accelerate {
            self.speed = (self.speed + self.cfg.acceleration).min(self.cfg.max_speed);
        }
        if input.brake {
            self.speed = (self.speed - self.cfg.acceleration).max(self.cfg.reverse_limit());
        }
        if self.speed.abs() > self.cfg.steer_min_speed {
            if input.steer_left {
                self.turn(-self.cfg.turn_rate);
            }
            if input.steer_right {
                self.turn(self.cfg.turn_rate);
            }
        }
    }

    pub fn apply_controller_action(&mut self, action: Action) {
        let action = action.clamped();
        let target = (action.throttle * self.cfg.max_speed)
            .clamp(self.cfg.reverse_limit(), self.cfg.max_speed);
        if self.speed < target {
            self.speed = (self.speed + self.cfg.acceleration).min(target);
        } else if self.speed > target {
            self.speed = (self.speed - self.cfg.acceleration).max(target);
        }

        if self.speed.abs() > self.cfg.steer_min_speed {
            self.turn(action.steering * self.cfg.turn_rate);
        }
    }

    fn turn(&mut self, degrees: f64) {
        self.heading = (self.heading + degrees).rem_euclid(360.0);
    }

    pub fn integrate(&mut self) {
        self.prev = self.position();

        if self.speed > 0.0 {
            self.speed = (self.speed - self.cfg.friction).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + self.cfg.friction).min(0.0);
        }

        let (dx, dy) = heading_vector(self.heading);
        self.x += dx * self.speed;
        self.y += dy * self.speed;
        self.total_distance += self.speed.abs();
    }

    /// Rectangle corners rotated by heading around the agent's center.
    pub fn corners(&self) -> [Point; 4] {
        let rad = self.heading.to_radians();
        let (sin, cos) = rad.sin_cos();
        let hw = self.cfg.width / 2.0;
        let hh = self.cfg.height / 2.0;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(lx, ly)| {
            Point::new(
                lx * cos - ly * sin + self.x,
                lx * sin + ly * cos + self.y,
            )
        })
    }

    pub fn state_vector(&self) -> [f64; STATE_LEN] {
        let mut state = [0.0; STATE_LEN];
        state[0] = self.speed / self.cfg.max_speed;
        for (slot, reading) in state[1..].iter_mut().zip(self.sensors.iter()) {
            *slot = reading / self.cfg.sensor_range;
        }
        state
    }

    /// Sets the sticky crash flag and damps speed by `speed_factor`.
    pub fn mark_crashed(&mut self, speed_factor: f64) {
        self.crashed = true;
        self.speed *= speed_factor;
    }

    /// Counts one more checkpoint, never past `total`.
    pub fn advance_checkpoint(&mut self, total: usize) {
        if self.checkpoints < total {
            self.checkpoints += 1;
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            x: self.x,
            y: self.y,
            heading: self.heading,
            speed: self.speed,
            sensors: self.sensors,
            checkpoints: self.checkpoints,
            total_distance: self.total_distance,
            crashed: self.crashed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn agent(x: f64, y: f64, heading: f64) -> Agent {
        Agent::new(AgentConfig::default(), Pose { x, y, heading })
    }

    #[test]
    fn integrate_moves_along_heading() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.set_speed(4.0);
        a.integrate();
        // Friction first, then displacement.
        assert!((a.speed() - 3.95).abs() < EPS);
        assert!((a.position().y - 403.95).abs() < EPS);
        assert!((a.position().x - 600.0).abs() < 1e-6);
        assert_eq!(a.previous_position(), Point::new(600.0, 400.0));
        assert!((a.total_distance() - 3.95).abs() < EPS);

        let mut east = agent(600.0, 400.0, 90.0);
        east.set_speed(2.0);
        east.integrate();
        assert!((east.position().x - 601.95).abs() < EPS);
    }

    #[test]
    fn friction_never_overshoots_zero() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.set_speed(0.03);
        a.integrate();
        assert_eq!(a.speed(), 0.0);

        a.set_speed(-0.02);
        a.integrate();
        assert_eq!(a.speed(), 0.0);
    }

    #[test]
    fn reverse_distance_still_accumulates() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.set_speed(-2.0);
        a.integrate();
        assert!((a.total_distance() - 1.95).abs() < EPS);
        assert!(a.position().y < 400.0);
    }

    #[test]
    fn controller_action_moves_one_increment_toward_target() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.apply_controller_action(Action::new(0.0, 1.0));
        assert!((a.speed() - 0.3).abs() < EPS);

        a.set_speed(5.0);
        a.apply_controller_action(Action::new(0.0, 0.5));
        assert!((a.speed() - 4.7).abs() < EPS);

        a.set_speed(4.1);
        a.apply_controller_action(Action::new(0.0, 0.5));
        assert_eq!(a.speed(), 4.0);
    }

    #[test]
    fn reverse_target_is_bounded() {
        let mut a = agent(600.0, 400.0, 180.0);
        for _ in 0..100 {
            a.apply_controller_action(Action::new(0.0, -1.0));
        }
        assert_eq!(a.speed(), -4.0);
    }

    #[test]
    fn steering_needs_speed() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.apply_controller_action(Action::new(1.0, 0.0));
        assert_eq!(a.heading(), 180.0);

        a.set_speed(3.0);
        a.apply_controller_action(Action::new(1.0, 3.0 / 8.0));
        assert!((a.heading() - 184.0).abs() < EPS);

        a.apply_controller_action(Action::new(-0.5, 3.0 / 8.0));
        assert!((a.heading() - 182.0).abs() < EPS);
    }

    #[test]
    fn out_of_range_action_is_clamped() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.set_speed(3.0);
        a.apply_controller_action(Action::new(7.0, 9.0));
        assert!((a.heading() - 184.0).abs() < EPS);
        assert!((a.speed() - 3.3).abs() < EPS);
    }

    #[test]
    fn manual_input_matches_keyboard_semantics() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.apply_manual_input(ManualInput {
            accelerate: true,
            steer_left: true,
            ..ManualInput::default()
        });
        assert!((a.speed() - 0.3).abs() < EPS);
        assert_eq!(a.heading(), 180.0);

        a.set_speed(2.0);
        a.apply_manual_input(ManualInput {
            steer_left: true,
            ..ManualInput::default()
        });
        assert!((a.heading() - 176.0).abs() < EPS);

        for _ in 0..100 {
            a.apply_manual_input(ManualInput {
                brake: true,
                ..ManualInput::default()
            });
        }
        assert_eq!(a.speed(), -4.0);

        for _ in 0..100 {
            a.apply_manual_input(ManualInput {
                accelerate: true,
                ..ManualInput::default()
            });
        }
        assert_eq!(a.speed(), 8.0);
    }

    #[test]
    fn manual_action_equivalents() {
        let input = ManualInput {
            brake: true,
            steer_right: true,
            ..ManualInput::default()
        };
        assert_eq!(input.as_action(), Action::new(1.0, -0.5));
        assert_eq!(ManualInput::default().as_action(), Action::new(0.0, 0.0));
    }

    #[test]
    fn corners_follow_heading() {
        let a = agent(100.0, 100.0, 90.0);
        let corners = a.corners();
        // Rotated a quarter turn, the 40x60 body spans 60 along x.
        let min_x = corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max);
        assert!((max_x - min_x - 60.0).abs() < 1e-6);
        assert!((max_y - min_y - 40.0).abs() < 1e-6);
    }

    #[test]
    fn sensors_measure_distance_to_lane_edges() {
        let track = Track::default();
        let mut a = agent(600.0, 400.0, 180.0);
        a.refresh_sensors(&track);
        // Lane spans x in [500, 700]; facing south, right points west.
        assert_eq!(a.sensor(RIGHT_SENSOR), 105.0);
        assert_eq!(a.sensor(LEFT_SENSOR), 105.0);
        assert_eq!(a.sensor(FORWARD_SENSOR), 150.0);

        let mut near_left_edge = agent(690.0, 400.0, 180.0);
        near_left_edge.refresh_sensors(&track);
        assert_eq!(near_left_edge.sensor(LEFT_SENSOR), 15.0);
        assert_eq!(near_left_edge.sensor(RIGHT_SENSOR), 150.0);
    }

    #[test]
    fn state_vector_is_normalized() {
        let track = Track::default();
        let mut a = agent(690.0, 400.0, 180.0);
        a.set_speed(-4.0);
        a.refresh_sensors(&track);
        let state = a.state_vector();
        assert_eq!(state.len(), STATE_LEN);
        assert_eq!(state[0], -0.5);
        assert!((state[1 + LEFT_SENSOR] - 0.1).abs() < EPS);
        assert!(state[1..].iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn synthetic_readings_are_clamped() {
        let mut a = agent(600.0, 400.0, 180.0);
        let mut readings = [75.0; SENSOR_COUNT];
        readings[0] = -3.0;
        readings[1] = 900.0;
        readings[2] = f64::NAN;
        a.set_sensor_readings(readings);
        assert_eq!(a.sensor(0), 0.0);
        assert_eq!(a.sensor(1), 150.0);
        assert_eq!(a.sensor(2), 0.0);
        assert_eq!(a.sensor(3), 75.0);
    }

    #[test]
    fn crash_is_sticky_until_reset() {
        let mut a = agent(600.0, 400.0, 180.0);
        a.set_speed(6.0);
        a.mark_crashed(0.5);
        assert!(a.crashed());
        assert_eq!(a.speed(), 3.0);
        a.integrate();
        assert!(a.crashed());

        a.advance_checkpoint(5);
        a.reset(Pose {
            x: 550.0,
            y: 90.0,
            heading: 180.0,
        });
        assert!(!a.crashed());
        assert_eq!(a.checkpoints(), 0);
        assert_eq!(a.speed(), 0.0);
        assert_eq!(a.total_distance(), 0.0);
        assert_eq!(a.previous_position(), Point::new(550.0, 90.0));
    }

    #[test]
    fn checkpoint_count_is_bounded() {
        let mut a = agent(600.0, 400.0, 180.0);
        for _ in 0..10 {
            a.advance_checkpoint(5);
        }
        assert_eq!(a.checkpoints(), 5);
    }
}
