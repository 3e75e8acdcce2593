use super::*;
use crate::agent::{Pose, SENSOR_COUNT};
use crate::config::AgentConfig;
use crate::track::Track;

const EPS: f64 = 1e-9;

fn agent_with(readings: [f64; SENSOR_COUNT], speed: f64, crashed: bool) -> Agent {
    let mut agent = Agent::new(
        AgentConfig::default(),
        Pose {
            x: 600.0,
            y: 400.0,
            heading: 180.0,
        },
    );
    agent.set_sensor_readings(readings);
    agent.set_speed(speed);
    if crashed {
        agent.mark_crashed(1.0);
    }
    agent
}

fn clear_readings() -> [f64; SENSOR_COUNT] {
    [150.0; SENSOR_COUNT]
}

fn with_sensor(index: usize, value: f64) -> [f64; SENSOR_COUNT] {
    let mut readings = clear_readings();
    readings[index] = value;
    readings
}

fn assert_action(actual: Action, steering: f64, throttle: f64) {
    assert!(
        (actual.steering - steering).abs() < EPS && (actual.throttle - throttle).abs() < EPS,
        "expected ({steering}, {throttle}), got ({}, {})",
        actual.steering,
        actual.throttle
    );
}

fn stationary_controller_after(ticks: u32, seed: u32) -> (HybridController, Agent, Action) {
    let mut controller = HybridController::new(HybridConfig::default(), seed);
    let agent = agent_with(clear_readings(), 0.0, false);
    let mut last = Action::default();
    for _ in 0..ticks {
        last = controller.compute(&agent);
    }
    (controller, agent, last)
}

#[test]
fn centered_in_lane_goes_straight_at_full_throttle() {
    let track = Track::default();
    let mut agent = Agent::new(AgentConfig::default(), track.start_pose(0));
    agent.reset(Pose {
        x: 600.0,
        y: 400.0,
        heading: 180.0,
    });
    agent.refresh_sensors(&track);
    assert!(agent.sensor(LEFT_SENSOR) >= 35.0 && agent.sensor(RIGHT_SENSOR) >= 35.0);

    let controller = HybridController::new(HybridConfig::default(), 1);
    assert_action(controller.decide(&agent), 0.0, 1.0);
}

#[test]
fn left_edge_close_steers_hard_right_and_slows() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let agent = agent_with(with_sensor(LEFT_SENSOR, 15.0), 4.0, false);
    // Near-edge throttle 0.4, scaled by 0.8 for the sharp correction.
    assert_action(controller.decide(&agent), 0.7, 0.32);
}

#[test]
fn right_edge_close_steers_hard_left() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let agent = agent_with(with_sensor(RIGHT_SENSOR, 15.0), 4.0, false);
    assert_action(controller.decide(&agent), -0.7, 0.32);
}

#[test]
fn left_takes_priority_when_both_edges_close() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let mut readings = with_sensor(LEFT_SENSOR, 19.0);
    readings[RIGHT_SENSOR] = 10.0;
    let agent = agent_with(readings, 4.0, false);
    assert_action(controller.decide(&agent), 0.7, 0.32);
}

#[test]
fn moderate_correction_keeps_full_throttle() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let agent = agent_with(with_sensor(LEFT_SENSOR, 30.0), 4.0, false);
    assert_action(controller.decide(&agent), 0.3, 1.0);

    let agent = agent_with(with_sensor(RIGHT_SENSOR, 34.9), 4.0, false);
    assert_action(controller.decide(&agent), -0.3, 1.0);
}

#[test]
fn hard_correction_between_near_edge_and_hard_edge() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    // 19 is under the hard-steer distance but not under the near-edge one.
    let agent = agent_with(with_sensor(RIGHT_SENSOR, 19.0), 4.0, false);
    assert_action(controller.decide(&agent), -0.7, 0.8);
}

#[test]
fn blocked_front_uses_mid_throttle() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let agent = agent_with(with_sensor(FORWARD_SENSOR, 50.0), 4.0, false);
    assert_action(controller.decide(&agent), 0.0, 0.6);
}

#[test]
fn crash_dominates_throttle() {
    let controller = HybridController::new(HybridConfig::default(), 1);
    let agent = agent_with(with_sensor(FORWARD_SENSOR, 100.0), 4.0, true);
    assert_action(controller.decide(&agent), 0.0, 0.2);

    let agent = agent_with(with_sensor(LEFT_SENSOR, 10.0), 4.0, true);
    assert_action(controller.decide(&agent), 0.7, 0.16);
}

#[test]
fn sharp_scaling_threshold_is_strict() {
    let cfg = HybridConfig {
        hard_steering: 0.5,
        ..HybridConfig::default()
    };
    let controller = HybridController::new(cfg, 1);
    let agent = agent_with(with_sensor(LEFT_SENSOR, 15.0), 4.0, false);
    assert_action(controller.decide(&agent), 0.5, 0.4);
}

#[test]
fn stationary_agent_enters_recovery_on_tick_21() {
    let (controller, _, _) = stationary_controller_after(20, 0xC0FF_EE11);
    assert_eq!(controller.phase(), ControllerPhase::Normal);
    assert_eq!(controller.stuck_counter(), 20);

    let (controller, _, action) = stationary_controller_after(21, 0xC0FF_EE11);
    assert_eq!(controller.stuck_counter(), 0);
    let direction = controller.recovery_direction();
    assert!(direction == -1 || direction == 1);
    // The entry tick already spends the first of the 30 maneuver ticks.
    assert_eq!(
        controller.phase(),
        ControllerPhase::Recovering {
            remaining: 29,
            direction
        }
    );
    assert_action(action, f64::from(direction) * 0.8, -0.6);
}

#[test]
fn recovery_runs_three_phases_and_terminates() {
    let (mut controller, agent, first) = stationary_controller_after(21, 0x1234_5678);
    let direction = f64::from(controller.recovery_direction());
    let mut actions = vec![first];
    while controller.phase() != ControllerPhase::Normal {
        let before = controller.recovery_timer();
        actions.push(controller.compute(&agent));
        assert!(controller.recovery_timer() < before);
        assert!(actions.len() <= 30, "recovery must end within 30 ticks");
    }

    assert_eq!(actions.len(), 30);
    for action in &actions[..9] {
        assert_action(*action, direction * 0.8, -0.6);
    }
    for action in &actions[9..19] {
        assert_action(*action, direction * 0.9, -0.4);
    }
    for action in &actions[19..] {
        assert_action(*action, direction * 0.5, 0.8);
    }
    assert_eq!(controller.stuck_counter(), 0);
    assert_eq!(controller.recovery_direction(), 0);

    // Back to normal logic on the next tick.
    assert_action(controller.compute(&agent), 0.0, 1.0);
    assert_eq!(controller.stuck_counter(), 1);
}

#[test]
fn crashed_agent_never_counts_as_stuck() {
    let mut controller = HybridController::new(HybridConfig::default(), 5);
    let agent = agent_with(clear_readings(), 0.0, true);
    for _ in 0..100 {
        controller.compute(&agent);
    }
    assert_eq!(controller.stuck_counter(), 0);
    assert_eq!(controller.phase(), ControllerPhase::Normal);
}

#[test]
fn movement_decays_stuck_counter() {
    let mut controller = HybridController::new(HybridConfig::default(), 5);
    let mut agent = agent_with(clear_readings(), 0.0, false);
    for _ in 0..10 {
        controller.compute(&agent);
    }
    assert_eq!(controller.stuck_counter(), 10);

    for i in 1..=4 {
        agent.reset(Pose {
            x: 600.0,
            y: 400.0 + 5.0 * i as f64,
            heading: 180.0,
        });
        controller.compute(&agent);
    }
    assert_eq!(controller.stuck_counter(), 6);
}

#[test]
fn slow_creep_below_displacement_still_counts() {
    let mut controller = HybridController::new(HybridConfig::default(), 5);
    let mut agent = agent_with(clear_readings(), 0.4, false);
    for i in 0..5 {
        agent.reset(Pose {
            x: 600.0,
            y: 400.0 + 0.4 * i as f64,
            heading: 180.0,
        });
        agent.set_speed(0.4);
        controller.compute(&agent);
    }
    assert_eq!(controller.stuck_counter(), 5);
}

#[test]
fn recovery_direction_is_reproducible_per_seed() {
    for seed in [1u32, 7, 0xDEAD_BEEF, 0xC0FF_EE11] {
        let (a, _, _) = stationary_controller_after(21, seed);
        let (b, _, _) = stationary_controller_after(21, seed);
        assert_eq!(a.recovery_direction(), b.recovery_direction());
    }
}

#[test]
fn reset_clears_state_and_reseeds() {
    let (mut controller, agent, _) = stationary_controller_after(25, 42);
    let first_direction = {
        let (c, _, _) = stationary_controller_after(21, 42);
        c.recovery_direction()
    };
    controller.reset(42);
    assert_eq!(controller.phase(), ControllerPhase::Normal);
    assert_eq!(controller.stuck_counter(), 0);
    for _ in 0..21 {
        controller.compute(&agent);
    }
    assert_eq!(controller.recovery_direction(), first_direction);
}

#[test]
fn outputs_stay_in_unit_range_for_adversarial_inputs() {
    let wild = HybridConfig {
        hard_steering: 4.0,
        soft_steering: -3.0,
        crashed_throttle: 9.0,
        near_edge_throttle: -7.5,
        blocked_throttle: f64::INFINITY,
        clear_throttle: -2.0,
        sharp_throttle_scale: 11.0,
        forward: Maneuver {
            steering: 3.0,
            throttle: 2.0,
        },
        ..HybridConfig::default()
    };

    let mut rng = SeededRng::new(0xBADC_0DED);
    for cfg in [HybridConfig::default(), wild] {
        let mut controller = HybridController::new(cfg, 3);
        for _ in 0..2_000 {
            let mut readings = [0.0; SENSOR_COUNT];
            for r in readings.iter_mut() {
                *r = rng.next_unit() * 200.0 - 25.0;
            }
            let speed = rng.next_unit() * 20.0 - 10.0;
            let crashed = rng.next() & 1 == 0;
            let agent = agent_with(readings, speed, crashed);
            let action = controller.compute(&agent);
            assert!((-1.0..=1.0).contains(&action.steering), "{action:?}");
            assert!((-1.0..=1.0).contains(&action.throttle), "{action:?}");
        }
    }
}
