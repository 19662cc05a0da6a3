//! Fixed timestep simulation tick
//!
//! Advances the plant and controller by one `dt`. The order within a tick is:
//! command, coil lag, gravity and disturbance, semi-implicit Euler, bounds
//! check, sensor.

use super::state::{Controls, Phase, SensedState, Simulation};
use crate::clamp_symmetric;

/// Advance the simulation by one fixed timestep
///
/// Returns the phase after the tick. A failed simulation is left untouched.
pub fn step(sim: &mut Simulation, controls: &Controls) -> Phase {
    if sim.phase == Phase::Failed {
        return Phase::Failed;
    }

    let dt = sim.config.dt;
    let gravity_on = controls.gravity_enabled && sim.config.has_gravity();
    let actuator = sim.config.actuator;
    let sensor = sim.config.sensor;

    // Force command, or current command when a coil is fitted
    let command = if controls.control_enabled {
        // Controller reads the held sensor sample when one is fitted
        let (pos, vel) = match sensor {
            Some(_) => (sim.sensed.pos, sim.sensed.vel),
            None => (sim.state.pos, sim.state.vel),
        };
        let mut command = -controls.gain * (sim.config.kp * pos + sim.config.kd * vel);
        if gravity_on {
            let mag_k = actuator.map_or(1.0, |a| a.mag_k);
            command.y -= sim.config.gravity / mag_k;
        }
        command
    } else {
        sim.config.open_loop_gain * sim.state.pos
    };

    let mut force = match actuator {
        Some(params) => {
            let target = clamp_symmetric(command, params.i_max);
            let current = sim.actuator.current;
            let lagged = current + (target - current) * dt / params.time_constant;
            sim.actuator.current = clamp_symmetric(lagged, params.i_max);
            // Linear in current
            params.mag_k * sim.actuator.current
        }
        None => command,
    };

    // Free fall only while uncontrolled; the controller carries the feed-forward
    if gravity_on && !controls.control_enabled {
        force.y += sim.config.gravity;
    }

    force += sim.noise_vec(controls.noise);

    sim.state.vel += force * dt;
    sim.state.pos += sim.state.vel * dt;
    sim.time_ticks += 1;

    if !sim.view.contains(sim.state.pos, sim.config.object_radius_px) {
        sim.phase = Phase::Failed;
        log::warn!(
            "Object left the chamber at tick {} (x={:.4}, y={:.4})",
            sim.time_ticks,
            sim.state.pos.x,
            sim.state.pos.y
        );
        return Phase::Failed;
    }

    if let Some(sensor) = sensor {
        sim.sensor_timer += dt;
        if sim.sensor_timer >= sensor.period {
            let measurement_noise = sim.noise_vec(controls.noise * sensor.noise_scale);
            sim.sensed = SensedState {
                pos: sim.state.pos + measurement_noise,
                vel: sim.state.vel,
            };
            sim.sensor_timer = 0.0;
            log::trace!("Sensor sample at tick {}", sim.time_ticks);
        }
    }

    Phase::Running
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActuatorParams, Revision, SimConfig};
    use crate::consts::*;
    use crate::sim::KinematicState;
    use glam::DVec2;
    use proptest::prelude::*;

    fn sim(revision: Revision) -> Simulation {
        Simulation::new(SimConfig::preset(revision), 12345)
    }

    fn open_loop() -> Controls {
        Controls {
            control_enabled: false,
            gain: 1.0,
            noise: 0.0,
            gravity_enabled: false,
        }
    }

    fn closed_loop(gravity_enabled: bool) -> Controls {
        Controls {
            control_enabled: true,
            gain: 1.0,
            noise: 0.0,
            gravity_enabled,
        }
    }

    /// Drive a simulation out of the chamber in one tick
    fn failed_sim(revision: Revision) -> Simulation {
        let mut sim = sim(revision).with_state(KinematicState::new(0.8, 0.0, 5.0, 0.0));
        assert_eq!(step(&mut sim, &open_loop()), Phase::Failed);
        sim
    }

    #[test]
    fn test_failed_step_is_noop() {
        for revision in Revision::ALL {
            let mut sim = failed_sim(revision);
            let state = *sim.state();
            let sensed = *sim.sensed();
            let actuator = *sim.actuator();
            let timer = sim.sensor_timer();
            let ticks = sim.time_ticks();

            let noisy = Controls {
                noise: 1.0,
                gravity_enabled: true,
                ..Controls::default()
            };
            for _ in 0..50 {
                assert_eq!(step(&mut sim, &noisy), Phase::Failed);
            }

            assert_eq!(*sim.state(), state);
            assert_eq!(*sim.sensed(), sensed);
            assert_eq!(*sim.actuator(), actuator);
            assert_eq!(sim.sensor_timer(), timer);
            assert_eq!(sim.time_ticks(), ticks);
        }
    }

    #[test]
    fn test_reset_clears_failure_and_state() {
        let mut sim = failed_sim(Revision::Actuated);
        sim.actuator.current = DVec2::new(1.5, -1.0);
        sim.sensor_timer = 0.01;

        sim.reset();

        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(*sim.state(), KinematicState::new(0.0, 0.0, 0.02, -0.015));
        assert_eq!(sim.sensed().pos, DVec2::ZERO);
        assert_eq!(sim.actuator().current, DVec2::ZERO);
        assert_eq!(sim.sensor_timer(), 0.0);
        assert_eq!(sim.time_ticks(), 0);

        // Running again after reset
        assert_eq!(step(&mut sim, &closed_loop(false)), Phase::Running);
    }

    #[test]
    fn test_open_loop_diverges_monotonically() {
        for revision in [Revision::Gravity, Revision::Actuated] {
            let mut sim = sim(revision).with_state(KinematicState::new(0.01, -0.02, 0.0, 0.0));
            let mut last = sim.state().pos.length();
            let mut ticks = 0;
            while step(&mut sim, &open_loop()) == Phase::Running {
                let r = sim.state().pos.length();
                assert!(r > last, "{}: |pos| shrank at tick {}", revision.as_str(), ticks);
                last = r;
                ticks += 1;
                assert!(ticks < 10_000, "never left the chamber");
            }
            // Exponential growth eventually loses the object
            assert!(sim.is_failed());
        }
    }

    #[test]
    fn test_basic_has_no_open_loop_force() {
        let mut sim = sim(Revision::Basic).with_state(KinematicState::new(0.1, 0.1, 0.0, 0.0));
        for _ in 0..100 {
            step(&mut sim, &open_loop());
        }
        assert_eq!(sim.state().pos, DVec2::new(0.1, 0.1));
        assert_eq!(sim.state().vel, DVec2::ZERO);
    }

    #[test]
    fn test_pd_control_converges() {
        for revision in Revision::ALL {
            for gravity in [false, true] {
                let mut sim = sim(revision).with_state(KinematicState::new(0.3, -0.2, 0.1, 0.05));
                for _ in 0..2000 {
                    assert_eq!(step(&mut sim, &closed_loop(gravity)), Phase::Running);
                }
                // Feed-forward with no plant gravity lifts the rest point above center
                let rest_y = if gravity && sim.config().has_gravity() {
                    -GRAVITY / KP
                } else {
                    0.0
                };
                let state = sim.state();
                assert!(
                    (state.pos - DVec2::new(0.0, rest_y)).length() < 1e-4
                        && state.vel.length() < 1e-4,
                    "{} (gravity {}) did not settle: {:?}",
                    revision.as_str(),
                    gravity,
                    state
                );
            }
        }
    }

    #[test]
    fn test_gravity_accelerates_down_when_uncontrolled() {
        let mut sim = sim(Revision::Gravity).with_state(KinematicState::default());
        let controls = Controls {
            gravity_enabled: true,
            ..open_loop()
        };
        step(&mut sim, &controls);
        assert!((sim.state().vel.y - GRAVITY * DT).abs() < 1e-15);
        assert!((sim.state().pos.y - GRAVITY * DT * DT).abs() < 1e-15);
        assert_eq!(sim.state().vel.x, 0.0);
    }

    #[test]
    fn test_feed_forward_rest_point_scales_with_gain() {
        for gain in [1.0, 2.0] {
            let mut sim = sim(Revision::Gravity).with_state(KinematicState::default());
            let controls = Controls {
                gain,
                ..closed_loop(true)
            };
            for _ in 0..3000 {
                step(&mut sim, &controls);
            }
            let expected = -GRAVITY / (gain * KP);
            assert!((sim.state().pos.y - expected).abs() < 1e-9, "gain {}", gain);
            assert!(sim.state().pos.x.abs() < 1e-12);
            assert!(sim.state().vel.length() < 1e-9);
        }
    }

    #[test]
    fn test_no_free_fall_while_controlled() {
        // First tick from rest: only the feed-forward acts, pushing up
        let mut sim = sim(Revision::Gravity).with_state(KinematicState::default());
        step(&mut sim, &closed_loop(true));
        assert!((sim.state().vel.y + GRAVITY * DT).abs() < 1e-15);
    }

    #[test]
    fn test_open_loop_command_goes_through_coil() {
        let mut sim = sim(Revision::Actuated).with_state(KinematicState::new(0.3, 0.0, 0.0, 0.0));
        step(&mut sim, &open_loop());

        let expected = OPEN_LOOP_GAIN * 0.3 * DT / COIL_TIME_CONSTANT;
        assert!((sim.actuator().current.x - expected).abs() < 1e-12);
        assert_eq!(sim.actuator().current.y, 0.0);
        // Force comes from the lagged current, not the raw command
        assert!((sim.state().vel.x - MAG_K * expected * DT).abs() < 1e-15);
    }

    #[test]
    fn test_open_loop_current_is_clamped() {
        let mut config = SimConfig::preset(Revision::Actuated);
        config.actuator = Some(ActuatorParams {
            i_max: 0.1,
            ..ActuatorParams::default()
        });
        let mut sim = Simulation::new(config, 1).with_state(KinematicState::new(0.3, 0.0, 0.0, 0.0));
        for _ in 0..50 {
            assert_eq!(step(&mut sim, &open_loop()), Phase::Running);
            assert!(sim.actuator().current.x <= 0.1);
        }
        assert!((sim.actuator().current.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_controls_fail() {
        let mut sim = sim(Revision::Gravity);
        let controls = Controls {
            noise: f64::NAN,
            ..closed_loop(false)
        };
        assert_eq!(step(&mut sim, &controls), Phase::Failed);

        let mut sim = sim_with(Revision::Basic, KinematicState::default());
        let controls = Controls {
            gain: f64::INFINITY,
            ..closed_loop(false)
        };
        sim.state.pos = DVec2::new(0.1, 0.0);
        assert_eq!(step(&mut sim, &controls), Phase::Failed);
    }

    #[test]
    fn test_gravity_toggle_ignored_by_basic() {
        let mut with = sim(Revision::Basic);
        let mut without = sim(Revision::Basic);
        let gravity = Controls {
            gravity_enabled: true,
            ..open_loop()
        };
        for _ in 0..20 {
            step(&mut with, &gravity);
            step(&mut without, &open_loop());
        }
        assert_eq!(with.state(), without.state());
    }

    #[test]
    fn test_noise_perturbs_force_not_position() {
        let mut sim = sim(Revision::Basic).with_state(KinematicState::default());
        let controls = Controls {
            noise: 1.0,
            ..open_loop()
        };
        step(&mut sim, &controls);
        let state = sim.state();
        assert!(state.vel.x.abs() <= 0.5 * DT && state.vel.y.abs() <= 0.5 * DT);
        assert!(state.vel.length() > 0.0);
        // Semi-implicit Euler: displacement comes only through velocity
        assert!((state.pos - state.vel * DT).length() < 1e-15);
    }

    #[test]
    fn test_boundary_exact_without_radius() {
        // Resting exactly on the bottom wall stays inside
        let mut sim = sim(Revision::Basic).with_state(KinematicState::new(0.0, 0.5, 0.0, 0.0));
        assert_eq!(step(&mut sim, &open_loop()), Phase::Running);
        assert_eq!(sim.pixel_pos().y, 400.0);

        // Any motion past it fails
        let mut sim = sim_with(Revision::Basic, KinematicState::new(0.0, 0.5, 0.0, 1e-6));
        assert_eq!(step(&mut sim, &open_loop()), Phase::Failed);

        let mut sim = sim_with(Revision::Basic, KinematicState::new(0.0, -0.5, 0.0, 0.0));
        assert_eq!(step(&mut sim, &open_loop()), Phase::Running);
        let mut sim = sim_with(Revision::Basic, KinematicState::new(0.0, -0.5, 0.0, -1e-6));
        assert_eq!(step(&mut sim, &open_loop()), Phase::Failed);
    }

    #[test]
    fn test_bounds_account_for_radius_only_when_actuated() {
        let start = KinematicState::new(0.0, 0.48, 0.0, 0.0);

        let mut point = sim_with(Revision::Gravity, start);
        assert_eq!(step(&mut point, &open_loop()), Phase::Running);

        let mut disc = sim_with(Revision::Actuated, start);
        assert_eq!(step(&mut disc, &open_loop()), Phase::Failed);

        let mut disc = sim_with(Revision::Actuated, KinematicState::new(0.0, 0.4, 0.0, 0.0));
        assert_eq!(step(&mut disc, &open_loop()), Phase::Running);
    }

    fn sim_with(revision: Revision, state: KinematicState) -> Simulation {
        sim(revision).with_state(state)
    }

    #[test]
    fn test_sensor_samples_at_period() {
        let mut sim = sim(Revision::Actuated);
        let controls = closed_loop(false);
        let mut last = *sim.sensed();

        // dt = 0.016, period = 0.02: a sample lands every second tick
        for tick in 1..=20 {
            step(&mut sim, &controls);
            let sensed = *sim.sensed();
            if tick % 2 == 0 {
                assert_eq!(sensed.pos, sim.state().pos, "tick {}", tick);
                assert_eq!(sensed.vel, sim.state().vel, "tick {}", tick);
                assert_eq!(sim.sensor_timer(), 0.0);
            } else {
                assert_eq!(sensed, last, "tick {} resampled early", tick);
                assert_ne!(sensed.pos, sim.state().pos);
                assert!((sim.sensor_timer() - DT).abs() < 1e-15);
            }
            last = sensed;
        }
    }

    #[test]
    fn test_controller_uses_held_sample() {
        let mut sim = sim(Revision::Actuated);
        sim.sensed = SensedState {
            pos: DVec2::new(0.1, 0.0),
            vel: DVec2::ZERO,
        };
        step(&mut sim, &closed_loop(false));

        // Command from the sample: -(Kp * 0.1) = -0.6, lagged by dt / tau
        let expected = -KP * 0.1 * DT / COIL_TIME_CONSTANT;
        assert!((sim.actuator().current.x - expected).abs() < 1e-12);
        assert_eq!(sim.actuator().current.y, 0.0);
    }

    #[test]
    fn test_sensor_velocity_is_exact_under_noise() {
        let mut sim = sim(Revision::Actuated);
        let controls = Controls {
            noise: 0.05,
            ..closed_loop(false)
        };
        step(&mut sim, &controls);
        step(&mut sim, &controls);
        assert_eq!(sim.sensed().vel, sim.state().vel);
        assert_ne!(sim.sensed().pos, sim.state().pos);
        assert!((sim.sensed().pos - sim.state().pos).abs().max_element() <= 0.025);
    }

    #[test]
    fn test_actuator_saturates() {
        let mut sim = sim(Revision::Actuated).with_state(KinematicState::new(0.3, -0.3, 0.0, 0.0));
        let controls = Controls {
            gain: 1000.0,
            ..closed_loop(false)
        };
        for _ in 0..3 {
            step(&mut sim, &controls);
            let current = sim.actuator().current;
            assert!(current.x.abs() <= I_MAX && current.y.abs() <= I_MAX);
        }
    }

    #[test]
    fn test_determinism() {
        let controls = Controls {
            noise: 0.05,
            ..closed_loop(true)
        };
        let mut a = sim(Revision::Actuated);
        let mut b = sim(Revision::Actuated);
        let mut c = Simulation::new(SimConfig::preset(Revision::Actuated), 54321);
        for _ in 0..500 {
            step(&mut a, &controls);
            step(&mut b, &controls);
            step(&mut c, &controls);
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.sensed(), b.sensed());
        assert_ne!(a.state(), c.state());
    }

    proptest! {
        #[test]
        fn actuator_current_never_exceeds_limit(
            x in -0.8f64..0.8,
            y in -0.45f64..0.45,
            vx in -2.0f64..2.0,
            vy in -2.0f64..2.0,
            gain in 0.0f64..10_000.0,
            noise in 0.0f64..1.0,
            gravity_enabled in any::<bool>(),
        ) {
            let mut sim = Simulation::new(SimConfig::preset(Revision::Actuated), 9)
                .with_state(KinematicState::new(x, y, vx, vy));
            let controls = Controls { control_enabled: true, gain, noise, gravity_enabled };
            for _ in 0..20 {
                step(&mut sim, &controls);
                let current = sim.actuator().current;
                prop_assert!(current.x.abs() <= I_MAX);
                prop_assert!(current.y.abs() <= I_MAX);
            }
        }

        #[test]
        fn failed_simulation_never_changes(
            gain in 0.0f64..100.0,
            noise in 0.0f64..1.0,
            control_enabled in any::<bool>(),
            gravity_enabled in any::<bool>(),
        ) {
            let mut sim = failed_sim(Revision::Actuated);
            let state = *sim.state();
            let controls = Controls { control_enabled, gain, noise, gravity_enabled };
            prop_assert_eq!(step(&mut sim, &controls), Phase::Failed);
            prop_assert_eq!(*sim.state(), state);
        }
    }
}
