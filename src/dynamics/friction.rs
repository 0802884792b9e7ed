// ==============================================================================
// friction.rs — SIMPLIFIED SLIP FRICTION (FORWARD + SIDE + ROLL + SPIN)
// ==============================================================================
// For every grounded wheel:
// - forward force:  engine * forward_acceleration
//                   - brake * sat(v_forward / brake_deadzone)
//                   - rolling_resistance * v_forward / friction_slip
// - side force:     -v_side * side_acceleration * mass_share / dt
//                   (the force that would cancel side slip within one tick)
// - friction circle: |(fwd, side)| <= friction_slip * suspension_force.
//                   The scale factor is kept as the wheel's skid factor.
// - roll influence: the side force acts at the contact point pulled towards
//                   the centre-of-mass height by (1 - roll_influence)
//
// rolling_resistance and friction_slip are single tunable scalars, not a
// tire curve.
//
// Outputs are accumulated into a Wrench by vehicle.rs and applied once.
// ==============================================================================

use rapier3d::math::{Point, Real, Vector};

use crate::backend::ChassisState;
use crate::config::{VehicleTuning, WheelConfig};
use crate::dynamics::Wrench;
use crate::dynamics::kinematics::{slip_components, wheel_basis};
use crate::dynamics::wheel::{Wheel, WheelInput};

/// Everything the friction pass needs besides the wheel itself.
#[derive(Debug, Clone, Copy)]
pub struct FrictionContext<'a> {
    pub dt: Real,
    pub chassis: &'a ChassisState,
    pub chassis_forward: Vector<Real>,
    pub chassis_up: Vector<Real>,
    /// Chassis mass divided by the number of grounded wheels.
    pub mass_share: Real,
    pub tuning: &'a VehicleTuning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireForce {
    pub forward: Real,
    pub side: Real,
    pub skid_factor: Real,
}

pub fn forward_force(
    config: &WheelConfig,
    input: &WheelInput,
    v_forward: Real,
    tuning: &VehicleTuning,
) -> Real {
    let drive = input.engine_force * config.forward_acceleration;

    // Opposes motion, ramps to zero at standstill instead of chattering.
    let brake = -input.brake_force * (v_forward / tuning.brake_deadzone).clamp(-1.0, 1.0);

    let rolling = if config.friction_slip > 0.0 {
        -tuning.rolling_resistance * v_forward / config.friction_slip
    } else {
        0.0
    };

    drive + brake + rolling
}

pub fn side_force(config: &WheelConfig, v_side: Real, mass_share: Real, dt: Real) -> Real {
    -v_side * config.side_acceleration * mass_share / dt
}

/// Scales `(forward, side)` back onto the circle of radius `limit`.
pub fn friction_circle(forward: Real, side: Real, limit: Real) -> TireForce {
    let magnitude = (forward * forward + side * side).sqrt();

    if magnitude > limit {
        let skid_factor = if magnitude > 0.0 { limit / magnitude } else { 0.0 };
        TireForce {
            forward: forward * skid_factor,
            side: side * skid_factor,
            skid_factor,
        }
    } else {
        TireForce {
            forward,
            side,
            skid_factor: 1.0,
        }
    }
}

/// Contact point moved towards the centre-of-mass height along `up`.
/// With roll_influence = 0 the side force produces no roll torque.
pub fn roll_application_point(
    contact: Point<Real>,
    com: Point<Real>,
    up: Vector<Real>,
    roll_influence: Real,
) -> Point<Real> {
    let height = up.dot(&(contact - com));
    contact - up * (height * (1.0 - roll_influence))
}

/// Friction for one grounded wheel. Updates the wheel's slip/force/skid state
/// and adds its forces to `wrench`.
pub fn solve_wheel(wheel: &mut Wheel, ctx: &FrictionContext<'_>, wrench: &mut Wrench) {
    let config = wheel.config;
    let input = wheel.state.applied_input;
    let state = &mut wheel.state;

    let (forward, side) = wheel_basis(state.axle, state.contact_normal, ctx.chassis_forward);
    state.forward = forward;
    state.side = side;

    let point_vel = ctx.chassis.velocity_at_point(&state.contact_point);
    let (v_forward, v_side) = slip_components(point_vel, forward, side);
    state.forward_slip = v_forward;
    state.side_slip = v_side;

    let demand_forward = forward_force(&config, &input, v_forward, ctx.tuning);
    let demand_side = side_force(&config, v_side, ctx.mass_share, ctx.dt);

    let limit = config.friction_slip * state.suspension_force;
    let tire = friction_circle(demand_forward, demand_side, limit);

    state.forward_force = tire.forward;
    state.side_force = tire.side;
    state.skid_factor = tire.skid_factor;
    state.sliding = tire.skid_factor < 1.0 || v_side.abs() > ctx.tuning.sliding_slip_threshold;

    let com = ctx.chassis.center_of_mass;

    wrench.add_force_at_point(forward * tire.forward, state.contact_point, com);

    let side_point =
        roll_application_point(state.contact_point, com, ctx.chassis_up, config.roll_influence);
    wrench.add_force_at_point(side * tire.side, side_point, com);
}

/// Integrates the wheel's visual spin for this tick.
pub fn update_spin(wheel: &mut Wheel, chassis: &ChassisState, tuning: &VehicleTuning, dt: Real) {
    let config = wheel.config;
    let state = &mut wheel.state;

    if state.is_in_contact() {
        let hub_vel = chassis.velocity_at_point(&state.hard_point);
        state.delta_rotation = state.forward.dot(&hub_vel) * dt / config.radius;

        if state.sliding {
            if let Some(speed) = config.custom_sliding_rotational_speed {
                state.delta_rotation = speed * dt;
            }
        }
    } else {
        state.delta_rotation *= tuning.free_spin_drag;
    }

    state.rotation = (state.rotation + state.delta_rotation).rem_euclid(std::f32::consts::TAU);
    state.angular_velocity = state.delta_rotation / dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuning() -> VehicleTuning {
        VehicleTuning::default()
    }

    #[test]
    fn no_input_no_slip_no_force() {
        let f = forward_force(&WheelConfig::default(), &WheelInput::default(), 0.0, &tuning());
        assert_eq!(f, 0.0);
    }

    #[test]
    fn engine_force_sign_at_standstill() {
        let config = WheelConfig::default();
        let push = WheelInput { engine_force: 1000.0, ..WheelInput::default() };
        assert!(forward_force(&config, &push, 0.0, &tuning()) > 0.0);

        let pull = WheelInput { engine_force: -1000.0, ..WheelInput::default() };
        assert!(forward_force(&config, &pull, 0.0, &tuning()) < 0.0);

        let brake = WheelInput { brake_force: 500.0, ..WheelInput::default() };
        assert_eq!(forward_force(&config, &brake, 0.0, &tuning()), 0.0);
    }

    #[test]
    fn brake_opposes_motion() {
        let config = WheelConfig::default();
        let brake = WheelInput { brake_force: 500.0, ..WheelInput::default() };
        assert!(forward_force(&config, &brake, 10.0, &tuning()) < -500.0 + 1e-3);
        assert!(forward_force(&config, &brake, -10.0, &tuning()) > 500.0 - 1e-3);
    }

    #[test]
    fn rolling_resistance_shrinks_with_friction_slip() {
        let grippy = WheelConfig { friction_slip: 4.0, ..WheelConfig::default() };
        let slick = WheelConfig { friction_slip: 1.0, ..WheelConfig::default() };
        let input = WheelInput::default();
        let a = forward_force(&grippy, &input, 5.0, &tuning());
        let b = forward_force(&slick, &input, 5.0, &tuning());
        assert!(a < 0.0 && b < a);
    }

    #[test]
    fn circle_scales_both_components() {
        let tire = friction_circle(300.0, 400.0, 250.0);
        assert!((tire.skid_factor - 0.5).abs() < 1e-6);
        assert!((tire.forward - 150.0).abs() < 1e-3);
        assert!((tire.side - 200.0).abs() < 1e-3);

        let tire = friction_circle(3.0, 4.0, 10.0);
        assert_eq!(tire, TireForce { forward: 3.0, side: 4.0, skid_factor: 1.0 });
    }

    #[test]
    fn engine_force_is_bounded_by_friction_slip() {
        let config = WheelConfig::default(); // friction_slip 1.4
        let input = WheelInput { engine_force: 1000.0, ..WheelInput::default() };
        let load = 200.0;

        let demand = forward_force(&config, &input, 0.0, &tuning());
        let tire = friction_circle(demand, 0.0, config.friction_slip * load);

        assert!(tire.forward > 0.0);
        assert!(tire.forward <= 1.4 * load + 1e-3);
        assert!(tire.forward.is_finite());
    }

    #[test]
    fn zero_roll_influence_lifts_point_to_com_height() {
        let p = roll_application_point(
            Point::new(1.0, -0.8, 2.0),
            Point::new(0.0, 0.0, 0.0),
            Vector::y(),
            0.0,
        );
        assert!((p - Point::new(1.0, 0.0, 2.0)).norm() < 1e-6);

        let contact = Point::new(1.0, -0.8, 2.0);
        let p = roll_application_point(contact, Point::origin(), Vector::y(), 1.0);
        assert!((p - Point::new(1.0, -0.8, 2.0)).norm() < 1e-6);
    }

    proptest! {
        #[test]
        fn no_side_slip_means_no_side_force(
            side_acceleration in 0.0f32..10.0,
            mass_share in 0.0f32..5000.0,
            friction_slip in 0.0f32..20.0,
            forward in -1.0e4f32..1.0e4,
            load in 0.0f32..1.0e5,
        ) {
            let config = WheelConfig { side_acceleration, friction_slip, ..WheelConfig::default() };
            let side = side_force(&config, 0.0, mass_share, 1.0 / 60.0);
            let tire = friction_circle(forward, side, friction_slip * load);
            prop_assert_eq!(tire.side, 0.0);
        }
    }
}
