// ==============================================================================
// steering.rs — DRIVER INPUT → PER-WHEEL COMMANDS
// ------------------------------------------------------------------------------
// Turns a player's normalized axes (throttle -1..1, steer -1..1, brake 0..1)
// into controller setter calls:
// - steering: speed-sensitive target, rate limited, split left/right by
//   Ackermann geometry, front axle only
// - throttle: engine force shared by the driven wheels
// - brake:    brake force shared by every wheel
//
// Wheel angles rotate about chassis up, so a positive angle turns left
// (+Z forward, +Y up). Player steer is the other way round: +1 is right.
// ==============================================================================

use raycast_vehicle::{VehicleController, WheelHandle};
use rapier3d::math::Real;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverInput {
    pub throttle: f32, // -1.0 (full reverse) .. 1.0 (full forward)
    pub steer: f32,    // -1.0 (full left) .. 1.0 (full right)
    pub brake: f32,    // 0.0 .. 1.0
}

impl DriverInput {
    pub fn clamped(self) -> Self {
        let finite_or_zero = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            throttle: finite_or_zero(self.throttle).clamp(-1.0, 1.0),
            steer: finite_or_zero(self.steer).clamp(-1.0, 1.0),
            brake: finite_or_zero(self.brake).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub engine_force: Real,    // N, total over the driven wheels
    pub brake_force: Real,     // N, total over all wheels

    pub max_steer_angle: Real, // radians at standstill
    pub steer_fade_speed: Real, // m/s at which the steer range stops shrinking
    pub min_steer_scale: Real, // fraction of max_steer_angle kept at speed
    pub max_steer_rate: Real,  // rad/s

    // --- Geometry ---
    pub wheelbase: Real,       // meters (front axle to rear axle)
    pub track_width: Real,     // meters (left to right)
    pub ackermann: Real,       // 0..1 blend (0 = parallel, 1 = full ackermann)

    pub front_left: WheelHandle,
    pub front_right: WheelHandle,
    pub driven: Vec<WheelHandle>,
}

impl DriverConfig {
    /// Matches `VehicleConfig::sedan()`: wheels FL, FR, RL, RR, rear drive.
    pub fn sedan() -> Self {
        Self {
            engine_force: 3200.0,
            brake_force: 8000.0,
            max_steer_angle: 0.6,
            steer_fade_speed: 30.0,
            min_steer_scale: 0.35,
            max_steer_rate: 2.5,
            wheelbase: 3.0,
            track_width: 1.6,
            ackermann: 0.8,
            front_left: WheelHandle::from(0),
            front_right: WheelHandle::from(1),
            driven: vec![WheelHandle::from(2), WheelHandle::from(3)],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Driver {
    pub config: DriverConfig,
    pub input: DriverInput,
    steer_angle: Real, // current centreline angle (radians)
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            input: DriverInput::default(),
            steer_angle: 0.0,
        }
    }

    pub fn steer_angle(&self) -> Real {
        self.steer_angle
    }

    /// Moves the centreline steering angle towards the input target.
    pub fn update_steering(&mut self, speed: Real, dt: Real) -> Real {
        let c = &self.config;
        let scale = (1.0 - speed.abs() / c.steer_fade_speed).clamp(c.min_steer_scale, 1.0);
        let target = -self.input.steer * c.max_steer_angle * scale;

        let max_step = c.max_steer_rate * dt;
        self.steer_angle += (target - self.steer_angle).clamp(-max_step, max_step);
        self.steer_angle
    }

    /// Pushes this tick's commands into the controller.
    pub fn apply(
        &mut self,
        vehicle: &mut VehicleController,
        dt: Real,
    ) -> raycast_vehicle::Result<()> {
        let base = self.update_steering(vehicle.current_speed(), dt);
        let (left, right) = blended_angles(base, &self.config);
        vehicle.set_steering(self.config.front_left, left)?;
        vehicle.set_steering(self.config.front_right, right)?;

        let driven = self.config.driven.len().max(1) as Real;
        let engine = self.input.throttle * self.config.engine_force / driven;
        for &wheel in &self.config.driven {
            vehicle.set_engine_force(wheel, engine)?;
        }

        let wheels: Vec<_> = vehicle.handles().collect();
        let brake = self.input.brake * self.config.brake_force / wheels.len().max(1) as Real;
        for wheel in wheels {
            vehicle.set_brake_force(wheel, brake)?;
        }

        Ok(())
    }
}

fn blended_angles(base: Real, c: &DriverConfig) -> (Real, Real) {
    let (left, right) = ackermann_angles(base, c.wheelbase, c.track_width);
    (
        base + (left - base) * c.ackermann,
        base + (right - base) * c.ackermann,
    )
}

// --------------------------------------------------
// ackermann steering angles (stateless)
// --------------------------------------------------
/// `base` is the bicycle-model angle at the centreline, positive to the
/// left. Returns `(left, right)`; the wheel on the inside of the turn steers
/// harder.
pub fn ackermann_angles(base: Real, wheelbase: Real, track: Real) -> (Real, Real) {
    if base.abs() < 1e-4 {
        return (0.0, 0.0);
    }

    let sign = base.signum();
    let r = wheelbase / base.abs().tan();

    let r_in = (r - track * 0.5).max(0.01);
    let r_out = (r + track * 0.5).max(0.01);

    let inner = (wheelbase / r_in).atan() * sign;
    let outer = (wheelbase / r_out).atan() * sign;

    if base > 0.0 { (inner, outer) } else { (outer, inner) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raycast_vehicle::VehicleConfig;

    #[test]
    fn straight_ahead_is_zero() {
        assert_eq!(ackermann_angles(0.0, 3.0, 1.6), (0.0, 0.0));
    }

    #[test]
    fn inside_wheel_steers_harder() {
        // Left turn: left wheel is inside.
        let (left, right) = ackermann_angles(0.3, 3.0, 1.6);
        assert!(left > 0.3 && right < 0.3 && right > 0.0);

        let (left, right) = ackermann_angles(-0.3, 3.0, 1.6);
        assert!(right < -0.3 && left > -0.3 && left < 0.0);
    }

    #[test]
    fn steering_is_rate_limited() {
        let mut driver = Driver::new(DriverConfig::sedan());
        driver.input.steer = 1.0;

        // Steering right is a negative wheel angle.
        let angle = driver.update_steering(0.0, 0.1);
        assert!((angle + 0.25).abs() < 1e-6);

        for _ in 0..20 {
            driver.update_steering(0.0, 0.1);
        }
        assert!((driver.steer_angle() + 0.6).abs() < 1e-6);
    }

    #[test]
    fn steering_range_shrinks_with_speed() {
        let mut driver = Driver::new(DriverConfig::sedan());
        driver.input.steer = 1.0;
        for _ in 0..50 {
            driver.update_steering(40.0, 0.1);
        }
        assert!((driver.steer_angle() + 0.6 * 0.35).abs() < 1e-5);
    }

    #[test]
    fn clamped_input_discards_garbage() {
        let raw = DriverInput { throttle: 3.0, steer: f32::NAN, brake: -1.0 };
        assert_eq!(raw.clamped(), DriverInput { throttle: 1.0, steer: 0.0, brake: 0.0 });
    }

    #[test]
    fn commands_reach_the_right_wheels() {
        let mut vehicle = VehicleController::new(&VehicleConfig::sedan()).unwrap();
        let mut driver = Driver::new(DriverConfig::sedan());
        driver.input = DriverInput { throttle: 0.5, steer: 0.0, brake: 1.0 };

        driver.apply(&mut vehicle, 1.0 / 60.0).unwrap();

        let wheels = vehicle.wheels();
        assert_eq!(wheels[0].input().engine_force, 0.0);
        assert_eq!(wheels[2].input().engine_force, 800.0);
        assert_eq!(wheels[3].input().engine_force, 800.0);
        for wheel in wheels {
            assert_eq!(wheel.input().brake_force, 2000.0);
            assert_eq!(wheel.input().steering, 0.0);
        }
    }
}
