// ==============================================================================
// vehicle.rs — RAYCAST VEHICLE CONTROLLER
// ------------------------------------------------------------------------------
// Owns the wheel list and the per-wheel inputs, and borrows the chassis body
// through a PhysicsBackend once per tick:
//
//   Phase 1: wheel transforms + suspension ray casts + spring/damper
//   Phase 2: friction (forward, side, roll) for grounded wheels
//   Phase 3: wheel spin
//   Phase 4: apply the accumulated wrench ONCE (force*dt, torque*dt)
//
// Every wheel reads the same chassis snapshot taken before Phase 1, so the
// result does not depend on wheel order.
// ==============================================================================

use rapier3d::math::{Isometry, Real};
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::backend::PhysicsBackend;
use crate::config::{ChassisAxes, VehicleConfig, VehicleTuning, WheelConfig};
use crate::debug_builders::DebugOverlay;
use crate::dynamics::friction::{self, FrictionContext};
use crate::dynamics::suspension;
use crate::dynamics::wheel::{Wheel, WheelHandle};
use crate::dynamics::Wrench;
use crate::error::{Result, VehicleError};
use crate::pose::{self, WheelPose};

/// What a wheel (or the whole vehicle) was asked to do on the last tick.
/// Drives brake lights and similar feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveSignal {
    Idle,
    Driving,
    Reversing,
    Braking,
}

impl DriveSignal {
    fn of(wheel: &Wheel) -> Self {
        let input = &wheel.state().applied_input;
        if input.brake_force > 0.0 {
            DriveSignal::Braking
        } else if input.engine_force > 0.0 {
            DriveSignal::Driving
        } else if input.engine_force < 0.0 {
            DriveSignal::Reversing
        } else {
            DriveSignal::Idle
        }
    }

    fn priority(self) -> u8 {
        match self {
            DriveSignal::Idle => 0,
            DriveSignal::Driving => 1,
            DriveSignal::Reversing => 2,
            DriveSignal::Braking => 3,
        }
    }
}

pub struct VehicleController {
    chassis: Option<RigidBodyHandle>, // the chassis body, never owned
    axes: ChassisAxes,
    tuning: VehicleTuning,
    wheels: Vec<Wheel>,

    ticks: u64,
    current_speed: Real,          // m/s, signed along chassis forward
    chassis_position: Isometry<Real>, // as of the last tick
    last_wrench: Wrench,
}

impl VehicleController {
    /// Builds an unbound controller with every wheel listed in `config`.
    pub fn new(config: &VehicleConfig) -> Result<Self> {
        config.axes.validate()?;
        config.tuning.validate()?;

        let mut controller = Self {
            chassis: None,
            axes: config.axes,
            tuning: config.tuning,
            wheels: Vec::with_capacity(config.wheels.len()),
            ticks: 0,
            current_speed: 0.0,
            chassis_position: Isometry::identity(),
            last_wrench: Wrench::default(),
        };

        for wheel in &config.wheels {
            controller.add_wheel(*wheel)?;
        }

        Ok(controller)
    }

    pub fn with_chassis(chassis: RigidBodyHandle, config: &VehicleConfig) -> Result<Self> {
        let mut controller = Self::new(config)?;
        controller.bind_chassis(chassis);
        Ok(controller)
    }

    pub fn bind_chassis(&mut self, chassis: RigidBodyHandle) {
        self.chassis = Some(chassis);
    }

    pub fn chassis(&self) -> Option<RigidBodyHandle> {
        self.chassis
    }

    pub fn axes(&self) -> ChassisAxes {
        self.axes
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Registers a wheel. Only allowed before the first tick.
    pub fn add_wheel(&mut self, config: WheelConfig) -> Result<WheelHandle> {
        if self.ticks > 0 {
            return Err(VehicleError::invalid(
                "wheels",
                "wheels cannot be added after the simulation has started",
            ));
        }
        config.validate()?;

        let handle = WheelHandle(self.wheels.len());
        self.wheels.push(Wheel::new(config));
        debug!(%handle, radius = config.radius, "wheel added");
        Ok(handle)
    }

    /// Swaps the configuration of an existing wheel, keeping its index. The
    /// wheel's dynamic state and inputs start over.
    pub fn replace_wheel(&mut self, handle: WheelHandle, config: WheelConfig) -> Result<()> {
        config.validate()?;
        let wheel = self.wheel_mut(handle)?;
        *wheel = Wheel::new(config);
        debug!(%handle, "wheel replaced");
        Ok(())
    }

    pub fn set_steering(&mut self, handle: WheelHandle, angle: Real) -> Result<()> {
        finite("steering", angle)?;
        self.wheel_mut(handle)?.input.steering = angle;
        Ok(())
    }

    pub fn set_engine_force(&mut self, handle: WheelHandle, force: Real) -> Result<()> {
        finite("engine_force", force)?;
        self.wheel_mut(handle)?.input.engine_force = force;
        Ok(())
    }

    pub fn set_brake_force(&mut self, handle: WheelHandle, force: Real) -> Result<()> {
        finite("brake_force", force)?;
        if force < 0.0 {
            return Err(VehicleError::invalid(
                "brake_force",
                format!("must be >= 0, got {force}"),
            ));
        }
        self.wheel_mut(handle)?.input.brake_force = force;
        Ok(())
    }

    /// Advances the vehicle by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` is rejected with
    /// [`VehicleError::InvalidTimestep`] and leaves every wheel untouched.
    pub fn tick<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, dt: Real) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, "rejected vehicle tick with invalid timestep");
            return Err(VehicleError::InvalidTimestep(dt));
        }

        let chassis_handle = self.chassis.ok_or(VehicleError::MissingChassis)?;
        let chassis = backend
            .chassis_state(chassis_handle)
            .ok_or(VehicleError::MissingChassis)?;

        let chassis_forward = chassis.position.rotation * self.axes.forward_local();
        let chassis_up = chassis.position.rotation * self.axes.up_local();

        self.current_speed = chassis.linvel.dot(&chassis_forward);
        self.chassis_position = chassis.position;

        // ------------------------------------------------------------
        // 1) Ray casts + suspension
        // ------------------------------------------------------------
        for wheel in &mut self.wheels {
            suspension::update_wheel_transform(wheel, &chassis);
            let hit = suspension::cast(wheel, &*backend, chassis_handle);
            suspension::resolve(wheel, hit, dt);
        }

        let grounded = self.num_wheels_in_contact();
        let ctx = FrictionContext {
            dt,
            chassis: &chassis,
            chassis_forward,
            chassis_up,
            mass_share: if grounded > 0 { chassis.mass / grounded as Real } else { 0.0 },
            tuning: &self.tuning,
        };

        // ------------------------------------------------------------
        // 2) Suspension + friction forces, accumulated
        // ------------------------------------------------------------
        let mut wrench = Wrench::default();
        for wheel in &mut self.wheels {
            if wheel.state.is_in_contact() {
                wrench.add_force_at_point(
                    suspension::force_vector(wheel),
                    wheel.state.contact_point,
                    chassis.center_of_mass,
                );
                friction::solve_wheel(wheel, &ctx, &mut wrench);
            } else {
                wheel.state.clear_friction();
            }
        }

        // ------------------------------------------------------------
        // 3) Wheel spin
        // ------------------------------------------------------------
        for wheel in &mut self.wheels {
            friction::update_spin(wheel, &chassis, &self.tuning, dt);
        }

        // ------------------------------------------------------------
        // 4) Apply once
        // ------------------------------------------------------------
        if !wrench.is_zero() {
            backend.apply_wrench(chassis_handle, wrench.force * dt, wrench.torque * dt);
        }
        self.last_wrench = wrench;
        self.ticks += 1;

        trace!(
            tick = self.ticks,
            grounded,
            speed = self.current_speed,
            force = ?wrench.force,
            "vehicle tick"
        );

        Ok(())
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn wheel(&self, handle: WheelHandle) -> Result<&Wheel> {
        self.wheels
            .get(handle.0)
            .ok_or(VehicleError::UnknownWheel(handle))
    }

    fn wheel_mut(&mut self, handle: WheelHandle) -> Result<&mut Wheel> {
        self.wheels
            .get_mut(handle.0)
            .ok_or(VehicleError::UnknownWheel(handle))
    }

    pub fn handles(&self) -> impl Iterator<Item = WheelHandle> + '_ {
        (0..self.wheels.len()).map(WheelHandle)
    }

    pub fn wheel_pose(&self, handle: WheelHandle) -> Result<WheelPose> {
        let wheel = self.wheel(handle)?;
        Ok(pose::wheel_pose(handle, wheel, &self.chassis_position))
    }

    /// Poses relative to the chassis position seen by the last tick.
    pub fn wheel_poses(&self) -> Vec<WheelPose> {
        self.wheel_poses_at(&self.chassis_position)
    }

    /// Poses placed on `chassis`, typically the body's position after the
    /// host has stepped its world.
    pub fn wheel_poses_at(&self, chassis: &Isometry<Real>) -> Vec<WheelPose> {
        self.wheels
            .iter()
            .enumerate()
            .map(|(i, w)| pose::wheel_pose(WheelHandle(i), w, chassis))
            .collect()
    }

    pub fn wheel_signal(&self, handle: WheelHandle) -> Result<DriveSignal> {
        Ok(DriveSignal::of(self.wheel(handle)?))
    }

    /// Strongest signal over all wheels (braking wins over reversing wins
    /// over driving).
    pub fn drive_signal(&self) -> DriveSignal {
        self.wheels
            .iter()
            .map(DriveSignal::of)
            .max_by_key(|s| s.priority())
            .unwrap_or(DriveSignal::Idle)
    }

    pub fn num_wheels_in_contact(&self) -> usize {
        self.wheels.iter().filter(|w| w.state.is_in_contact()).count()
    }

    /// Speed along the chassis forward axis as of the last tick.
    pub fn current_speed(&self) -> Real {
        self.current_speed
    }

    /// Chassis position as of the last tick.
    pub fn chassis_position(&self) -> &Isometry<Real> {
        &self.chassis_position
    }

    /// Total force and torque submitted on the last tick (before `* dt`).
    pub fn last_wrench(&self) -> &Wrench {
        &self.last_wrench
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn debug_overlay(&self) -> DebugOverlay {
        let mut overlay = DebugOverlay::default();
        overlay.push_chassis(&self.chassis_position, &self.axes);
        for (i, wheel) in self.wheels.iter().enumerate() {
            overlay.push_wheel(i, wheel);
        }
        overlay
    }
}

fn finite(field: &'static str, value: Real) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VehicleError::invalid(field, "must be finite"))
    }
}
