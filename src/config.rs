// ==============================================================================
// config.rs — VEHICLE + WHEEL CONFIGURATION (VALIDATED, SERDE)
// ------------------------------------------------------------------------------
// Flat named options per wheel plus the chassis axis convention and the global
// tunables of the solver. Everything here is plain data:
// - WheelConfig:   static geometry + suspension + friction options of one wheel
// - ChassisAxes:   which local axis is right / forward / up (0 = x, 1 = y, 2 = z)
// - VehicleTuning: solver-wide scalars (drag, deadzones, skid threshold)
// - VehicleConfig: all of the above, loadable from JSON
//
// validate() never clamps. Bad values are reported as InvalidConfiguration.
// ==============================================================================

use std::path::Path;

use rapier3d::math::{Point, Real, Vector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Tolerance used for the unit-length and perpendicularity checks.
pub const DIRECTION_TOLERANCE: Real = 1e-3;

const GRAVITY: Real = 9.81; // m/s²

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub radius: Real,                        // m
    pub connection_point: [Real; 3],         // chassis local space
    pub suspension_direction: [Real; 3],     // chassis local, unit, points towards the ground
    pub axle_direction: [Real; 3],           // chassis local, unit, perpendicular to suspension

    pub suspension_stiffness: Real,          // N/m
    pub suspension_rest_length: Real,        // m
    pub max_suspension_travel: Real,         // m
    pub max_suspension_force: Real,          // N
    pub damping_compression: Real,           // N·s/m, used while the spring shortens
    pub damping_relaxation: Real,            // N·s/m, used while the spring extends

    pub roll_influence: Real,                // 0..1
    pub friction_slip: Real,                 // friction circle radius per newton of load
    pub custom_sliding_rotational_speed: Option<Real>, // rad/s while sliding
    pub forward_acceleration: Real,          // engine force multiplier
    pub side_acceleration: Real,             // lateral grip multiplier
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            connection_point: [0.0, 0.0, 0.0],
            suspension_direction: [0.0, -1.0, 0.0],
            axle_direction: [1.0, 0.0, 0.0],
            suspension_stiffness: 30.0,
            suspension_rest_length: 0.3,
            max_suspension_travel: 0.3,
            max_suspension_force: 100_000.0,
            damping_compression: 4.4,
            damping_relaxation: 2.3,
            roll_influence: 0.01,
            friction_slip: 1.4,
            custom_sliding_rotational_speed: None,
            forward_acceleration: 1.0,
            side_acceleration: 1.0,
        }
    }
}

impl WheelConfig {
    pub fn connection_point(&self) -> Point<Real> {
        Point::from(self.connection_point)
    }

    pub fn suspension_direction(&self) -> Vector<Real> {
        Vector::from(self.suspension_direction)
    }

    pub fn axle_direction(&self) -> Vector<Real> {
        Vector::from(self.axle_direction)
    }

    /// Longest suspension length the wheel can report (fully extended).
    pub fn max_suspension_length(&self) -> Real {
        self.suspension_rest_length + self.max_suspension_travel
    }

    /// Length of the suspension ray, hub travel plus the tire.
    pub fn ray_length(&self) -> Real {
        self.max_suspension_length() + self.radius
    }

    pub fn validate(&self) -> Result<()> {
        finite_vec("connection_point", &self.connection_point)?;
        finite_vec("suspension_direction", &self.suspension_direction)?;
        finite_vec("axle_direction", &self.axle_direction)?;

        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(VehicleError::invalid(
                "radius",
                format!("must be > 0, got {}", self.radius),
            ));
        }

        non_negative("suspension_stiffness", self.suspension_stiffness)?;
        non_negative("suspension_rest_length", self.suspension_rest_length)?;
        non_negative("max_suspension_travel", self.max_suspension_travel)?;
        non_negative("max_suspension_force", self.max_suspension_force)?;
        non_negative("damping_compression", self.damping_compression)?;
        non_negative("damping_relaxation", self.damping_relaxation)?;
        non_negative("friction_slip", self.friction_slip)?;
        non_negative("forward_acceleration", self.forward_acceleration)?;
        non_negative("side_acceleration", self.side_acceleration)?;

        if !(0.0..=1.0).contains(&self.roll_influence) {
            return Err(VehicleError::invalid(
                "roll_influence",
                format!("must lie in [0, 1], got {}", self.roll_influence),
            ));
        }

        if let Some(speed) = self.custom_sliding_rotational_speed {
            if !speed.is_finite() {
                return Err(VehicleError::invalid(
                    "custom_sliding_rotational_speed",
                    "must be finite",
                ));
            }
        }

        let dir = self.suspension_direction();
        let axle = self.axle_direction();

        if (dir.norm() - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(VehicleError::invalid(
                "suspension_direction",
                format!("must be a unit vector, length is {}", dir.norm()),
            ));
        }
        if (axle.norm() - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(VehicleError::invalid(
                "axle_direction",
                format!("must be a unit vector, length is {}", axle.norm()),
            ));
        }
        if dir.dot(&axle).abs() > DIRECTION_TOLERANCE {
            return Err(VehicleError::invalid(
                "axle_direction",
                "must be perpendicular to suspension_direction",
            ));
        }

        Ok(())
    }
}

/// The chassis' local coordinate convention (`0 = x, 1 = y, 2 = z`).
/// `right` names the lateral axis; the side it points to follows from
/// `up × forward` in the host's right-handed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisAxes {
    pub right: usize,
    pub forward: usize,
    pub up: usize,
}

impl Default for ChassisAxes {
    fn default() -> Self {
        Self { right: 0, up: 1, forward: 2 }
    }
}

impl ChassisAxes {
    pub fn validate(&self) -> Result<()> {
        for (field, index) in [("right", self.right), ("forward", self.forward), ("up", self.up)] {
            if index > 2 {
                return Err(VehicleError::invalid(
                    "axes",
                    format!("{field} axis index must be 0, 1 or 2, got {index}"),
                ));
            }
        }
        if self.right == self.forward || self.right == self.up || self.forward == self.up {
            return Err(VehicleError::invalid(
                "axes",
                format!(
                    "axis indices must be pairwise distinct, got right={} forward={} up={}",
                    self.right, self.forward, self.up
                ),
            ));
        }
        Ok(())
    }

    pub fn right_local(&self) -> Vector<Real> {
        Vector::ith(self.right, 1.0)
    }

    pub fn forward_local(&self) -> Vector<Real> {
        Vector::ith(self.forward, 1.0)
    }

    pub fn up_local(&self) -> Vector<Real> {
        Vector::ith(self.up, 1.0)
    }
}

/// Solver-wide scalars. None of these are physically derived; they are
/// tuned against the desired feel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub free_spin_drag: Real,          // per-tick decay of an airborne wheel's spin
    pub rolling_resistance: Real,      // N per m/s of forward slip (divided by friction_slip)
    pub brake_deadzone: Real,          // m/s; brake force ramps linearly inside it
    pub sliding_slip_threshold: Real,  // m/s of side slip that counts as a skid
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            free_spin_drag: 0.99,
            rolling_resistance: 15.0,
            brake_deadzone: 0.5,
            sliding_slip_threshold: 4.0,
        }
    }
}

impl VehicleTuning {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.free_spin_drag) {
            return Err(VehicleError::invalid(
                "free_spin_drag",
                format!("must lie in [0, 1], got {}", self.free_spin_drag),
            ));
        }
        non_negative("rolling_resistance", self.rolling_resistance)?;
        if !(self.brake_deadzone.is_finite() && self.brake_deadzone > 0.0) {
            return Err(VehicleError::invalid(
                "brake_deadzone",
                format!("must be > 0, got {}", self.brake_deadzone),
            ));
        }
        non_negative("sliding_slip_threshold", self.sliding_slip_threshold)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub axes: ChassisAxes,
    pub tuning: VehicleTuning,
    pub wheels: Vec<WheelConfig>,
}

impl VehicleConfig {
    pub fn validate(&self) -> Result<()> {
        self.axes.validate()?;
        self.tuning.validate()?;
        for wheel in &self.wheels {
            wheel.validate()?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VehicleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| VehicleError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Four-wheeled road car, ~1350 kg, +Z forward, +Y up, so +X is the
    /// driver's left in rapier's right-handed frame.
    /// Wheel order: front-left, front-right, rear-left, rear-right.
    pub fn sedan() -> Self {
        let mass = 1350.0;
        let (k, c) = suspension_from_sag(mass, 4, 0.05, 0.9);

        let base = WheelConfig {
            radius: 0.35,
            suspension_direction: [0.0, -1.0, 0.0],
            axle_direction: [1.0, 0.0, 0.0],
            suspension_stiffness: k,
            suspension_rest_length: 0.5,
            max_suspension_travel: 0.3,
            max_suspension_force: 20_000.0,
            damping_compression: c,
            damping_relaxation: c * 0.6,
            roll_influence: 0.1,
            friction_slip: 1.4,
            custom_sliding_rotational_speed: Some(-30.0),
            ..WheelConfig::default()
        };

        let at = |x: Real, z: Real| WheelConfig {
            connection_point: [x, -0.3, z],
            ..base
        };

        Self {
            axes: ChassisAxes::default(),
            tuning: VehicleTuning::default(),
            wheels: vec![at(0.8, 1.5), at(-0.8, 1.5), at(0.8, -1.5), at(-0.8, -1.5)],
        }
    }
}

/// Spring and damper constants that make a chassis of `vehicle_mass` spread
/// over `wheels` sag by `sag_m` at rest, damped at ratio `zeta`.
///
/// Returns `(stiffness N/m, damping N·s/m)`.
pub fn suspension_from_sag(
    vehicle_mass: Real,
    wheels: usize,
    sag_m: Real,
    zeta: Real,
) -> (Real, Real) {
    let m = vehicle_mass / wheels.max(1) as Real;
    let f_static = m * GRAVITY;
    let k = f_static / sag_m.max(1e-3);

    // c = 2ζ√(km)
    let c = 2.0 * zeta * (k * m).sqrt();
    (k, c)
}

fn non_negative(field: &'static str, value: Real) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(VehicleError::invalid(
            field,
            format!("must be finite and >= 0, got {value}"),
        ))
    }
}

fn finite_vec(field: &'static str, v: &[Real; 3]) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(VehicleError::invalid(field, "components must be finite"))
    }
}
