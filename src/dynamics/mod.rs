//! Per-wheel dynamics: wheel model, suspension ray cast, friction.

pub mod friction;
pub mod kinematics;
pub mod suspension;
pub mod wheel;

use rapier3d::math::{Point, Real, Vector};

pub use wheel::{ContactState, Wheel, WheelHandle, WheelInput, WheelState};

/// Force and torque (about the chassis centre of mass) summed over all wheels
/// during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wrench {
    pub force: Vector<Real>,
    pub torque: Vector<Real>,
}

impl Default for Wrench {
    fn default() -> Self {
        Self {
            force: Vector::zeros(),
            torque: Vector::zeros(),
        }
    }
}

impl Wrench {
    pub fn add_force_at_point(
        &mut self,
        force: Vector<Real>,
        point: Point<Real>,
        com: Point<Real>,
    ) {
        self.force += force;
        self.torque += (point - com).cross(&force);
    }

    pub fn is_zero(&self) -> bool {
        self.force == Vector::zeros() && self.torque == Vector::zeros()
    }
}
