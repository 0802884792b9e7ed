//! The seam between the controller and the host rigid-body engine.
//!
//! The controller never owns the chassis body. Each tick it reads one
//! [`ChassisState`] snapshot, casts one ray per wheel, and submits a single
//! accumulated impulse pair back through [`PhysicsBackend::apply_wrench`].

use rapier3d::math::{Isometry, Point, Real, Vector};
use rapier3d::prelude::RigidBodyHandle;

use crate::dynamics::kinematics::point_velocity;

/// Read-only snapshot of the chassis taken at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisState {
    pub position: Isometry<Real>,
    pub linvel: Vector<Real>,
    pub angvel: Vector<Real>,
    /// World-space centre of mass.
    pub center_of_mass: Point<Real>,
    pub mass: Real,
}

impl ChassisState {
    /// World-space velocity of a point rigidly attached to the chassis.
    pub fn velocity_at_point(&self, p: &Point<Real>) -> Vector<Real> {
        point_velocity(self.linvel, self.angvel, self.center_of_mass, *p)
    }
}

/// Result of a suspension ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin along the (unit) ray direction.
    pub distance: Real,
    pub point: Point<Real>,
    pub normal: Vector<Real>,
}

pub trait PhysicsBackend {
    /// Current state of `chassis`, or `None` if the body does not exist.
    fn chassis_state(&self, chassis: RigidBodyHandle) -> Option<ChassisState>;

    /// Casts a ray along the unit vector `dir`, ignoring every collider
    /// attached to `exclude`.
    fn cast_ray(
        &self,
        origin: Point<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        exclude: RigidBodyHandle,
    ) -> Option<RayHit>;

    /// Applies a linear impulse at the centre of mass plus an angular impulse.
    fn apply_wrench(
        &mut self,
        chassis: RigidBodyHandle,
        impulse: Vector<Real>,
        torque_impulse: Vector<Real>,
    );
}
