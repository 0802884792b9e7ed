//! Read-only wheel poses for whatever draws the wheels.
//!
//! A pose is a pure function of the wheel's configuration and dynamic state
//! (plus the chassis position for the world transform). Nothing here is
//! called by the controller during a tick.

use rapier3d::math::{Isometry, Real, Rotation};
use rapier3d::na::Translation3;
use serde::Serialize;

use crate::dynamics::wheel::{Wheel, WheelHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelPose {
    pub handle: WheelHandle,
    /// Hub transform relative to the chassis.
    pub local: Isometry<Real>,
    /// Hub transform in world space.
    pub world: Isometry<Real>,
    pub suspension_length: Real,
    pub rotation: Real,
    pub steering: Real,
    pub in_contact: bool,
}

/// Flat form of a [`WheelPose`] for snapshots sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WheelPoseSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion i, j, k, w
    pub suspension_length: f32,
    pub in_contact: bool,
}

/// Hub transform relative to the chassis: pushed out along the suspension by
/// the current length, steered about chassis up, spun about the axle.
pub fn local_transform(wheel: &Wheel) -> Isometry<Real> {
    let config = wheel.config();
    let state = wheel.state();

    let dir = config.suspension_direction();
    let axle = config.axle_direction();

    let center = config.connection_point() + dir * state.suspension_length;
    let steer = Rotation::new(-dir * state.applied_input.steering);
    let spin = Rotation::new(axle * state.rotation);

    Isometry::from_parts(Translation3::from(center.coords), steer * spin)
}

pub fn wheel_pose(handle: WheelHandle, wheel: &Wheel, chassis: &Isometry<Real>) -> WheelPose {
    let local = local_transform(wheel);
    WheelPose {
        handle,
        local,
        world: chassis * local,
        suspension_length: wheel.state().suspension_length,
        rotation: wheel.state().rotation,
        steering: wheel.state().applied_input.steering,
        in_contact: wheel.state().is_in_contact(),
    }
}

impl WheelPose {
    pub fn snapshot(&self) -> WheelPoseSnapshot {
        let t = self.world.translation.vector;
        let q = self.world.rotation;
        WheelPoseSnapshot {
            position: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
            suspension_length: self.suspension_length,
            in_contact: self.in_contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WheelConfig;
    use rapier3d::math::Vector;

    #[test]
    fn local_offset_follows_suspension() {
        let config = WheelConfig {
            connection_point: [1.0, 0.0, 2.0],
            ..WheelConfig::default()
        };
        let mut wheel = Wheel::new(config);
        wheel.state.suspension_length = 0.4;

        let iso = local_transform(&wheel);
        let t = iso.translation.vector;
        assert!((t - Vector::new(1.0, -0.4, 2.0)).norm() < 1e-6);
        assert!(iso.rotation.angle() < 1e-6);
    }

    #[test]
    fn world_pose_composes_chassis() {
        let wheel = Wheel::new(WheelConfig::default());
        let chassis = Isometry::translation(0.0, 5.0, 0.0);
        let pose = wheel_pose(WheelHandle(0), &wheel, &chassis);

        assert!((pose.world.translation.vector.y - (5.0 - 0.3)).abs() < 1e-6);
        assert_eq!(pose.snapshot().position[1], pose.world.translation.vector.y);
    }

    #[test]
    fn spin_rotates_about_axle() {
        let mut wheel = Wheel::new(WheelConfig::default());
        wheel.state.rotation = 1.0;
        let iso = local_transform(&wheel);
        let axis = iso.rotation.axis().unwrap();
        assert!((axis.into_inner() - Vector::x()).norm() < 1e-5);
        assert!((iso.rotation.angle() - 1.0).abs() < 1e-5);
    }
}
