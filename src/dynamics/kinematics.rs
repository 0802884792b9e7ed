// ==============================================================================
// kinematics.rs — WHEEL BASIS + SLIP DECOMPOSITION (WORLD SPACE)
// ------------------------------------------------------------------------------
// wheel_basis(...):
// - Rotates the world axle by the wheel's steering angle about chassis up
// - Projects it onto the contact plane -> side
// - forward = side × normal, flipped to agree with chassis forward
//
// slip_components(point_vel, forward, side):
//     v_forward = dot(v, forward)
//     v_side    = dot(v, side)
//
// These values feed the friction solver.
// ==============================================================================

use rapier3d::math::{Point, Real, Rotation, Vector};

const EPS: Real = 1e-6;

/// World-space velocity of an arbitrary point rigidly attached to the body:
/// v(p) = v_com + ω × (p - com)
#[inline]
pub fn point_velocity(
    linvel: Vector<Real>,
    angvel: Vector<Real>,
    com: Point<Real>,
    p: Point<Real>,
) -> Vector<Real> {
    let r = p.coords - com.coords;
    linvel + angvel.cross(&r)
}

/// Axle direction after steering by `angle` about `up`.
#[inline]
pub fn steer_axle(axle: Vector<Real>, up: Vector<Real>, angle: Real) -> Vector<Real> {
    if angle == 0.0 {
        return axle;
    }
    Rotation::new(up * angle) * axle
}

#[inline]
pub fn project_on_plane(v: Vector<Real>, normal: Vector<Real>) -> Vector<Real> {
    v - normal * v.dot(&normal)
}

/// Returns `(forward, side)` lying in the contact plane.
pub fn wheel_basis(
    axle: Vector<Real>,
    contact_normal: Vector<Real>,
    chassis_forward: Vector<Real>,
) -> (Vector<Real>, Vector<Real>) {
    let side = safe_normalize(project_on_plane(axle, contact_normal), axle);
    let mut forward = safe_normalize(side.cross(&contact_normal), chassis_forward);

    if forward.dot(&chassis_forward) < 0.0 {
        forward = -forward;
    }

    (forward, side)
}

/// Compute (v_forward, v_side) given point velocity and wheel basis.
#[inline]
pub fn slip_components(
    point_vel: Vector<Real>,
    forward: Vector<Real>,
    side: Vector<Real>,
) -> (Real, Real) {
    (point_vel.dot(&forward), point_vel.dot(&side))
}

#[inline]
pub fn safe_normalize(v: Vector<Real>, fallback: Vector<Real>) -> Vector<Real> {
    let n = v.norm();
    if n > EPS { v / n } else { fallback }
}
