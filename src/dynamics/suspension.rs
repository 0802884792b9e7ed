// ==============================================================================
// suspension.rs — RAYCAST SUSPENSION (SPRING + DAMPER)
// ------------------------------------------------------------------------------
// Per wheel, per tick:
// 1) update_wheel_transform(): hard point, ray direction and steered axle in
//    world space from the chassis snapshot
// 2) cast(): one ray of length rest + travel + radius, chassis excluded.
//    Out-of-range or non-finite hits are dropped (treated as airborne)
// 3) resolve(): suspension length, contact info, spring + damper force
//
//     spring = k * (rest - len)                 clamped to [0, max_force]
//     v      = (last_len - len) / dt            > 0 while compressing
//     damper = c(v) * v                         c = compression | relaxation
//     force  = clamp(spring + damper, 0, max_force)
//
// Notes:
// - This file does NOT apply forces. vehicle.rs accumulates them.
// - The force acts along the contact normal, not along the suspension ray.
// ==============================================================================

use rapier3d::math::{Real, Vector};
use rapier3d::prelude::RigidBodyHandle;

use crate::backend::{ChassisState, PhysicsBackend, RayHit};
use crate::config::WheelConfig;
use crate::dynamics::kinematics::steer_axle;
use crate::dynamics::wheel::{ContactState, Wheel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspensionForce {
    pub spring: Real,
    pub damper: Real,
    pub velocity: Real,
    pub total: Real,
}

/// Spring + damper force for a suspension at `length` that was at
/// `last_length` one tick (`dt`) ago.
pub fn compute_suspension_force(
    config: &WheelConfig,
    length: Real,
    last_length: Real,
    dt: Real,
) -> SuspensionForce {
    let max_force = config.max_suspension_force;

    let spring = (config.suspension_stiffness * (config.suspension_rest_length - length))
        .clamp(0.0, max_force);

    let velocity = (last_length - length) / dt;
    let coefficient = if velocity > 0.0 {
        config.damping_compression
    } else {
        config.damping_relaxation
    };
    let damper = coefficient * velocity;

    let total = spring + damper;
    let total = if total.is_nan() { 0.0 } else { total.clamp(0.0, max_force) };

    SuspensionForce {
        spring,
        damper,
        velocity,
        total,
    }
}

pub fn update_wheel_transform(wheel: &mut Wheel, chassis: &ChassisState) {
    let iso = &chassis.position;
    let state = &mut wheel.state;

    state.hard_point = iso * wheel.config.connection_point();
    state.direction = iso.rotation * wheel.config.suspension_direction();

    state.applied_input = wheel.input;

    let axle = iso.rotation * wheel.config.axle_direction();
    state.axle = steer_axle(axle, -state.direction, state.applied_input.steering);
}

/// Casts the suspension ray. Hits that are non-finite, behind the origin or
/// past the ray length come back as `None`.
pub fn cast<B: PhysicsBackend + ?Sized>(
    wheel: &Wheel,
    backend: &B,
    chassis: RigidBodyHandle,
) -> Option<RayHit> {
    let max_dist = wheel.config.ray_length();
    let hit = backend.cast_ray(wheel.state.hard_point, wheel.state.direction, max_dist, chassis)?;

    let in_range = hit.distance.is_finite() && hit.distance >= 0.0 && hit.distance <= max_dist;
    let finite = hit.point.coords.iter().all(|c| c.is_finite())
        && hit.normal.iter().all(|c| c.is_finite());

    if in_range && finite { Some(hit) } else { None }
}

pub fn resolve(wheel: &mut Wheel, hit: Option<RayHit>, dt: Real) {
    let config = wheel.config;
    let state = &mut wheel.state;
    let max_len = config.max_suspension_length();

    match hit {
        Some(hit) => {
            // Solid casts starting inside geometry report no usable normal.
            let normal = if hit.normal.norm_squared() > 1e-12 {
                hit.normal.normalize()
            } else {
                -state.direction
            };

            state.contact = ContactState::Grounded;
            state.contact_point = hit.point;
            state.contact_normal = normal;
            state.contact_distance = hit.distance - config.radius;
            state.suspension_length = state.contact_distance.clamp(0.0, max_len);

            let force = compute_suspension_force(
                &config,
                state.suspension_length,
                state.last_suspension_length,
                dt,
            );
            state.suspension_velocity = force.velocity;
            state.suspension_force = force.total;
        }
        None => {
            state.contact = ContactState::Airborne;
            state.suspension_length = max_len;
            state.contact_distance = max_len;
            state.contact_normal = -state.direction;
            state.contact_point = state.hard_point + state.direction * config.ray_length();
            state.suspension_velocity = 0.0;
            state.suspension_force = 0.0;
        }
    }

    state.last_suspension_length = state.suspension_length;
}

/// Force vector the suspension pushes on the chassis with this tick.
pub fn force_vector(wheel: &Wheel) -> Vector<Real> {
    wheel.state.contact_normal * wheel.state.suspension_force
}
