// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY PRIMITIVES (INTROSPECTION ONLY)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives built from a vehicle's wheel state:
// - DebugRay: suspension ray casts, load bars
// - DebugWheel: per-wheel numeric state (contact, length, force, skid)
// - DebugSlipRay: side slip direction/magnitude at the contact
//
// The overlay is optional and read-only. It is never required for the
// simulation to be correct and has no physics side effects.
// ==============================================================================

use rapier3d::math::{Isometry, Point, Real, Vector};
use serde::Serialize;

use crate::config::ChassisAxes;
use crate::dynamics::wheel::Wheel;

const COLOR_HIT: [f32; 3] = [0.1, 0.9, 0.2];
const COLOR_MISS: [f32; 3] = [0.9, 0.2, 0.1];
const COLOR_LOAD: [f32; 3] = [0.2, 0.4, 1.0];
const COLOR_SLIP: [f32; 3] = [1.0, 0.8, 0.0];
const COLOR_SKID: [f32; 3] = [1.0, 0.0, 1.0];

/// Newtons per metre of load bar.
const LOAD_BAR_SCALE: f32 = 1.0 / 5_000.0;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Option<DebugChassis>,
    pub suspension_rays: Vec<DebugRay>,
    pub load_bars: Vec<DebugRay>,
    pub wheels: Vec<DebugWheel>,
    pub slip_vectors: Vec<DebugSlipRay>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugChassis {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion
    pub right: [f32; 3],    // world-space lateral axis
    pub forward: [f32; 3],  // world-space forward axis
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugSlipRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub magnitude: f32,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugWheel {
    pub index: usize,
    pub center: [f32; 3], // world space
    pub radius: f32,
    pub grounded: bool,
    pub suspension_length: f32,
    pub suspension_force: f32,
    pub forward_force: f32,
    pub side_force: f32,
    pub skid_factor: f32,
    pub sliding: bool,
    pub steering: f32,
}

impl DebugOverlay {
    pub fn push_chassis(&mut self, iso: &Isometry<Real>, axes: &ChassisAxes) {
        self.chassis = Some(DebugChassis {
            position: iso.translation.vector.into(),
            rotation: [iso.rotation.i, iso.rotation.j, iso.rotation.k, iso.rotation.w],
            right: v3(iso.rotation * axes.right_local()),
            forward: v3(iso.rotation * axes.forward_local()),
        });
    }

    pub fn push_wheel(&mut self, index: usize, wheel: &Wheel) {
        let config = wheel.config();
        let state = wheel.state();
        let grounded = state.is_in_contact();

        self.suspension_rays.push(DebugRay {
            origin: p3(state.hard_point),
            direction: v3(state.direction),
            length: config.ray_length(),
            hit: grounded.then(|| p3(state.contact_point)),
            color: if grounded { COLOR_HIT } else { COLOR_MISS },
        });

        if grounded {
            self.load_bars.push(DebugRay {
                origin: p3(state.contact_point),
                direction: v3(state.contact_normal),
                length: state.suspension_force * LOAD_BAR_SCALE,
                hit: None,
                color: COLOR_LOAD,
            });

            let slip = state.side * state.side_slip;
            let magnitude = slip.norm();
            if magnitude > 1e-4 {
                self.slip_vectors.push(DebugSlipRay {
                    origin: p3(state.contact_point),
                    direction: v3(slip / magnitude),
                    magnitude,
                    color: if state.sliding { COLOR_SKID } else { COLOR_SLIP },
                });
            }
        }

        self.wheels.push(DebugWheel {
            index,
            center: p3(state.center()),
            radius: config.radius,
            grounded,
            suspension_length: state.suspension_length,
            suspension_force: state.suspension_force,
            forward_force: state.forward_force,
            side_force: state.side_force,
            skid_factor: state.skid_factor,
            sliding: state.sliding,
            steering: state.applied_input.steering,
        });
    }
}

#[inline] fn v3(v: Vector<Real>) -> [f32; 3] { [v.x, v.y, v.z] }
#[inline] fn p3(p: Point<Real>)  -> [f32; 3] { [p.x, p.y, p.z] }
