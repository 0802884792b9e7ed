// ==============================================================================
// wheel.rs — WHEEL MODEL (STATIC CONFIG + PER-TICK STATE + INPUT)
// ------------------------------------------------------------------------------
// A Wheel is three things:
// - WheelConfig (immutable once added to a vehicle)
// - WheelInput  (steering / engine / brake, written by setters, read at tick)
// - WheelState  (everything the solver writes every tick; read by render/debug)
//
// ContactState is resampled every tick from the ray cast alone. The only
// memory carried between ticks is the suspension length (damper velocity)
// and the spin (rotation + delta_rotation).
// ==============================================================================

use std::fmt;

use rapier3d::math::{Point, Real, Vector};
use serde::Serialize;

use crate::config::WheelConfig;

/// Stable index of a wheel inside its vehicle (registration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WheelHandle(pub(crate) usize);

impl WheelHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for WheelHandle {
    fn from(index: usize) -> Self {
        WheelHandle(index)
    }
}

impl fmt::Display for WheelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wheel #{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactState {
    Airborne,
    Grounded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelInput {
    pub steering: Real,     // rad, about the chassis up axis
    pub engine_force: Real, // N, signed
    pub brake_force: Real,  // N, >= 0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub contact: ContactState,
    pub applied_input: WheelInput, // inputs the last tick simulated with

    // suspension
    pub suspension_length: Real,
    pub last_suspension_length: Real,
    pub suspension_velocity: Real, // m/s, > 0 while compressing
    pub suspension_force: Real,    // N along contact_normal

    // world-space ray + wheel basis, refreshed every tick
    pub hard_point: Point<Real>,
    pub direction: Vector<Real>,
    pub axle: Vector<Real>,
    pub forward: Vector<Real>,
    pub side: Vector<Real>,

    // contact
    pub contact_point: Point<Real>,
    pub contact_normal: Vector<Real>,
    pub contact_distance: Real,

    // friction
    pub forward_slip: Real, // m/s
    pub side_slip: Real,    // m/s
    pub forward_force: Real,
    pub side_force: Real,
    pub skid_factor: Real, // 1 = full grip, < 1 = friction circle saturated
    pub sliding: bool,

    // spin
    pub rotation: Real,       // rad about the axle
    pub delta_rotation: Real, // rad per tick
    pub angular_velocity: Real,
}

impl WheelState {
    fn at_rest(config: &WheelConfig) -> Self {
        let direction = config.suspension_direction();
        let hard_point = config.connection_point();
        Self {
            contact: ContactState::Airborne,
            applied_input: WheelInput::default(),
            suspension_length: config.suspension_rest_length,
            last_suspension_length: config.suspension_rest_length,
            suspension_velocity: 0.0,
            suspension_force: 0.0,
            hard_point,
            direction,
            axle: config.axle_direction(),
            forward: direction.cross(&config.axle_direction()),
            side: config.axle_direction(),
            contact_point: hard_point + direction * config.ray_length(),
            contact_normal: -direction,
            contact_distance: config.max_suspension_length(),
            forward_slip: 0.0,
            side_slip: 0.0,
            forward_force: 0.0,
            side_force: 0.0,
            skid_factor: 1.0,
            sliding: false,
            rotation: 0.0,
            delta_rotation: 0.0,
            angular_velocity: 0.0,
        }
    }

    pub fn is_in_contact(&self) -> bool {
        self.contact == ContactState::Grounded
    }

    /// World-space centre of the wheel hub.
    pub fn center(&self) -> Point<Real> {
        self.hard_point + self.direction * self.suspension_length
    }

    pub(crate) fn clear_friction(&mut self) {
        self.forward_slip = 0.0;
        self.side_slip = 0.0;
        self.forward_force = 0.0;
        self.side_force = 0.0;
        self.skid_factor = 1.0;
        self.sliding = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    pub(crate) config: WheelConfig,
    pub(crate) input: WheelInput,
    pub(crate) state: WheelState,
}

impl Wheel {
    /// Builds a wheel from an already validated configuration.
    pub(crate) fn new(config: WheelConfig) -> Self {
        Self {
            state: WheelState::at_rest(&config),
            input: WheelInput::default(),
            config,
        }
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn input(&self) -> &WheelInput {
        &self.input
    }

    pub fn state(&self) -> &WheelState {
        &self.state
    }
}
