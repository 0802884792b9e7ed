//! Raycast vehicle dynamics.
//!
//! A vehicle is one chassis rigid body plus a list of virtual wheels. Each
//! wheel casts a ray along its suspension every tick; the controller turns
//! the hits into spring/damper and tire friction forces and applies their sum
//! to the chassis once per tick.
//!
//! The host physics engine is reached through [`PhysicsBackend`];
//! [`RapierBackend`] adapts `rapier3d`.

pub mod backend;
pub mod config;
pub mod debug_builders;
pub mod dynamics;
pub mod error;
pub mod pose;
pub mod rapier_backend;
pub mod vehicle;

pub use backend::{ChassisState, PhysicsBackend, RayHit};
pub use config::{ChassisAxes, VehicleConfig, VehicleTuning, WheelConfig};
pub use debug_builders::DebugOverlay;
pub use dynamics::{ContactState, Wheel, WheelHandle, WheelInput, WheelState, Wrench};
pub use error::{Result, VehicleError};
pub use pose::{WheelPose, WheelPoseSnapshot};
pub use rapier_backend::RapierBackend;
pub use vehicle::{DriveSignal, VehicleController};
