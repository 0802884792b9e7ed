// src/physics.rs

use std::collections::HashMap;

use raycast_vehicle::{RapierBackend, VehicleConfig, VehicleController};
use rapier3d::prelude::*;
use tracing::{debug, info, warn};

use crate::steering::{Driver, DriverConfig, DriverInput};

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

/// Bodies further than this from the origin (or non-finite) are reset.
const RUNAWAY_LIMIT: Real = 1_000.0;

#[derive(Debug, Clone)]
pub struct ChassisConfig {
    pub mass: f32,                      // kg
    pub linear_damping: f32,            // drag
    pub angular_damping: f32,           // rotational drag
    pub half_extents: [f32; 3],         // [hx, hy, hz] meters
    pub com_offset: [f32; 3],           // local offset from collider center
    pub spawn_height: f32,              // m above the ground
}

pub const GT86_CHASSIS: ChassisConfig = ChassisConfig {
    mass: 1350.0,
    linear_damping: 0.08,
    angular_damping: 0.5,
    half_extents: [1.0, 0.35, 2.1],
    com_offset: [0.0, -0.15, 0.0], // slightly below visual center
    spawn_height: 1.3,
};

pub struct Car {
    pub body: RigidBodyHandle,
    pub vehicle: VehicleController,
    pub driver: Driver,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,               // gravity vector
    pub pipeline: PhysicsPipeline,           // physics pipeline
    pub island_manager: IslandManager,       // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,      // broad-phase collision detection
    pub narrow_phase: NarrowPhase,           // collision detection
    pub bodies: RigidBodySet,                // for rigid bodies
    pub colliders: ColliderSet,              // for collision shapes
    pub joints: ImpulseJointSet,             // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver,                      // continuous collision detection
    pub query_pipeline: QueryPipeline,       // for raycasting
    pub cars: HashMap<String, Car>,          // playerId → car
    vehicle_config: VehicleConfig,
    chassis_config: ChassisConfig,
}

impl PhysicsWorld {
    pub fn new(vehicle_config: VehicleConfig) -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Static ground slab centered at (0, -0.1, 0); top surface at y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 0.1, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&colliders);

        info!(
            bodies = bodies.len(),
            colliders = colliders.len(),
            wheels = vehicle_config.wheels.len(),
            "ground inserted"
        );

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline,
            cars: HashMap::new(),
            vehicle_config,
            chassis_config: GT86_CHASSIS,
        }
    }

    /// Spawns a chassis body for `id` at ground position `(x, z)` and binds a
    /// fresh controller to it.
    pub fn spawn_car(
        &mut self,
        id: &str,
        x: f32,
        z: f32,
    ) -> raycast_vehicle::Result<RigidBodyHandle> {
        let mut vehicle = VehicleController::new(&self.vehicle_config)?;

        let config = &self.chassis_config;
        let [hx, hy, hz] = config.half_extents;
        let [cx, cy, cz] = config.com_offset;
        let volume = 8.0 * hx * hy * hz;
        let density = config.mass / volume; // ρ = m / V

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![x, config.spawn_height, z])
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz])
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        vehicle.bind_chassis(handle);

        self.cars.insert(
            id.to_string(),
            Car {
                body: handle,
                vehicle,
                driver: Driver::new(DriverConfig::sedan()),
            },
        );

        info!(player = id, x, z, body = ?handle, "spawned vehicle");
        Ok(handle)
    }

    pub fn remove_car(&mut self, id: &str) {
        if let Some(car) = self.cars.remove(id) {
            self.bodies.remove(
                car.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                true,
            );
            info!(player = id, "removed vehicle");
        }
    }

    /// Stores input for a player's car; the forces follow on the next step.
    pub fn set_input(&mut self, id: &str, input: DriverInput) -> bool {
        match self.cars.get_mut(id) {
            Some(car) => {
                car.driver.input = input.clamped();
                true
            }
            None => false,
        }
    }

    pub fn step(&mut self, dt: Real) {
        // 1) Inputs → per-wheel commands → vehicle forces
        self.drive_vehicles(dt);

        // 2) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        // 3) Prevent bodies from exploding to insane coordinates
        self.reset_runaway_bodies();
    }

    fn drive_vehicles(&mut self, dt: Real) {
        let Self {
            cars,
            bodies,
            colliders,
            query_pipeline,
            ..
        } = self;

        let groups = InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND);

        for (id, car) in cars.iter_mut() {
            if let Err(err) = car.driver.apply(&mut car.vehicle, dt) {
                warn!(player = %id, %err, "rejected driver input");
            }

            let mut backend =
                RapierBackend::new(&mut *bodies, &*colliders, &*query_pipeline).with_groups(groups);
            if let Err(err) = car.vehicle.tick(&mut backend, dt) {
                warn!(player = %id, %err, "vehicle tick failed");
                continue;
            }

            debug!(
                player = %id,
                speed = car.vehicle.current_speed(),
                grounded = car.vehicle.num_wheels_in_contact(),
                "vehicle stepped"
            );
        }
    }

    fn reset_runaway_bodies(&mut self) {
        let spawn_height = self.chassis_config.spawn_height;

        for (handle, body) in self.bodies.iter_mut() {
            let pos = *body.translation();
            let bad = !(pos.x.is_finite() && pos.y.is_finite() && pos.z.is_finite())
                || pos.abs().max() > RUNAWAY_LIMIT;

            if bad {
                let safe = vector![0.0, spawn_height, 0.0];
                body.set_translation(safe, true);
                body.set_rotation(Rotation::identity(), true);
                body.set_linvel(Vector::zeros(), true);
                body.set_angvel(Vector::zeros(), true);

                warn!(body = ?handle, from = ?pos, "reset runaway body");
            }
        }
    }
}
