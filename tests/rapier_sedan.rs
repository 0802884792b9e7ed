//! The sedan preset driven through a real rapier world.

use raycast_vehicle::{RapierBackend, VehicleConfig, VehicleController};
use rapier3d::prelude::*;

const DT: Real = 1.0 / 60.0;

struct World {
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl World {
    fn with_ground() -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground = bodies.insert(RigidBodyBuilder::fixed().translation(vector![0.0, -0.1, 0.0]));
        let floor = ColliderBuilder::cuboid(200.0, 0.1, 200.0);
        colliders.insert_with_parent(floor, ground, &mut bodies);

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&colliders);

        Self {
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline,
        }
    }

    fn spawn_chassis(&mut self, height: Real) -> RigidBodyHandle {
        let body = self
            .bodies
            .insert(RigidBodyBuilder::dynamic().translation(vector![0.0, height, 0.0]));
        // 2.0 x 0.7 x 4.2 m box weighing 1350 kg.
        let collider = ColliderBuilder::cuboid(1.0, 0.35, 2.1)
            .density(1350.0 / 5.88)
            .friction(0.0);
        self.colliders.insert_with_parent(collider, body, &mut self.bodies);
        body
    }

    fn step(&mut self, vehicle: &mut VehicleController) {
        let mut backend =
            RapierBackend::new(&mut self.bodies, &self.colliders, &self.query_pipeline);
        vehicle.tick(&mut backend, DT).unwrap();

        self.pipeline.step(
            &vector![0.0, -9.81, 0.0],
            &IntegrationParameters { dt: DT, ..IntegrationParameters::default() },
            &mut self.islands,
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
    }
}

fn settled_sedan() -> (World, VehicleController, RigidBodyHandle) {
    let mut world = World::with_ground();
    let body = world.spawn_chassis(1.3);
    let mut vehicle = VehicleController::with_chassis(body, &VehicleConfig::sedan()).unwrap();

    for _ in 0..180 {
        world.step(&mut vehicle);
    }
    (world, vehicle, body)
}

#[test]
fn sedan_settles_on_its_suspension() {
    let (world, vehicle, body) = settled_sedan();

    assert_eq!(vehicle.num_wheels_in_contact(), 4);

    let chassis = &world.bodies[body];
    let y = chassis.translation().y;
    assert!(y > 0.8 && y < 1.4, "chassis height {y}");
    assert!(chassis.linvel().y.abs() < 0.2);

    for wheel in vehicle.wheels() {
        let state = wheel.state();
        assert!(state.suspension_length < wheel.config().max_suspension_length());
        assert!(state.suspension_force > 0.0);
    }
}

#[test]
fn rear_drive_pushes_the_sedan_forward() {
    let (mut world, mut vehicle, body) = settled_sedan();
    let handles: Vec<_> = vehicle.handles().collect();
    vehicle.set_engine_force(handles[2], 1500.0).unwrap();
    vehicle.set_engine_force(handles[3], 1500.0).unwrap();

    for _ in 0..60 {
        world.step(&mut vehicle);
    }

    assert!(world.bodies[body].linvel().z > 1.0);
    assert!(vehicle.current_speed() > 1.0);
    assert!(vehicle.wheels()[2].state().angular_velocity > 0.0);
}

#[test]
fn positive_front_steering_turns_left() {
    let (mut world, mut vehicle, body) = settled_sedan();
    let handles: Vec<_> = vehicle.handles().collect();
    for &front in &handles[..2] {
        vehicle.set_steering(front, 0.3).unwrap();
    }
    for &rear in &handles[2..] {
        vehicle.set_engine_force(rear, 1500.0).unwrap();
    }

    for _ in 0..90 {
        world.step(&mut vehicle);
    }

    // +Y up, +Z forward: left is +X and a left turn is positive yaw.
    let chassis = &world.bodies[body];
    assert!(chassis.angvel().y > 0.0, "yaw rate {}", chassis.angvel().y);
    assert!(chassis.translation().x > 0.0);
}
