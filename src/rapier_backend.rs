//! [`PhysicsBackend`] over rapier's body/collider sets and query pipeline.

use rapier3d::math::{Point, Real, Vector};
use rapier3d::prelude::{
    ColliderSet, InteractionGroups, QueryFilter, QueryPipeline, Ray, RigidBodyHandle, RigidBodySet,
};

use crate::backend::{ChassisState, PhysicsBackend, RayHit};

pub struct RapierBackend<'a> {
    pub bodies: &'a mut RigidBodySet,
    pub colliders: &'a ColliderSet,
    pub query_pipeline: &'a QueryPipeline,
    /// Restricts which colliders the suspension rays can hit.
    pub groups: Option<InteractionGroups>,
}

impl<'a> RapierBackend<'a> {
    pub fn new(
        bodies: &'a mut RigidBodySet,
        colliders: &'a ColliderSet,
        query_pipeline: &'a QueryPipeline,
    ) -> Self {
        Self {
            bodies,
            colliders,
            query_pipeline,
            groups: None,
        }
    }

    pub fn with_groups(mut self, groups: InteractionGroups) -> Self {
        self.groups = Some(groups);
        self
    }
}

impl PhysicsBackend for RapierBackend<'_> {
    fn chassis_state(&self, chassis: RigidBodyHandle) -> Option<ChassisState> {
        let body = self.bodies.get(chassis)?;
        Some(ChassisState {
            position: *body.position(),
            linvel: *body.linvel(),
            angvel: *body.angvel(),
            center_of_mass: *body.center_of_mass(),
            mass: body.mass(),
        })
    }

    fn cast_ray(
        &self,
        origin: Point<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        exclude: RigidBodyHandle,
    ) -> Option<RayHit> {
        let mut filter = QueryFilter::default().exclude_rigid_body(exclude);
        if let Some(groups) = self.groups {
            filter = filter.groups(groups);
        }

        let ray = Ray::new(origin, dir);
        let (_collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &*self.bodies,
            self.colliders,
            &ray,
            max_distance,
            true,
            filter,
        )?;

        Some(RayHit {
            distance: hit.time_of_impact,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }

    fn apply_wrench(
        &mut self,
        chassis: RigidBodyHandle,
        impulse: Vector<Real>,
        torque_impulse: Vector<Real>,
    ) {
        if let Some(body) = self.bodies.get_mut(chassis) {
            body.apply_impulse(impulse, true);
            body.apply_torque_impulse(torque_impulse, true);
        }
    }
}
