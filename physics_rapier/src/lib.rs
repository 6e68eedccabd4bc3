//! Rapier world hosting the static scene the locomotion mover collides with.
#![forbid(unsafe_code)]

use rapier3d::prelude::*;

/// Top surface of [`PhysicsWorld::insert_ground_slab`] sits at this height.
pub const GROUND_TOP: Real = 0.0;
const GROUND_HALF_THICKNESS: Real = 0.1;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// World up derived from gravity; +Y when gravity is zero.
    pub fn up(&self) -> Vector<Real> {
        if self.gravity.norm_squared() > 1.0e-6 {
            -self.gravity.normalize()
        } else {
            Vector::y()
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Refreshes scene queries without advancing the simulation.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    pub fn insert_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    /// Square floor slab centred on the origin with its top face at [`GROUND_TOP`].
    pub fn insert_ground_slab(&mut self, half_extent: Real) -> ColliderHandle {
        let slab = ColliderBuilder::cuboid(half_extent, GROUND_HALF_THICKNESS, half_extent)
            .translation(vector![0.0, GROUND_TOP - GROUND_HALF_THICKNESS, 0.0])
            .build();
        self.insert_static_collider(slab)
    }
}
