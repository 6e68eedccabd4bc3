//! Capsule mover over the Rapier kinematic character controller.
//!
//! Collision resolution, stepping and slope limits stay inside Rapier's KCC; this
//! crate only configures it and reports contact flags back to the locomotion motor.
#![forbid(unsafe_code)]

use physics_rapier::PhysicsWorld;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::math::{Isometry, Point, Translation, UnitVector, Vector};
use rapier3d::prelude::{Capsule, QueryFilter, Ray, Real};

#[derive(Clone, Copy, Debug)]
pub struct CollisionProfile {
    /// Capsule radius in meters.
    pub capsule_radius: Real,
    /// Capsule cylinder height in meters (distance between sphere centers).
    pub capsule_height: Real,
    /// Maximum step height for auto-stepping in meters.
    pub step_height: Real,
    /// Minimum width of free space required after stepping.
    pub step_min_width: Real,
    /// Maximum climbable slope angle in radians.
    pub max_slope_angle: Real,
    /// Minimum slope angle where sliding begins (>= max_slope_angle).
    pub min_slope_slide_angle: Real,
    /// Distance to snap to ground in meters.
    pub ground_snap_distance: Real,
    /// Small separation to preserve between character and environment.
    pub offset: Real,
}

impl CollisionProfile {
    /// Roughly a 2 m tall humanoid with a 0.3 m step.
    pub fn third_person_default() -> Self {
        Self {
            capsule_radius: 0.5,
            capsule_height: 1.0,
            step_height: 0.3,
            step_min_width: 0.15,
            max_slope_angle: 45.0_f32.to_radians(),
            min_slope_slide_angle: 50.0_f32.to_radians(),
            ground_snap_distance: 0.2,
            offset: 0.02,
        }
    }

    /// Distance from the capsule center down to the bottom of the feet.
    pub fn foot_offset(&self) -> Real {
        self.capsule_height * 0.5 + self.capsule_radius
    }

    fn capsule(&self) -> Capsule {
        Capsule::new_y(self.capsule_height * 0.5, self.capsule_radius)
    }

    fn apply_to(&self, controller: &mut KinematicCharacterController) {
        controller.autostep = if self.step_height > 0.0 {
            Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.step_height),
                min_width: CharacterLength::Absolute(self.step_min_width),
                include_dynamic_bodies: false,
            })
        } else {
            None
        };
        controller.max_slope_climb_angle = self.max_slope_angle;
        controller.min_slope_slide_angle = self.min_slope_slide_angle.max(self.max_slope_angle);
        controller.snap_to_ground = if self.ground_snap_distance > 0.0 {
            Some(CharacterLength::Absolute(self.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(self.offset);
    }
}

impl Default for CollisionProfile {
    fn default() -> Self {
        Self::third_person_default()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CollisionMoveResult {
    pub position: Isometry<Real>,
    pub translation: Vector<Real>,
    pub grounded: bool,
    pub hit_wall: bool,
    pub hit_ceiling: bool,
}

pub struct CharacterCollision {
    profile: CollisionProfile,
    controller: KinematicCharacterController,
    capsule: Capsule,
}

impl CharacterCollision {
    pub fn new(profile: CollisionProfile) -> Self {
        let capsule = profile.capsule();
        let mut controller = KinematicCharacterController::default();
        profile.apply_to(&mut controller);
        Self {
            profile,
            controller,
            capsule,
        }
    }

    pub fn profile(&self) -> CollisionProfile {
        self.profile
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    pub fn move_character(
        &mut self,
        world: &PhysicsWorld,
        position: Isometry<Real>,
        desired_translation: Vector<Real>,
        dt: Real,
    ) -> CollisionMoveResult {
        let up_vec = world.up();
        let up = UnitVector::new_normalize(up_vec);
        self.controller.up = up;
        let wall_dot = self.controller.max_slope_climb_angle.cos();
        let rising = desired_translation.dot(&up_vec) > 0.0;

        // Snapping or stepping while rising would cancel a jump on its first tick.
        let original_autostep = self.controller.autostep;
        let original_snap = self.controller.snap_to_ground;
        if rising {
            self.controller.autostep = None;
            self.controller.snap_to_ground = None;
        }

        let mut hit_wall = false;
        let mut hit_ceiling = false;
        let output = self.controller.move_shape(
            dt,
            world.bodies(),
            world.colliders(),
            world.query_pipeline(),
            &self.capsule,
            &position,
            desired_translation,
            QueryFilter::default(),
            |collision| {
                let up_dot = collision.hit.normal1.dot(&up);
                if rising && up_dot < -0.1 {
                    hit_ceiling = true;
                } else if up_dot <= wall_dot {
                    hit_wall = true;
                }
            },
        );
        self.controller.autostep = original_autostep;
        self.controller.snap_to_ground = original_snap;

        let next_position = Translation::from(output.translation) * position;
        let grounded = !rising && (output.grounded || self.probe_ground(world, next_position));
        CollisionMoveResult {
            position: next_position,
            translation: output.translation,
            grounded,
            hit_wall,
            hit_ceiling,
        }
    }

    /// Short ray under the feet for walkable ground within the snap distance.
    fn probe_ground(&self, world: &PhysicsWorld, position: Isometry<Real>) -> bool {
        let snap_distance = self.profile.ground_snap_distance.max(0.0);
        if snap_distance <= 0.0 {
            return false;
        }
        let up = world.up();
        let foot_radius = self.profile.capsule_radius * 0.75;
        let foot_center =
            position.translation.vector - up * (self.profile.foot_offset() - foot_radius);
        let ray = Ray::new(Point::from(foot_center), -up);
        let max_toi = foot_radius + snap_distance + self.profile.offset + 1.0e-3;
        let Some((_, hit)) = world.query_pipeline().cast_ray_and_get_normal(
            world.bodies(),
            world.colliders(),
            &ray,
            max_toi,
            true,
            QueryFilter::default(),
        ) else {
            return false;
        };
        hit.normal.dot(&up) >= self.controller.max_slope_climb_angle.cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::*;

    fn floor_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(vector![0.0, -50.0, 0.0]);
        world.insert_ground_slab(10.0);
        world.step(1.0 / 60.0);
        world
    }

    #[test]
    fn falling_capsule_lands_and_reports_ground() {
        let world = floor_world();
        let mut collision = CharacterCollision::new(CollisionProfile::default());
        let position = Isometry::translation(0.0, 1.5, 0.0);
        let result =
            collision.move_character(&world, position, vector![0.0, -1.0, 0.0], 1.0 / 60.0);
        assert!(result.grounded);
        assert!(result.position.translation.y >= collision.profile().foot_offset() - 0.01);
    }

    #[test]
    fn rising_move_is_never_grounded() {
        let world = floor_world();
        let mut collision = CharacterCollision::new(CollisionProfile::default());
        let standing = Isometry::translation(0.0, collision.profile().foot_offset() + 0.02, 0.0);
        let result =
            collision.move_character(&world, standing, vector![0.0, 0.15, 0.0], 1.0 / 60.0);
        assert!(!result.grounded);
        assert!(result.translation.y > 0.1);
    }

    #[test]
    fn wall_blocks_planar_motion() {
        let mut world = floor_world();
        let wall = ColliderBuilder::cuboid(0.1, 2.0, 3.0)
            .translation(vector![1.0, 2.0, 0.0])
            .build();
        world.insert_static_collider(wall);
        world.step(1.0 / 60.0);

        let mut collision = CharacterCollision::new(CollisionProfile::default());
        let mut position = Isometry::translation(0.0, collision.profile().foot_offset() + 0.02, 0.0);
        let mut hit_wall = false;
        for _ in 0..30 {
            let result =
                collision.move_character(&world, position, vector![0.1, -0.1, 0.0], 1.0 / 60.0);
            hit_wall |= result.hit_wall;
            position = result.position;
        }
        assert!(hit_wall);
        assert!(position.translation.x < 0.9 - collision.profile().capsule_radius + 0.05);
    }
}
