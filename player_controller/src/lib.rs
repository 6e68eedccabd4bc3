//! Player controller composition (input + locomotion + collision + camera).
#![forbid(unsafe_code)]

use character_collision::{CharacterCollision, CollisionMoveResult, CollisionProfile};
use character_motor_locomotion::{
    sample_axes, DirectionKeys, LocomotionConfig, LocomotionController, MoveReport,
    RigidMotionMover, TickInput, TickReport,
};
use physics_rapier::PhysicsWorld;
use player_camera::{CameraPose, PlayerCamera};
use rapier3d::math::{Isometry, Rotation, Vector};
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub keys: DirectionKeys,
    /// Analog stick `[lateral, forward]`, summed with the keys.
    pub move_axis: [Real; 2],
    /// Held state of the jump button.
    pub jump: bool,
    pub look_delta: [Real; 2],
    /// Mouse wheel; positive zooms the camera in.
    pub scroll: Real,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerIntent {
    pub motion: TickInput,
    pub look_delta: [Real; 2],
    pub zoom: Real,
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> PlayerIntent;
}

/// Maps raw signals straight through and turns the held jump button into a
/// press edge.
#[derive(Default)]
pub struct DirectInputAdapter {
    jump_held: bool,
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> PlayerIntent {
        let keys = raw.keys.axes();
        let intent = sample_axes([keys[0] + raw.move_axis[0], keys[1] + raw.move_axis[1]]);
        let jump_pressed = raw.jump && !self.jump_held;
        self.jump_held = raw.jump;
        PlayerIntent {
            motion: TickInput {
                intent,
                jump_pressed,
            },
            look_delta: raw.look_delta,
            zoom: raw.scroll,
        }
    }
}

/// Routes locomotion displacements through the Rapier character controller.
pub struct KccMover<'a> {
    world: &'a PhysicsWorld,
    collision: &'a mut CharacterCollision,
    position: Isometry<Real>,
    last: Option<CollisionMoveResult>,
}

impl<'a> KccMover<'a> {
    pub fn new(
        world: &'a PhysicsWorld,
        collision: &'a mut CharacterCollision,
        position: Isometry<Real>,
    ) -> Self {
        Self {
            world,
            collision,
            position,
            last: None,
        }
    }

    pub fn position(&self) -> Isometry<Real> {
        self.position
    }

    pub fn last_result(&self) -> Option<CollisionMoveResult> {
        self.last
    }
}

impl RigidMotionMover for KccMover<'_> {
    fn move_by(&mut self, displacement: Vector<Real>, dt: Real) -> MoveReport {
        let result = self
            .collision
            .move_character(self.world, self.position, displacement, dt);
        self.position = result.position;
        self.last = Some(result);
        MoveReport {
            translation: result.translation,
            grounded: result.grounded,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlayerFrame {
    pub position: Isometry<Real>,
    pub speed: Real,
    pub grounded: bool,
    pub collision: Option<CollisionMoveResult>,
    pub camera: CameraPose,
    pub report: TickReport,
}

pub struct PlayerController<A: InputAdapter> {
    input: A,
    locomotion: LocomotionController<PlayerCamera>,
    collision: CharacterCollision,
    position: Isometry<Real>,
}

impl<A: InputAdapter> PlayerController<A> {
    /// `position` is the capsule center; its rotation seeds the starting heading.
    pub fn new(
        input: A,
        config: LocomotionConfig,
        profile: CollisionProfile,
        camera: PlayerCamera,
        position: Isometry<Real>,
    ) -> Self {
        let forward = position.rotation * Vector::z();
        let mut locomotion = LocomotionController::new(config, camera, forward);
        locomotion
            .camera_mut()
            .snap_to_target(position.translation.vector);
        let position = Isometry::from_parts(position.translation, locomotion.state().orientation);
        Self {
            input,
            locomotion,
            collision: CharacterCollision::new(profile),
            position,
        }
    }

    pub fn position(&self) -> Isometry<Real> {
        self.position
    }

    pub fn orientation(&self) -> Rotation<Real> {
        self.position.rotation
    }

    pub fn locomotion(&self) -> &LocomotionController<PlayerCamera> {
        &self.locomotion
    }

    pub fn camera(&self) -> &PlayerCamera {
        self.locomotion.camera()
    }

    pub fn camera_mut(&mut self) -> &mut PlayerCamera {
        self.locomotion.camera_mut()
    }

    pub fn collision(&self) -> &CharacterCollision {
        &self.collision
    }

    /// Moves the character without simulating; contact is re-evaluated next tick.
    pub fn teleport(&mut self, translation: Vector<Real>) -> CameraPose {
        self.position.translation.vector = translation;
        self.locomotion.set_grounded(false);
        self.locomotion.camera_mut().snap_to_target(translation)
    }

    pub fn tick(&mut self, world: &PhysicsWorld, raw: RawInput, dt: Real) -> PlayerFrame {
        let intent = self.input.intent(raw);
        let camera = self.locomotion.camera_mut();
        camera.apply_look_delta(intent.look_delta);
        camera.zoom(intent.zoom);

        let mut mover = KccMover::new(world, &mut self.collision, self.position);
        let report = self.locomotion.step(intent.motion, &mut mover, dt);
        let collision = mover.last_result();
        self.position = Isometry::from_parts(
            mover.position().translation,
            self.locomotion.state().orientation,
        );

        let camera = self
            .locomotion
            .camera_mut()
            .update_from_target(self.position.translation.vector, dt);
        PlayerFrame {
            position: self.position,
            speed: self.locomotion.speed(),
            grounded: self.locomotion.is_grounded(),
            collision,
            camera,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use character_motor_locomotion::MovementMode;
    use player_camera::OrbitSettings;
    use rapier3d::prelude::ColliderBuilder;

    const DT: Real = 1.0 / 60.0;

    fn flat_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(Vector::new(0.0, -50.0, 0.0));
        world.insert_ground_slab(40.0);
        world.step(DT);
        world
    }

    /// Two stairs up onto a long platform 0.3 m above the floor, ahead along +Z.
    fn stairs_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(Vector::new(0.0, -50.0, 0.0));
        world.insert_ground_slab(40.0);
        for i in 0..2 {
            let height = 0.1 * (i as f32 + 1.0);
            let step = ColliderBuilder::cuboid(1.5, height * 0.5, 0.4)
                .translation(Vector::new(0.0, height * 0.5, 4.0 + i as f32 * 0.8))
                .build();
            world.insert_static_collider(step);
        }
        let platform = ColliderBuilder::cuboid(1.5, 0.15, 10.0)
            .translation(Vector::new(0.0, 0.15, 15.2))
            .build();
        world.insert_static_collider(platform);
        world.step(DT);
        world
    }

    fn spawn() -> PlayerController<DirectInputAdapter> {
        let profile = CollisionProfile::default();
        let position = Isometry::translation(0.0, profile.foot_offset() + 0.05, 0.0);
        // Looking down +Z, the spawn facing.
        let mut camera = PlayerCamera::new(OrbitSettings::default());
        camera.set_look(std::f32::consts::PI, 0.0);
        PlayerController::new(
            DirectInputAdapter::default(),
            LocomotionConfig {
                top_speed: 6.0,
                ..Default::default()
            },
            profile,
            camera,
            position,
        )
    }

    fn forward() -> RawInput {
        RawInput {
            keys: DirectionKeys {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn jump_edge_fires_once_per_press() {
        let mut adapter = DirectInputAdapter::default();
        let held = RawInput {
            jump: true,
            ..Default::default()
        };
        assert!(adapter.intent(held).motion.jump_pressed);
        assert!(!adapter.intent(held).motion.jump_pressed);
        adapter.intent(RawInput::default());
        assert!(adapter.intent(held).motion.jump_pressed);
    }

    #[test]
    fn keys_and_stick_combine_into_unit_intent() {
        let mut adapter = DirectInputAdapter::default();
        let raw = RawInput {
            keys: DirectionKeys {
                right: true,
                ..Default::default()
            },
            move_axis: [0.0, 0.6],
            ..Default::default()
        };
        let intent = adapter.intent(raw).motion.intent;
        assert!((intent.magnitude() - 1.0).abs() < 1.0e-5);
        assert!(intent.lateral > intent.forward);
    }

    #[test]
    fn controller_climbs_stairs_onto_platform() {
        let world = stairs_world();
        let mut controller = spawn();

        for _ in 0..240 {
            let frame = controller.tick(&world, forward(), DT);
            assert!(frame.speed <= 6.0 + 1.0e-4);
        }

        let position = controller.position().translation;
        assert!(position.z > 6.0);
        assert!(position.y > controller.collision().profile().foot_offset() + 0.2);
        assert!(controller.locomotion().is_grounded());
        let facing = controller.orientation() * Vector::z();
        assert!(facing.z > 0.9);
    }

    #[test]
    fn jump_leaves_and_returns_to_ground() {
        let world = flat_world();
        let mut controller = spawn();

        for _ in 0..10 {
            controller.tick(&world, RawInput::default(), DT);
        }
        assert!(controller.locomotion().is_grounded());
        let rest = controller.position().translation.y;

        let frame = controller.tick(
            &world,
            RawInput {
                jump: true,
                ..Default::default()
            },
            DT,
        );
        assert!(frame.report.output.jumped);
        assert!(!frame.grounded);

        let mut peak = rest;
        for _ in 0..90 {
            let frame = controller.tick(&world, RawInput::default(), DT);
            peak = peak.max(frame.position.translation.y);
        }
        assert!(peak > rest + 0.5);
        assert!(controller.locomotion().is_grounded());
        assert!((controller.position().translation.y - rest).abs() < 0.1);
    }

    #[test]
    fn reversing_coasts_before_turning_around() {
        let world = flat_world();
        let mut controller = spawn();
        for _ in 0..60 {
            controller.tick(&world, forward(), DT);
        }
        let back = RawInput {
            keys: DirectionKeys {
                back: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let frame = controller.tick(&world, back, DT);
        assert_eq!(frame.report.output.state.mode, MovementMode::Coasting);
        assert!(frame.speed > 0.5);
    }

    #[test]
    fn right_key_strafes_toward_screen_right() {
        let world = flat_world();
        let mut controller = spawn();
        let right = RawInput {
            keys: DirectionKeys {
                right: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let screen_right = controller.camera().view_right();
        let start = controller.position().translation.vector;
        for _ in 0..30 {
            controller.tick(&world, right, DT);
        }
        let moved = controller.position().translation.vector - start;
        assert!(moved.dot(&screen_right) > 0.5);
    }

    #[test]
    fn teleport_drops_contact_and_lands_again() {
        let world = flat_world();
        let mut controller = spawn();
        for _ in 0..5 {
            controller.tick(&world, RawInput::default(), DT);
        }
        let rest = controller.position().translation.y;

        let target = Vector::new(2.0, rest + 2.0, 0.0);
        let pose = controller.teleport(target);
        assert_eq!(controller.position().translation.vector, target);
        assert!(!controller.locomotion().is_grounded());
        assert!((pose.pivot - (target + Vector::new(0.0, 2.0, 0.0))).norm() < 1.0e-5);

        for _ in 0..60 {
            controller.tick(&world, RawInput::default(), DT);
        }
        assert!(controller.locomotion().is_grounded());
        assert!((controller.position().translation.y - rest).abs() < 0.1);
    }

    #[test]
    fn scroll_zooms_the_camera() {
        let world = flat_world();
        let mut controller = spawn();
        let before = controller.camera().distance();
        controller.tick(
            &world,
            RawInput {
                scroll: 20.0,
                ..Default::default()
            },
            DT,
        );
        assert!(controller.camera().distance() < before);
    }

    #[test]
    fn camera_yaw_steers_forward_input() {
        let world = flat_world();
        let mut controller = spawn();
        controller
            .camera_mut()
            .set_look(-std::f32::consts::FRAC_PI_2, 0.2);
        for _ in 0..60 {
            controller.tick(&world, forward(), DT);
        }
        let position = controller.position().translation;
        assert!(position.x < -0.5);
        assert!(position.z.abs() < 0.2);
    }
}
