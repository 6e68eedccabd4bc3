//! Third-person locomotion motor (camera-relative steering with reversal coasting).
//!
//! One tick runs five stages in order: input sampling, camera-relative mapping,
//! the moving/coasting state machine, planar integration, then vertical motion and
//! facing. [`tick`] is the pure form; [`LocomotionController`] is the thin driver a
//! host calls once per frame with its camera provider and rigid-motion mover.
#![forbid(unsafe_code)]

pub mod camera;
pub mod config;
pub mod input;
pub mod integrator;
pub mod math;
pub mod state;
pub mod vertical;

use engine_core::logging::{self, LogLevel};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

pub use camera::{desired_direction, CameraBasis, CameraBasisProvider, INTENT_THRESHOLD};
pub use config::{ConfigError, LocomotionConfig};
pub use input::{sample_axes, sample_keys, DirectionKeys, InputIntent};
pub use state::{update_mode, MotionState, MovementMode};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    pub intent: InputIntent,
    /// Rising edge of the jump command; edge detection belongs to the input adapter.
    pub jump_pressed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct TickOutput {
    pub state: MotionState,
    /// Displacement for the host mover: full velocity times `dt`.
    pub displacement: Vector<Real>,
    pub desired_direction: Vector<Real>,
    pub jumped: bool,
}

/// Advances `state` by one tick. `grounded` is the contact reported by the mover
/// after the previous tick's displacement.
pub fn tick(
    state: &MotionState,
    config: &LocomotionConfig,
    input: TickInput,
    basis: Option<&CameraBasis>,
    grounded: bool,
    dt: Real,
) -> TickOutput {
    let dt = dt.max(0.0);
    let mut next = *state;

    let desired = desired_direction(input.intent, basis);
    update_mode(&mut next, desired);
    let jumped = vertical::apply_jump(&mut next, config, input.jump_pressed, grounded);

    let speed_before = state.planar_speed();
    integrator::integrate_planar(&mut next, config, desired, basis, dt);
    vertical::apply_gravity(&mut next, config, grounded, dt);
    vertical::update_orientation(&mut next, config, speed_before, dt);

    TickOutput {
        state: next,
        displacement: next.velocity() * dt,
        desired_direction: desired,
        jumped,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveReport {
    /// Translation actually applied after collision resolution.
    pub translation: Vector<Real>,
    /// Whether the character rests on a walkable surface after the move.
    pub grounded: bool,
}

/// Host-side collision-aware displacement.
pub trait RigidMotionMover {
    fn move_by(&mut self, displacement: Vector<Real>, dt: Real) -> MoveReport;
}

impl<M: RigidMotionMover + ?Sized> RigidMotionMover for &mut M {
    fn move_by(&mut self, displacement: Vector<Real>, dt: Real) -> MoveReport {
        (**self).move_by(displacement, dt)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TickReport {
    pub output: TickOutput,
    pub movement: MoveReport,
}

pub struct LocomotionController<P: CameraBasisProvider> {
    config: LocomotionConfig,
    camera: P,
    state: MotionState,
    grounded: bool,
}

impl<P: CameraBasisProvider> LocomotionController<P> {
    pub fn new(config: LocomotionConfig, camera: P, forward: Vector<Real>) -> Self {
        Self {
            config,
            camera,
            state: MotionState::new(forward),
            grounded: false,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn camera(&self) -> &P {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut P {
        &mut self.camera
    }

    /// Planar speed, for animation and audio consumers.
    pub fn speed(&self) -> Real {
        self.state.planar_speed()
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Overrides the contact flag, e.g. after the host teleports the character.
    pub fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    pub fn step<M: RigidMotionMover>(
        &mut self,
        input: TickInput,
        mover: &mut M,
        dt: Real,
    ) -> TickReport {
        let basis = self.camera.camera_basis();
        let output = tick(
            &self.state,
            &self.config,
            input,
            basis.as_ref(),
            self.grounded,
            dt,
        );
        let movement = mover.move_by(output.displacement, dt);

        if logging::enabled(LogLevel::Debug) {
            if output.state.mode != self.state.mode {
                logging::debug(format!(
                    "locomotion: {:?} -> {:?} at speed {:.2}",
                    self.state.mode,
                    output.state.mode,
                    output.state.planar_speed()
                ));
            }
            if output.jumped {
                logging::debug(format!(
                    "locomotion: jump (vertical velocity {:.2})",
                    self.config.jump_force
                ));
            }
            if movement.grounded != self.grounded {
                logging::debug(format!("locomotion: grounded = {}", movement.grounded));
            }
        }

        self.state = output.state;
        self.grounded = movement.grounded;
        TickReport { output, movement }
    }
}
