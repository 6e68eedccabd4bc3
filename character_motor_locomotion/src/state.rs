//! Persistent motion record and the moving/coasting state machine.

use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::Real;

use crate::camera::INTENT_THRESHOLD;
use crate::math::{look_rotation, normalize_or_zero, planar};

/// Intent opposing the committed heading by more than ~120 degrees is a reversal.
pub const REVERSAL_DOT: Real = -0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementMode {
    /// Committed to a heading; accelerates and steers toward it.
    #[default]
    Moving,
    /// Bleeding off speed after a reversal.
    Coasting,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    pub planar_velocity: Vector<Real>,
    pub vertical_velocity: Real,
    /// Movement heading; tracks the travel direction smoothly.
    pub move_heading: Vector<Real>,
    /// Facing rotation of the avatar.
    pub orientation: Rotation<Real>,
    pub mode: MovementMode,
    pub last_committed_direction: Vector<Real>,
}

impl MotionState {
    /// Starts at rest, `Moving`, committed to `forward` (flattened onto the
    /// horizontal plane).
    pub fn new(forward: Vector<Real>) -> Self {
        let heading = normalize_or_zero(planar(forward));
        Self {
            planar_velocity: Vector::zeros(),
            vertical_velocity: 0.0,
            move_heading: heading,
            orientation: look_rotation(heading).unwrap_or_else(Rotation::identity),
            mode: MovementMode::Moving,
            last_committed_direction: heading,
        }
    }

    pub fn is_actively_moving(&self) -> bool {
        self.mode == MovementMode::Moving
    }

    pub fn planar_speed(&self) -> Real {
        self.planar_velocity.norm()
    }

    pub fn velocity(&self) -> Vector<Real> {
        Vector::new(
            self.planar_velocity.x,
            self.vertical_velocity,
            self.planar_velocity.z,
        )
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(Vector::z())
    }
}

fn is_reversal(desired: Vector<Real>, committed: Vector<Real>) -> bool {
    if desired.norm() < INTENT_THRESHOLD || committed.norm() < INTENT_THRESHOLD {
        return false;
    }
    let dot = normalize_or_zero(desired).dot(&normalize_or_zero(committed));
    dot < REVERSAL_DOT
}

/// Applies one tick of the movement-state machine. Zero `desired` leaves the
/// state untouched; releasing input alone never forces `Coasting`.
pub fn update_mode(state: &mut MotionState, desired: Vector<Real>) {
    if desired.norm() < INTENT_THRESHOLD {
        return;
    }
    if state.mode == MovementMode::Moving && is_reversal(desired, state.last_committed_direction) {
        state.mode = MovementMode::Coasting;
    } else {
        state.mode = MovementMode::Moving;
        state.last_committed_direction = desired;
    }
}
