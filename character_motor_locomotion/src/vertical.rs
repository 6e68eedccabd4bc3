//! Vertical motion (jump, gravity, ground snap) and facing orientation.

use rapier3d::prelude::Real;

use crate::config::LocomotionConfig;
use crate::integrator::STEERING_MIN_SPEED;
use crate::math::{look_rotation, slerp_rotation};
use crate::state::MotionState;

/// Returns true when the jump impulse was applied.
pub fn apply_jump(
    state: &mut MotionState,
    config: &LocomotionConfig,
    jump_pressed: bool,
    grounded: bool,
) -> bool {
    if jump_pressed && grounded {
        state.vertical_velocity = config.jump_force;
        return true;
    }
    false
}

pub fn apply_gravity(state: &mut MotionState, config: &LocomotionConfig, grounded: bool, dt: Real) {
    if grounded && state.vertical_velocity <= 0.0 {
        state.vertical_velocity = config.grounded_gravity;
    } else {
        state.vertical_velocity -= config.gravity * dt;
    }
}

/// Turns the facing toward the movement heading when `speed` is above the
/// steering threshold; otherwise the facing is left alone.
pub fn update_orientation(state: &mut MotionState, config: &LocomotionConfig, speed: Real, dt: Real) {
    if speed <= STEERING_MIN_SPEED {
        return;
    }
    if let Some(target) = look_rotation(state.move_heading) {
        state.orientation = slerp_rotation(state.orientation, target, config.turn_speed * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::math::Vector;

    #[test]
    fn jump_requires_ground_contact() {
        let config = LocomotionConfig::default();
        let mut state = MotionState::default();
        state.vertical_velocity = -3.0;
        assert!(!apply_jump(&mut state, &config, true, false));
        assert_eq!(state.vertical_velocity, -3.0);

        assert!(apply_jump(&mut state, &config, true, true));
        assert_eq!(state.vertical_velocity, config.jump_force);
    }

    #[test]
    fn grounded_gravity_replaces_fall_speed() {
        let config = LocomotionConfig::default();
        let mut state = MotionState::default();
        state.vertical_velocity = -250.0;
        apply_gravity(&mut state, &config, true, 0.016);
        assert_eq!(state.vertical_velocity, config.grounded_gravity);
    }

    #[test]
    fn rising_character_keeps_gravity_while_touching_ground() {
        let config = LocomotionConfig::default();
        let mut state = MotionState::default();
        state.vertical_velocity = config.jump_force;
        apply_gravity(&mut state, &config, true, 0.1);
        assert!((state.vertical_velocity - (config.jump_force - config.gravity * 0.1)).abs() < 1.0e-5);
    }

    #[test]
    fn airborne_fall_speed_accumulates() {
        let config = LocomotionConfig::default();
        let mut state = MotionState::default();
        for _ in 0..10 {
            apply_gravity(&mut state, &config, false, 0.1);
        }
        assert!((state.vertical_velocity + config.gravity).abs() < 1.0e-3);
    }

    #[test]
    fn orientation_turns_only_at_speed() {
        let config = LocomotionConfig::default();
        let mut state = MotionState::new(Vector::z());
        state.move_heading = Vector::x();
        let before = state.orientation;
        update_orientation(&mut state, &config, 0.4, 0.1);
        assert_eq!(state.orientation, before);

        update_orientation(&mut state, &config, 5.0, 0.1);
        let facing = state.orientation * Vector::z();
        assert!(facing.x > 0.0 && facing.z > 0.0);

        update_orientation(&mut state, &config, 5.0, 1.0);
        let facing = state.orientation * Vector::z();
        assert!((facing - Vector::x()).norm() < 1.0e-4);
    }
}
