//! Planar velocity integration: acceleration, steering, coasting and the speed clamp.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::camera::{CameraBasis, INTENT_THRESHOLD};
use crate::config::LocomotionConfig;
use crate::math::{move_towards, normalize_or_zero, slerp_vector};
use crate::state::{MotionState, MovementMode};

/// Below this speed the heading snaps instead of steering.
pub const STEERING_MIN_SPEED: Real = 0.5;
/// Above this speed velocity is re-aligned toward the heading.
pub const REALIGN_MIN_SPEED: Real = 0.1;
/// Coasting below this speed stops dead.
pub const STOP_SPEED: Real = 0.02;

/// Advances `state.planar_velocity` and `state.move_heading` by one tick.
///
/// `current_speed` is sampled once on entry; every branch below compares against
/// that value, not the partially updated velocity.
pub fn integrate_planar(
    state: &mut MotionState,
    config: &LocomotionConfig,
    desired: Vector<Real>,
    basis: Option<&CameraBasis>,
    dt: Real,
) {
    let current_speed = state.planar_speed();
    match state.mode {
        MovementMode::Moving => {
            steer_and_accelerate(state, config, desired, basis, current_speed, dt)
        }
        MovementMode::Coasting => coast(state, config, current_speed, dt),
    }
    clamp_speed(state, config.top_speed);
}

fn steer_and_accelerate(
    state: &mut MotionState,
    config: &LocomotionConfig,
    desired: Vector<Real>,
    basis: Option<&CameraBasis>,
    current_speed: Real,
    dt: Real,
) {
    // Committed but idle: keep drifting along the camera heading.
    let target = if desired.norm() > INTENT_THRESHOLD {
        desired
    } else {
        basis.copied().unwrap_or_else(CameraBasis::world).forward()
    };

    state.move_heading = if current_speed > STEERING_MIN_SPEED {
        slerp_vector(state.move_heading, target, config.steering_speed * dt)
    } else {
        target
    };

    let mut velocity = state.planar_velocity;
    if current_speed < config.top_speed {
        velocity += state.move_heading * (config.acceleration_rate * dt);
    }
    if current_speed > REALIGN_MIN_SPEED {
        let aligned = state.move_heading * current_speed;
        velocity = slerp_vector(velocity, aligned, config.turn_speed * dt);
    }
    state.planar_velocity = velocity;
}

fn coast(state: &mut MotionState, config: &LocomotionConfig, current_speed: Real, dt: Real) {
    if current_speed <= STOP_SPEED {
        state.planar_velocity = Vector::zeros();
        return;
    }
    let max_delta = (config.deceleration_rate * dt).max(0.0);
    let velocity = move_towards(state.planar_velocity, Vector::zeros(), max_delta);
    if velocity.norm() > REALIGN_MIN_SPEED {
        state.move_heading = normalize_or_zero(velocity);
    }
    state.planar_velocity = velocity;
}

fn clamp_speed(state: &mut MotionState, top_speed: Real) {
    let speed = state.planar_speed();
    if speed > top_speed {
        state.planar_velocity = if speed > 0.0 {
            state.planar_velocity * (top_speed / speed)
        } else {
            Vector::zeros()
        };
    }
}
