use rapier3d::math::{Rotation, Vector};
use rapier3d::na::Unit;
use rapier3d::prelude::Real;

const DEGENERATE_EPSILON: Real = 1.0e-5;

pub fn normalize_or_zero(v: Vector<Real>) -> Vector<Real> {
    let len = v.norm();
    if len > DEGENERATE_EPSILON {
        v / len
    } else {
        Vector::zeros()
    }
}

pub fn planar(v: Vector<Real>) -> Vector<Real> {
    Vector::new(v.x, 0.0, v.z)
}

/// Moves `current` toward `target` by at most `max_delta`, landing exactly on it
/// instead of overshooting.
pub fn move_towards(current: Vector<Real>, target: Vector<Real>, max_delta: Real) -> Vector<Real> {
    let delta = target - current;
    let dist = delta.norm();
    if dist <= max_delta || dist <= 0.0 {
        return target;
    }
    current + delta / dist * max_delta
}

/// Spherical interpolation between two vectors treated as directions: the direction
/// rotates along the shortest arc while the magnitude is interpolated linearly.
/// `t` is clamped to [0, 1].
pub fn slerp_vector(from: Vector<Real>, to: Vector<Real>, t: Real) -> Vector<Real> {
    let t = t.clamp(0.0, 1.0);
    let from_len = from.norm();
    let to_len = to.norm();
    if from_len <= DEGENERATE_EPSILON || to_len <= DEGENERATE_EPSILON {
        return from + (to - from) * t;
    }
    let from_dir = from / from_len;
    let to_dir = to / to_len;
    let dot = from_dir.dot(&to_dir).clamp(-1.0, 1.0);
    let len = from_len + (to_len - from_len) * t;
    let cross = from_dir.cross(&to_dir);
    if dot > 0.0 && cross.norm() <= DEGENERATE_EPSILON {
        return normalize_or_zero(from_dir + (to_dir - from_dir) * t) * len;
    }
    let Some(axis) = rotation_axis(from_dir, cross) else {
        return from + (to - from) * t;
    };
    let rotation = Rotation::from_axis_angle(&axis, dot.acos() * t);
    rotation * from_dir * len
}

fn rotation_axis(from: Vector<Real>, cross: Vector<Real>) -> Option<Unit<Vector<Real>>> {
    if let Some(axis) = Unit::try_new(cross, DEGENERATE_EPSILON) {
        return Some(axis);
    }
    // Antiparallel: any perpendicular works, prefer turning about world up.
    [Vector::y(), Vector::x(), Vector::z()]
        .into_iter()
        .find_map(|candidate| {
            let perpendicular = candidate - from * candidate.dot(&from);
            Unit::try_new(perpendicular, DEGENERATE_EPSILON)
        })
}

/// Rotation whose local +Z looks along `direction` with +Y kept up. Returns `None`
/// for a zero direction.
pub fn look_rotation(direction: Vector<Real>) -> Option<Rotation<Real>> {
    let direction = normalize_or_zero(direction);
    if direction.norm_squared() <= 0.0 {
        return None;
    }
    let up = if direction.cross(&Vector::y()).norm_squared() <= DEGENERATE_EPSILON {
        Vector::z()
    } else {
        Vector::y()
    };
    Some(Rotation::face_towards(&direction, &up))
}

pub fn slerp_rotation(from: Rotation<Real>, to: Rotation<Real>, t: Real) -> Rotation<Real> {
    let t = t.clamp(0.0, 1.0);
    from.try_slerp(&to, t, 1.0e-6).unwrap_or(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector<Real>, b: Vector<Real>) -> bool {
        (a - b).norm() < 1.0e-4
    }

    #[test]
    fn slerp_keeps_unit_length_for_unit_inputs() {
        let a = Vector::new(1.0, 0.0, 0.0);
        let b = Vector::new(0.0, 0.0, 1.0);
        let mid = slerp_vector(a, b, 0.5);
        assert!((mid.norm() - 1.0).abs() < 1.0e-4);
        let expected = Vector::new(1.0, 0.0, 1.0).normalize();
        assert!(approx(mid, expected));
    }

    #[test]
    fn slerp_interpolates_magnitude_linearly() {
        let a = Vector::new(0.0, 0.0, 2.0);
        let b = Vector::new(0.0, 0.0, 4.0);
        assert!(approx(slerp_vector(a, b, 0.25), Vector::new(0.0, 0.0, 2.5)));
    }

    #[test]
    fn slerp_clamps_blend_factor() {
        let a = Vector::new(1.0, 0.0, 0.0);
        let b = Vector::new(0.0, 0.0, 3.0);
        assert!(approx(slerp_vector(a, b, 4.0), b));
        assert!(approx(slerp_vector(a, b, -1.0), a));
    }

    #[test]
    fn slerp_turns_antiparallel_vectors_in_the_horizontal_plane() {
        let a = Vector::new(0.0, 0.0, 1.0);
        let b = Vector::new(0.0, 0.0, -1.0);
        let mid = slerp_vector(a, b, 0.5);
        assert!(mid.y.abs() < 1.0e-4);
        assert!((mid.norm() - 1.0).abs() < 1.0e-4);
        assert!(mid.z.abs() < 1.0e-4);
    }

    #[test]
    fn move_towards_never_overshoots() {
        let v = Vector::new(3.0, 0.0, 4.0);
        assert!(approx(move_towards(v, Vector::zeros(), 1.0), Vector::new(2.4, 0.0, 3.2)));
        assert_eq!(move_towards(v, Vector::zeros(), 10.0), Vector::zeros());
    }

    #[test]
    fn look_rotation_maps_forward_axis() {
        let dir = Vector::new(1.0, 0.0, 0.0);
        let rotation = look_rotation(dir).expect("rotation");
        assert!(approx(rotation * Vector::z(), dir));
        assert!(look_rotation(Vector::zeros()).is_none());
    }
}
