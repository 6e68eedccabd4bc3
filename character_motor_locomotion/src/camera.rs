//! Camera basis contract and the camera-relative intent mapper.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::input::InputIntent;
use crate::math::{normalize_or_zero, planar};

/// Intent magnitudes below this read as "no input".
pub const INTENT_THRESHOLD: Real = 0.1;

/// Horizontal forward/right axes of the viewing camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    forward: Vector<Real>,
    right: Vector<Real>,
}

impl CameraBasis {
    /// Fallback used when no camera is available: intent is already world space,
    /// lateral along +X and forward along +Z.
    pub fn world() -> Self {
        Self {
            forward: Vector::z(),
            right: Vector::x(),
        }
    }

    /// Strips the vertical component from a camera's forward/right axes and
    /// re-normalizes them. Returns `None` when either axis has no horizontal extent.
    pub fn from_axes(forward: Vector<Real>, right: Vector<Real>) -> Option<Self> {
        let forward = normalize_or_zero(planar(forward));
        let right = normalize_or_zero(planar(right));
        if forward.norm_squared() <= 0.0 || right.norm_squared() <= 0.0 {
            return None;
        }
        Some(Self { forward, right })
    }

    /// Basis for a camera yawed `yaw` radians, where yaw 0 looks along -Z and
    /// positive yaw turns toward +X. `right` is `forward × up`.
    pub fn from_yaw(yaw: Real) -> Self {
        let (sin, cos) = yaw.sin_cos();
        Self {
            forward: Vector::new(sin, 0.0, -cos),
            right: Vector::new(cos, 0.0, sin),
        }
    }

    pub fn forward(&self) -> Vector<Real> {
        self.forward
    }

    pub fn right(&self) -> Vector<Real> {
        self.right
    }
}

/// Supplies the camera basis each tick. Absence is a valid answer.
pub trait CameraBasisProvider {
    fn camera_basis(&self) -> Option<CameraBasis>;
}

impl CameraBasisProvider for CameraBasis {
    fn camera_basis(&self) -> Option<CameraBasis> {
        Some(*self)
    }
}

impl CameraBasisProvider for Option<CameraBasis> {
    fn camera_basis(&self) -> Option<CameraBasis> {
        *self
    }
}

impl<P: CameraBasisProvider + ?Sized> CameraBasisProvider for &P {
    fn camera_basis(&self) -> Option<CameraBasis> {
        (**self).camera_basis()
    }
}

/// World-space desired direction for `intent`, or zero when the intent is below
/// [`INTENT_THRESHOLD`].
pub fn desired_direction(intent: InputIntent, basis: Option<&CameraBasis>) -> Vector<Real> {
    if intent.magnitude() < INTENT_THRESHOLD {
        return Vector::zeros();
    }
    let basis = basis.copied().unwrap_or_else(CameraBasis::world);
    normalize_or_zero(basis.forward * intent.forward + basis.right * intent.lateral)
}
