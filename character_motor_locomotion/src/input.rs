//! Input sampling: raw directional signals to a unit (or zero) intent.

use rapier3d::prelude::Real;

const AXIS_EPSILON: Real = 1.0e-5;

/// Directional intent in controller space: `lateral` is +right, `forward` is +ahead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputIntent {
    pub lateral: Real,
    pub forward: Real,
}

impl InputIntent {
    pub const ZERO: Self = Self {
        lateral: 0.0,
        forward: 0.0,
    };

    pub fn magnitude(&self) -> Real {
        (self.lateral * self.lateral + self.forward * self.forward).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.lateral == 0.0 && self.forward == 0.0
    }
}

/// Digital direction keys held this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionKeys {
    pub fn axes(&self) -> [Real; 2] {
        let mut lateral = 0.0;
        let mut forward = 0.0;
        if self.forward {
            forward += 1.0;
        }
        if self.back {
            forward -= 1.0;
        }
        if self.left {
            lateral -= 1.0;
        }
        if self.right {
            lateral += 1.0;
        }
        [lateral, forward]
    }
}

/// Combines `[lateral, forward]` axes into an intent: zero when nothing is active,
/// unit length otherwise.
pub fn sample_axes(axes: [Real; 2]) -> InputIntent {
    let lateral = sanitize(axes[0]);
    let forward = sanitize(axes[1]);
    let len = (lateral * lateral + forward * forward).sqrt();
    if len <= AXIS_EPSILON {
        return InputIntent::ZERO;
    }
    InputIntent {
        lateral: lateral / len,
        forward: forward / len,
    }
}

pub fn sample_keys(keys: DirectionKeys) -> InputIntent {
    sample_axes(keys.axes())
}

fn sanitize(value: Real) -> Real {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
