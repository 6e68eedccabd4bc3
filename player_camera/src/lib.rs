//! Third-person orbit camera; supplies the locomotion camera basis.
//!
//! Yaw 0 looks down -Z and positive yaw turns toward +X, so screen-right is
//! always `view_forward × up`.
#![forbid(unsafe_code)]

use character_motor_locomotion::{CameraBasis, CameraBasisProvider};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug)]
pub struct OrbitSettings {
    /// Starting distance behind the target in meters.
    pub distance: Real,
    pub min_distance: Real,
    pub max_distance: Real,
    /// Meters per unit of scroll.
    pub zoom_step: Real,
    /// Height of the pivot above the target origin.
    pub height: Real,
    /// Radians per unit of look delta.
    pub sensitivity: Real,
    pub min_pitch: Real,
    pub max_pitch: Real,
    /// Exponential follow rate for the eye; `<= 0` snaps every update.
    pub follow_speed: Real,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            distance: 5.0,
            min_distance: 0.5,
            max_distance: 15.0,
            zoom_step: 0.05,
            height: 2.0,
            sensitivity: 2.0_f32.to_radians(),
            min_pitch: (-20.0_f32).to_radians(),
            max_pitch: 60.0_f32.to_radians(),
            follow_speed: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub eye: Vector<Real>,
    pub pivot: Vector<Real>,
    pub yaw: Real,
    pub pitch: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerCamera {
    settings: OrbitSettings,
    yaw: Real,
    /// Positive pitch looks down at the target.
    pitch: Real,
    distance: Real,
    pivot: Vector<Real>,
    eye: Vector<Real>,
}

impl PlayerCamera {
    pub fn new(settings: OrbitSettings) -> Self {
        let mut camera = Self {
            settings,
            yaw: 0.0,
            pitch: 0.0,
            distance: settings
                .distance
                .clamp(settings.min_distance, settings.max_distance.max(settings.min_distance)),
            pivot: Vector::zeros(),
            eye: Vector::zeros(),
        };
        camera.snap_to_target(Vector::zeros());
        camera
    }

    pub fn settings(&self) -> OrbitSettings {
        self.settings
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    pub fn pitch(&self) -> Real {
        self.pitch
    }

    pub fn distance(&self) -> Real {
        self.distance
    }

    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = self.clamp_pitch(pitch);
    }

    pub fn apply_look_delta(&mut self, delta: [Real; 2]) {
        self.yaw += delta[0] * self.settings.sensitivity;
        self.pitch = self.clamp_pitch(self.pitch - delta[1] * self.settings.sensitivity);
    }

    /// Positive scroll pulls the eye in.
    pub fn zoom(&mut self, scroll: Real) {
        if scroll == 0.0 || !scroll.is_finite() {
            return;
        }
        let max = self.settings.max_distance.max(self.settings.min_distance);
        self.distance =
            (self.distance - scroll * self.settings.zoom_step).clamp(self.settings.min_distance, max);
    }

    /// Full view direction including pitch.
    pub fn view_forward(&self) -> Vector<Real> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector::new(sin_yaw * cos_pitch, -sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn view_right(&self) -> Vector<Real> {
        self.view_forward().cross(&Vector::y())
    }

    /// Eases the eye toward its orbit slot behind `target`.
    pub fn update_from_target(&mut self, target: Vector<Real>, dt: Real) -> CameraPose {
        let desired = self.orbit_eye(target);
        let follow = self.settings.follow_speed;
        if follow > 0.0 && dt.is_finite() {
            let blend = 1.0 - (-follow * dt.max(0.0)).exp();
            self.eye += (desired - self.eye) * blend;
        } else {
            self.eye = desired;
        }
        self.pose()
    }

    /// Places the eye in its orbit slot immediately, e.g. after a teleport.
    pub fn snap_to_target(&mut self, target: Vector<Real>) -> CameraPose {
        self.eye = self.orbit_eye(target);
        self.pose()
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye,
            pivot: self.pivot,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    fn orbit_eye(&mut self, target: Vector<Real>) -> Vector<Real> {
        self.pivot = target + Vector::new(0.0, self.settings.height, 0.0);
        self.pivot - self.view_forward() * self.distance
    }

    fn clamp_pitch(&self, pitch: Real) -> Real {
        pitch.clamp(self.settings.min_pitch, self.settings.max_pitch)
    }
}

impl CameraBasisProvider for PlayerCamera {
    fn camera_basis(&self) -> Option<CameraBasis> {
        CameraBasis::from_axes(self.view_forward(), self.view_right())
    }
}
