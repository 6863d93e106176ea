use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Angle ranges for one leg, in degrees.
///
/// `hip_swing` bounds how far the thigh may turn away from its rest direction.
/// Knee bend is measured between thigh and shin: 0 is a straight leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointLimits {
    pub hip_swing: f32,
    pub knee_min: f32,
    pub knee_max: f32,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            hip_swing: 80.0,
            knee_min: 0.0,
            knee_max: 150.0,
        }
    }
}

impl JointLimits {
    pub fn new(hip_swing: f32, knee_min: f32, knee_max: f32) -> Self {
        Self {
            hip_swing,
            knee_min,
            knee_max,
        }
    }

    pub fn validate(&self, leg: usize) -> Result<(), ConfigError> {
        let malformed = |reason| Err(ConfigError::MalformedJointLimits { leg, reason });

        if !(self.hip_swing.is_finite() && self.knee_min.is_finite() && self.knee_max.is_finite())
        {
            return malformed("limits must be finite");
        }
        if !(0.0..=180.0).contains(&self.hip_swing) {
            return malformed("hip swing must be within 0..=180 degrees");
        }
        if self.knee_min < 0.0 || self.knee_max > 180.0 {
            return malformed("knee bend must be within 0..=180 degrees");
        }
        if self.knee_min > self.knee_max {
            return malformed("knee minimum exceeds knee maximum");
        }
        Ok(())
    }

    pub fn hip_swing_radians(&self) -> f32 {
        self.hip_swing.to_radians()
    }

    pub fn knee_range_radians(&self) -> (f32, f32) {
        (self.knee_min.to_radians(), self.knee_max.to_radians())
    }
}

/// Cone around a reference direction.
#[derive(Debug, Clone, Copy)]
pub struct SwingCone {
    pub max_angle: f32,
}

impl SwingCone {
    pub fn from_radians(max_angle: f32) -> Self {
        Self { max_angle }
    }

    pub fn apply(&self, direction: Vec3, reference: Vec3) -> Vec3 {
        let dir = direction.normalize_or_zero();
        let ref_dir = reference.normalize_or_zero();

        if dir.length_squared() < 0.0001 || ref_dir.length_squared() < 0.0001 {
            return ref_dir;
        }

        let angle = dir.angle_between(ref_dir);

        if angle <= self.max_angle {
            dir
        } else {
            let axis = ref_dir.cross(dir);
            let axis = if axis.length_squared() < 0.0001 {
                ref_dir.any_orthonormal_vector()
            } else {
                axis.normalize()
            };
            Quat::from_axis_angle(axis, self.max_angle) * ref_dir
        }
    }
}

/// Keeps the angle between `upper` and the returned direction within `[min, max]`.
///
/// `fallback_axis` is used when `desired` is parallel to `upper` or zero.
pub fn clamp_bend(upper: Vec3, desired: Vec3, fallback_axis: Vec3, min: f32, max: f32) -> Vec3 {
    let upper = upper.normalize_or_zero();
    let desired = desired.normalize_or_zero();

    if desired.length_squared() < 0.0001 {
        return Quat::from_axis_angle(perpendicular_axis(upper, fallback_axis), max) * upper;
    }

    let bend = upper.angle_between(desired);
    if (min..=max).contains(&bend) {
        return desired;
    }

    let axis = upper.cross(desired);
    let axis = if axis.length_squared() > 1e-8 {
        axis.normalize()
    } else {
        perpendicular_axis(upper, fallback_axis)
    };
    Quat::from_axis_angle(axis, bend.clamp(min, max)) * upper
}

fn perpendicular_axis(upper: Vec3, axis: Vec3) -> Vec3 {
    let projected = axis - upper * axis.dot(upper);
    if projected.length_squared() > 1e-8 {
        projected.normalize()
    } else {
        upper.any_orthonormal_vector()
    }
}
