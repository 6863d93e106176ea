use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::dynamics::{SecondOrderDynamics, SpringParams};

/// How far the body may sink to help feet reach lower ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub enabled: bool,
    /// Fraction of the lowest foot drop applied to the body.
    pub drop_multiplier: f32,
    pub max_drop: f32,
    /// Pitch and roll the body to the plane through the weighted feet.
    pub rotate_to_feet: bool,
    pub max_tilt_degrees: f32,
    pub spring: SpringParams,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            drop_multiplier: 1.0,
            max_drop: 0.3,
            rotate_to_feet: false,
            max_tilt_degrees: 15.0,
            spring: SpringParams::default(),
        }
    }
}

/// Feet lighter than this do not shape the body tilt.
const MIN_TILT_WEIGHT: f32 = 1e-4;
/// Keeps the slope fit solvable when all feet sit on one line.
const SLOPE_REGULARIZATION: f32 = 1e-4;

/// Lowers the whole pose along the up axis when feet are placed below their
/// animated height, and optionally tilts it to follow the feet.
#[derive(Debug, Clone)]
pub struct BodyAdjuster {
    config: BodyConfig,
    up: Vec3,
    /// Two horizontal axes perpendicular to `up`.
    basis: [Vec3; 2],
    spring: SecondOrderDynamics,
    tilt: [SecondOrderDynamics; 2],
}

impl BodyAdjuster {
    pub fn new(config: BodyConfig, up: Vec3) -> Self {
        let side = up.any_orthonormal_vector();
        Self {
            config,
            up,
            basis: [side, up.cross(side)],
            spring: SecondOrderDynamics::new(config.spring, 0.0),
            tilt: [
                SecondOrderDynamics::new(config.spring, 0.0),
                SecondOrderDynamics::new(config.spring, 0.0),
            ],
        }
    }

    /// Desired offset from `(target height - animated height, weight)` pairs.
    /// Never positive, never below `-max_drop`.
    pub fn desired_offset<I>(&self, drops: I) -> f32
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        if !self.config.enabled {
            return 0.0;
        }
        let lowest = drops
            .into_iter()
            .map(|(drop, weight)| drop * weight.clamp(0.0, 1.0))
            .filter(|d| d.is_finite())
            .fold(0.0_f32, f32::min);

        let max_drop = self.config.max_drop.max(0.0);
        (lowest * self.config.drop_multiplier.max(0.0)).clamp(-max_drop, 0.0)
    }

    /// Eases toward `desired` and returns the offset along up to apply this tick.
    pub fn update(&mut self, desired: f32, delta_time: f32) -> f32 {
        let max_drop = self.config.max_drop.max(0.0);
        self.spring.update(desired, delta_time).clamp(-max_drop, 0.0)
    }

    pub fn offset_vector(&self, offset: f32) -> Vec3 {
        self.up * offset
    }

    pub fn current(&self) -> f32 {
        self.spring.current()
    }

    /// Ground slope under the feet from `(target position, weight)` pairs,
    /// fitted by weighted least squares and expressed as rise per unit along
    /// the two horizontal axes. Zero when tilting is off or fewer than two
    /// feet carry weight.
    pub fn desired_slope<I>(&self, feet: I) -> Vec2
    where
        I: IntoIterator<Item = (Vec3, f32)>,
    {
        if !self.config.enabled || !self.config.rotate_to_feet {
            return Vec2::ZERO;
        }
        let samples: SmallVec<[(Vec2, f32, f32); 8]> = feet
            .into_iter()
            .filter(|(p, w)| *w > MIN_TILT_WEIGHT && p.is_finite())
            .map(|(p, w)| {
                let flat = Vec2::new(p.dot(self.basis[0]), p.dot(self.basis[1]));
                (flat, p.dot(self.up), w.min(1.0))
            })
            .collect();
        if samples.len() < 2 {
            return Vec2::ZERO;
        }

        let total: f32 = samples.iter().map(|s| s.2).sum();
        let mean_flat = samples.iter().map(|s| s.0 * s.2).sum::<Vec2>() / total;
        let mean_height = samples.iter().map(|s| s.1 * s.2).sum::<f32>() / total;

        let (mut cxx, mut cxy, mut cyy, mut rise) = (0.0, 0.0, 0.0, Vec2::ZERO);
        for (flat, height, weight) in &samples {
            let d = *flat - mean_flat;
            cxx += weight * d.x * d.x;
            cxy += weight * d.x * d.y;
            cyy += weight * d.y * d.y;
            rise += d * (weight * (height - mean_height));
        }

        let (a, d) = (cxx + SLOPE_REGULARIZATION, cyy + SLOPE_REGULARIZATION);
        let det = a * d - cxy * cxy;
        if det <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let slope = Vec2::new(
            (d * rise.x - cxy * rise.y) / det,
            (a * rise.y - cxy * rise.x) / det,
        );

        let max_slope = self.config.max_tilt_degrees.clamp(0.0, 89.0).to_radians().tan();
        slope.clamp_length_max(max_slope)
    }

    /// Eases toward `slope` and returns the body rotation for this tick.
    pub fn update_tilt(&mut self, slope: Vec2, delta_time: f32) -> Quat {
        let smoothed = Vec2::new(
            self.tilt[0].update(slope.x, delta_time),
            self.tilt[1].update(slope.y, delta_time),
        );
        self.tilt_rotation(smoothed)
    }

    /// Rotation taking `up` onto the normal of a plane with the given slope.
    pub fn tilt_rotation(&self, slope: Vec2) -> Quat {
        let normal = self.up - self.basis[0] * slope.x - self.basis[1] * slope.y;
        match normal.try_normalize() {
            Some(normal) if slope != Vec2::ZERO => Quat::from_rotation_arc(self.up, normal),
            _ => Quat::IDENTITY,
        }
    }

    pub fn reset(&mut self) {
        self.spring.reset(0.0);
        for tilt in &mut self.tilt {
            tilt.reset(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lowers_never_raises() {
        let body = BodyAdjuster::new(BodyConfig::default(), Vec3::Y);
        assert_eq!(body.desired_offset([(0.2, 1.0), (0.1, 1.0)]), 0.0);
        assert!((body.desired_offset([(0.2, 1.0), (-0.1, 1.0)]) + 0.1).abs() < 1e-6);
    }

    #[test]
    fn drop_is_weighted_and_capped() {
        let body = BodyAdjuster::new(
            BodyConfig {
                max_drop: 0.15,
                ..BodyConfig::default()
            },
            Vec3::Y,
        );
        assert!((body.desired_offset([(-0.1, 0.5)]) + 0.05).abs() < 1e-6);
        assert_eq!(body.desired_offset([(-1.0, 1.0)]), -0.15);
    }

    #[test]
    fn disabled_body_stays_put() {
        let body = BodyAdjuster::new(
            BodyConfig {
                enabled: false,
                ..BodyConfig::default()
            },
            Vec3::Y,
        );
        assert_eq!(body.desired_offset([(-0.2, 1.0)]), 0.0);
    }

    #[test]
    fn update_converges_within_bounds() {
        let mut body = BodyAdjuster::new(BodyConfig::default(), Vec3::Y);
        let mut offset = 0.0;
        for _ in 0..300 {
            offset = body.update(-0.1, 1.0 / 60.0);
            assert!((-0.3..=0.0).contains(&offset));
        }
        assert!((offset + 0.1).abs() < 1e-3);
    }

    fn tilting() -> BodyAdjuster {
        BodyAdjuster::new(
            BodyConfig {
                rotate_to_feet: true,
                ..BodyConfig::default()
            },
            Vec3::Y,
        )
    }

    #[test]
    fn slope_follows_feet_plane() {
        let body = tilting();
        let feet = [(-0.2, -0.3), (0.2, -0.3), (-0.2, 0.3), (0.2, 0.3)]
            .map(|(x, z)| (Vec3::new(x, 0.1 * x, z), 1.0));

        let rotation = body.tilt_rotation(body.desired_slope(feet));
        let expected = Vec3::new(-0.1, 1.0, 0.0).normalize();
        assert!((rotation * Vec3::Y - expected).length() < 1e-3);
    }

    #[test]
    fn tilt_is_capped() {
        let body = tilting();
        let feet = [(-0.2, 0.0), (0.2, 0.0)].map(|(x, z)| (Vec3::new(x, x, z), 1.0));

        let rotation = body.tilt_rotation(body.desired_slope(feet));
        let angle = (rotation * Vec3::Y).angle_between(Vec3::Y).to_degrees();
        assert!((angle - 15.0).abs() < 0.1, "tilt {angle}");
    }

    #[test]
    fn swinging_feet_do_not_tilt() {
        let body = tilting();
        let feet = [(Vec3::new(-0.2, 0.0, 0.0), 1.0), (Vec3::new(0.2, 0.3, 0.0), 0.0)];
        assert_eq!(body.desired_slope(feet), Vec2::ZERO);

        let flat = BodyAdjuster::new(BodyConfig::default(), Vec3::Y);
        let feet = [(Vec3::new(-0.2, 0.0, 0.0), 1.0), (Vec3::new(0.2, 0.1, 0.0), 1.0)];
        assert_eq!(flat.desired_slope(feet), Vec2::ZERO);
    }
}
