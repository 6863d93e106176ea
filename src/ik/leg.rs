use glam::Vec3;

use super::constraint::JointLimits;
use crate::error::ConfigError;
use crate::pose::Pose;

const MIN_BONE_LENGTH: f32 = 0.0001;

/// Hip, knee and ankle of one leg with lengths and rest directions taken from
/// the rest pose.
#[derive(Debug, Clone)]
pub struct LegChain {
    pub(crate) leg: usize,
    pub(crate) hip: usize,
    pub(crate) knee: usize,
    pub(crate) ankle: usize,
    pub(crate) upper_length: f32,
    pub(crate) lower_length: f32,
    pub(crate) rest_upper_dir: Vec3,
    pub(crate) rest_lower_dir: Vec3,
    pub(crate) pole: Vec3,
    pub(crate) limits: JointLimits,
}

impl LegChain {
    pub fn builder(hip: usize, knee: usize, ankle: usize) -> LegChainBuilder {
        LegChainBuilder::new(hip, knee, ankle)
    }

    pub fn leg(&self) -> usize {
        self.leg
    }

    pub fn hip(&self) -> usize {
        self.hip
    }

    pub fn knee(&self) -> usize {
        self.knee
    }

    pub fn ankle(&self) -> usize {
        self.ankle
    }

    pub fn upper_length(&self) -> f32 {
        self.upper_length
    }

    pub fn lower_length(&self) -> f32 {
        self.lower_length
    }

    pub fn total_length(&self) -> f32 {
        self.upper_length + self.lower_length
    }

    pub fn rest_upper_dir(&self) -> Vec3 {
        self.rest_upper_dir
    }

    pub fn pole(&self) -> Vec3 {
        self.pole
    }

    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Closest and farthest hip-to-ankle distances allowed by the knee range.
    pub fn reach(&self) -> (f32, f32) {
        let (knee_min, knee_max) = self.limits.knee_range_radians();
        let (u, l) = (self.upper_length, self.lower_length);
        let span = |bend: f32| (u * u + l * l + 2.0 * u * l * bend.cos()).max(0.0).sqrt();
        (span(knee_max), span(knee_min))
    }
}

pub struct LegChainBuilder {
    hip: usize,
    knee: usize,
    ankle: usize,
    pole: Vec3,
    limits: JointLimits,
}

impl LegChainBuilder {
    pub fn new(hip: usize, knee: usize, ankle: usize) -> Self {
        Self {
            hip,
            knee,
            ankle,
            pole: Vec3::Z,
            limits: JointLimits::default(),
        }
    }

    /// Direction the knee should point towards, in model space.
    pub fn pole(mut self, pole: Vec3) -> Self {
        self.pole = pole;
        self
    }

    pub fn limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates the chain against `rest_pose`; errors are scoped to `leg`.
    pub fn build(self, leg: usize, rest_pose: &Pose) -> Result<LegChain, ConfigError> {
        let bone_count = rest_pose.len();
        let position = |bone: usize| {
            rest_pose
                .bone(bone)
                .map(|t| t.position)
                .ok_or(ConfigError::BoneOutOfRange {
                    leg,
                    bone,
                    bone_count,
                })
        };

        let hip = position(self.hip)?;
        let knee = position(self.knee)?;
        let ankle = position(self.ankle)?;

        if self.hip == self.knee || self.knee == self.ankle || self.hip == self.ankle {
            return Err(ConfigError::DegenerateChain { leg });
        }

        let upper = knee - hip;
        let lower = ankle - knee;
        if upper.length() < MIN_BONE_LENGTH || lower.length() < MIN_BONE_LENGTH {
            return Err(ConfigError::DegenerateChain { leg });
        }

        self.limits.validate(leg)?;

        Ok(LegChain {
            leg,
            hip: self.hip,
            knee: self.knee,
            ankle: self.ankle,
            upper_length: upper.length(),
            lower_length: lower.length(),
            rest_upper_dir: upper.normalize(),
            rest_lower_dir: lower.normalize(),
            pole: self.pole.normalize_or_zero(),
            limits: self.limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    fn leg_pose() -> Pose {
        Pose::new(vec![
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
            Transform::from_position(Vec3::new(0.0, 0.1, 0.0)),
        ])
    }

    #[test]
    fn lengths_come_from_rest_pose() {
        let chain = LegChain::builder(0, 1, 2).build(0, &leg_pose()).unwrap();
        assert!((chain.upper_length() - 0.5).abs() < 1e-6);
        assert!((chain.lower_length() - 0.4).abs() < 1e-6);
        assert!((chain.rest_upper_dir() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn reach_follows_knee_range() {
        let chain = LegChain::builder(0, 1, 2)
            .limits(JointLimits::new(90.0, 0.0, 180.0))
            .build(0, &leg_pose())
            .unwrap();
        let (min, max) = chain.reach();
        assert!((min - 0.1).abs() < 1e-4);
        assert!((max - 0.9).abs() < 1e-4);
    }

    #[test]
    fn bad_bones_are_reported() {
        let pose = leg_pose();
        assert!(matches!(
            LegChain::builder(0, 1, 7).build(2, &pose),
            Err(ConfigError::BoneOutOfRange { leg: 2, bone: 7, .. })
        ));
        assert!(matches!(
            LegChain::builder(0, 1, 1).build(1, &pose),
            Err(ConfigError::DegenerateChain { leg: 1 })
        ));
        assert!(matches!(
            LegChain::builder(0, 1, 2)
                .limits(JointLimits::new(45.0, 90.0, 30.0))
                .build(0, &pose),
            Err(ConfigError::MalformedJointLimits { .. })
        ));
    }
}
