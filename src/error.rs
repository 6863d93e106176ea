//! Error types
//!
//! Configuration problems are real errors ([`ConfigError`]); everything that
//! can go wrong during a tick is recovered and reported as a [`Degradation`].

use thiserror::Error;

use crate::gait::LegPhase;

/// Invalid configuration, detected when an instance is created.
///
/// Leg-scoped variants disable only the offending leg. The others prevent the
/// instance from being created at all.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("probe max distance must be positive, got {0}")]
    NonPositiveProbeDistance(f32),

    #[error("leg {leg}: {phase:?} duration must be positive, got {value}")]
    NonPositivePhaseDuration {
        leg: usize,
        phase: LegPhase,
        value: f32,
    },

    #[error("leg {leg}: malformed joint limits: {reason}")]
    MalformedJointLimits { leg: usize, reason: &'static str },

    #[error("leg {leg}: bone index {bone} out of range for a pose with {bone_count} bones")]
    BoneOutOfRange {
        leg: usize,
        bone: usize,
        bone_count: usize,
    },

    #[error("leg {leg}: hip, knee and ankle must be distinct bones with non-zero length")]
    DegenerateChain { leg: usize },

    #[error("failed to parse walk configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// The leg this error disables, if it is leg-scoped.
    pub fn leg(&self) -> Option<usize> {
        match *self {
            ConfigError::NonPositivePhaseDuration { leg, .. }
            | ConfigError::MalformedJointLimits { leg, .. }
            | ConfigError::BoneOutOfRange { leg, .. }
            | ConfigError::DegenerateChain { leg } => Some(leg),
            ConfigError::NonPositiveProbeDistance(_) | ConfigError::Parse(_) => None,
        }
    }
}

/// A recovered failure during a tick. The visual result degrades, the tick completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Degradation {
    /// No terrain under the foot; the rest pose was used instead.
    ProbeMiss { leg: usize },
    /// The IK target was out of reach and got clamped; `shortfall` is the
    /// remaining distance between ankle and target.
    UnreachableTarget { leg: usize, shortfall: f32 },
}

impl Degradation {
    pub fn leg(&self) -> usize {
        match *self {
            Degradation::ProbeMiss { leg } | Degradation::UnreachableTarget { leg, .. } => leg,
        }
    }
}
