use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Phase of a single leg within the gait cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LegPhase {
    #[default]
    Planted,
    Lifting,
    Swinging,
    Placing,
}

impl LegPhase {
    pub const CYCLE: [LegPhase; 4] = [
        LegPhase::Planted,
        LegPhase::Lifting,
        LegPhase::Swinging,
        LegPhase::Placing,
    ];

    pub fn next(self) -> Self {
        match self {
            LegPhase::Planted => LegPhase::Lifting,
            LegPhase::Lifting => LegPhase::Swinging,
            LegPhase::Swinging => LegPhase::Placing,
            LegPhase::Placing => LegPhase::Planted,
        }
    }

    /// Whether a leg in this phase may receive a new ground target.
    pub fn accepts_retarget(self) -> bool {
        matches!(self, LegPhase::Swinging | LegPhase::Placing)
    }

    pub fn is_airborne(self) -> bool {
        self != LegPhase::Planted
    }
}

/// Seconds spent in each phase of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub planted: f32,
    pub lifting: f32,
    pub swinging: f32,
    pub placing: f32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            planted: 0.3,
            lifting: 0.1,
            swinging: 0.2,
            placing: 0.2,
        }
    }
}

impl PhaseDurations {
    pub fn new(planted: f32, lifting: f32, swinging: f32, placing: f32) -> Self {
        Self {
            planted,
            lifting,
            swinging,
            placing,
        }
    }

    pub fn get(&self, phase: LegPhase) -> f32 {
        match phase {
            LegPhase::Planted => self.planted,
            LegPhase::Lifting => self.lifting,
            LegPhase::Swinging => self.swinging,
            LegPhase::Placing => self.placing,
        }
    }

    pub fn cycle(&self) -> f32 {
        self.planted + self.lifting + self.swinging + self.placing
    }

    pub fn airborne(&self) -> f32 {
        self.lifting + self.swinging + self.placing
    }

    pub fn validate(&self, leg: usize) -> Result<(), ConfigError> {
        for phase in LegPhase::CYCLE {
            let value = self.get(phase);
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositivePhaseDuration { leg, phase, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_back_to_planted() {
        let mut phase = LegPhase::Planted;
        for expected in LegPhase::CYCLE.iter().cycle().skip(1).take(8) {
            phase = phase.next();
            assert_eq!(phase, *expected);
        }
    }

    #[test]
    fn zero_and_nan_durations_are_rejected() {
        let zero = PhaseDurations::new(0.3, 0.0, 0.2, 0.2);
        assert!(matches!(
            zero.validate(2),
            Err(ConfigError::NonPositivePhaseDuration {
                leg: 2,
                phase: LegPhase::Lifting,
                ..
            })
        ));

        let nan = PhaseDurations::new(0.3, 0.1, 0.2, f32::NAN);
        assert!(nan.validate(0).is_err());
        assert!(PhaseDurations::default().validate(0).is_ok());
    }
}
