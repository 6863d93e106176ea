//! Walk configuration
//!
//! Every struct here deserializes with defaults for missing fields, so a JSON
//! file only needs the bones of each leg:
//!
//! ```json
//! { "legs": [ { "name": "left", "hip": 1, "knee": 2, "ankle": 3 } ] }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gait::PhaseDurations;
use crate::ik::JointLimits;
use crate::placement::{BodyConfig, StepCurve};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Length of the downward trace below the probe origin.
    pub probe_max_distance: f32,
    /// How far above the animated ankle the trace starts.
    pub probe_height: f32,
    /// Ankle height above the ground when planted.
    pub foot_height: f32,
    /// Peak lift of a stepping foot.
    pub step_height: f32,
    pub step_curve: StepCurve,
    /// Model-space up axis.
    pub up: Vec3,
    pub align_to_surface: bool,
    /// Steeper hits count as a probe miss.
    pub max_slope_degrees: f32,
    /// Plants a placing foot early once its clearance is at or below this.
    pub placement_height: Option<f32>,
    /// A planted foot only unplants once it lags at least this far behind
    /// the animated ankle, measured across the ground.
    pub min_distance_to_unplant: f32,
    pub body: BodyConfig,
    pub legs: Vec<LegConfig>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            probe_max_distance: 1.0,
            probe_height: 0.5,
            foot_height: 0.08,
            step_height: 0.12,
            step_curve: StepCurve::Robot,
            up: Vec3::Y,
            align_to_surface: true,
            max_slope_degrees: 60.0,
            placement_height: None,
            min_distance_to_unplant: 0.0,
            body: BodyConfig::default(),
            legs: Vec::new(),
        }
    }
}

impl WalkConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_leg(mut self, leg: LegConfig) -> Self {
        self.legs.push(leg);
        self
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up.try_normalize().unwrap_or(Vec3::Y)
    }

    /// Instance-wide checks. Leg problems are reported per leg elsewhere.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.probe_max_distance.is_finite() || self.probe_max_distance <= 0.0 {
            return Err(ConfigError::NonPositiveProbeDistance(self.probe_max_distance));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    #[serde(default)]
    pub name: String,
    pub hip: usize,
    pub knee: usize,
    pub ankle: usize,
    #[serde(default)]
    pub phase_durations: PhaseDurations,
    #[serde(default)]
    pub joint_limits: JointLimits,
    /// Direction the knee points towards, in model space.
    #[serde(default = "default_pole")]
    pub pole: Vec3,
    /// Extra planted time before this leg's first step.
    #[serde(default)]
    pub start_delay: f32,
    /// Legs sharing a group step together on the clock of the group's
    /// first enabled leg.
    #[serde(default)]
    pub group: Option<u32>,
}

fn default_pole() -> Vec3 {
    Vec3::Z
}

impl LegConfig {
    pub fn new(name: impl Into<String>, hip: usize, knee: usize, ankle: usize) -> Self {
        Self {
            name: name.into(),
            hip,
            knee,
            ankle,
            phase_durations: PhaseDurations::default(),
            joint_limits: JointLimits::default(),
            pole: default_pole(),
            start_delay: 0.0,
            group: None,
        }
    }

    pub fn with_phase_durations(mut self, durations: PhaseDurations) -> Self {
        self.phase_durations = durations;
        self
    }

    pub fn with_joint_limits(mut self, limits: JointLimits) -> Self {
        self.joint_limits = limits;
        self
    }

    pub fn with_pole(mut self, pole: Vec3) -> Self {
        self.pole = pole;
        self
    }

    pub fn with_start_delay(mut self, delay: f32) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config = WalkConfig::from_json(
            r#"{ "probe_max_distance": 2.0,
                 "legs": [ { "name": "left", "hip": 1, "knee": 2, "ankle": 3 } ] }"#,
        )
        .unwrap();

        assert_eq!(config.probe_max_distance, 2.0);
        assert_eq!(config.step_curve, StepCurve::Robot);
        assert_eq!(config.legs.len(), 1);
        assert_eq!(config.legs[0].pole, Vec3::Z);
        assert_eq!(config.legs[0].phase_durations, PhaseDurations::default());
        assert_eq!(config.legs[0].group, None);
        assert_eq!(config.min_distance_to_unplant, 0.0);
    }

    #[test]
    fn json_round_trip_keeps_settings() {
        let config = WalkConfig {
            step_curve: StepCurve::Organic,
            placement_height: Some(0.01),
            ..WalkConfig::default()
        }
        .with_leg(LegConfig::new("front", 0, 1, 2).with_start_delay(0.25))
        .with_leg(LegConfig::new("back", 3, 4, 5).with_group(1));

        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(WalkConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(
            WalkConfig::from_json("{ \"legs\": 3 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn probe_distance_must_be_positive() {
        let config = WalkConfig {
            probe_max_distance: 0.0,
            ..WalkConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveProbeDistance(_))
        ));
    }
}
