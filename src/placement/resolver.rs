use glam::{Quat, Vec3};

use super::curve::StepCurve;
use crate::config::WalkConfig;
use crate::gait::{LegPhase, LegState};
use crate::math::{align_to_normal, Transform};
use crate::terrain::ProbeResult;

/// Where a foot should be this tick, and how strongly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootTarget {
    pub position: Vec3,
    pub rotation: Quat,
    /// 0 keeps the animated foot, 1 uses the target fully.
    pub blend_weight: f32,
}

/// Ground placement a target is built from, before lift and weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootAnchor {
    pub position: Vec3,
    pub rotation: Quat,
    pub normal: Vec3,
    /// False when the anchor fell back to the rest pose.
    pub grounded: bool,
}

/// Turns probe results and gait timing into foot targets.
#[derive(Debug, Clone)]
pub struct FootResolver {
    foot_height: f32,
    step_height: f32,
    step_curve: StepCurve,
    up: Vec3,
    align_to_surface: bool,
}

impl Default for FootResolver {
    fn default() -> Self {
        Self::from_config(&WalkConfig::default())
    }
}

impl FootResolver {
    pub fn from_config(config: &WalkConfig) -> Self {
        Self {
            foot_height: config.foot_height,
            step_height: config.step_height,
            step_curve: config.step_curve.clone(),
            up: config.up_axis(),
            align_to_surface: config.align_to_surface,
        }
    }

    pub fn with_foot_height(mut self, foot_height: f32) -> Self {
        self.foot_height = foot_height;
        self
    }

    pub fn with_step_height(mut self, step_height: f32) -> Self {
        self.step_height = step_height;
        self
    }

    pub fn with_step_curve(mut self, step_curve: StepCurve) -> Self {
        self.step_curve = step_curve;
        self
    }

    pub fn with_align_to_surface(mut self, align: bool) -> Self {
        self.align_to_surface = align;
        self
    }

    /// Places the foot on the probed surface, or on the rest pose when the
    /// probe found nothing.
    pub fn anchor(&self, probe: &ProbeResult, rest_foot: &Transform) -> FootAnchor {
        if !probe.valid {
            return FootAnchor {
                position: rest_foot.position,
                rotation: rest_foot.rotation,
                normal: self.up,
                grounded: false,
            };
        }

        let normal = match probe.hit_normal.try_normalize() {
            Some(n) => n,
            None => self.up,
        };
        let rotation = if self.align_to_surface {
            align_to_normal(rest_foot.rotation, self.up, normal)
        } else {
            rest_foot.rotation
        };

        FootAnchor {
            position: probe.hit_position + normal * self.foot_height,
            rotation,
            normal,
            grounded: true,
        }
    }

    /// Planted 1, Lifting fades out, Swinging 0, Placing fades in.
    pub fn blend_weight(state: &LegState) -> f32 {
        let p = state.phase_progress.clamp(0.0, 1.0);
        match state.phase {
            LegPhase::Planted => 1.0,
            LegPhase::Lifting => 1.0 - p,
            LegPhase::Swinging => 0.0,
            LegPhase::Placing => p,
        }
    }

    pub fn lift(&self, state: &LegState) -> f32 {
        if state.phase.is_airborne() {
            self.step_height * self.step_curve.sample(state.swing_progress)
        } else {
            0.0
        }
    }

    pub fn target(&self, state: &LegState, anchor: &FootAnchor) -> FootTarget {
        let position = if anchor.grounded {
            anchor.position + self.up * self.lift(state)
        } else {
            anchor.position
        };
        FootTarget {
            position,
            rotation: anchor.rotation,
            blend_weight: Self::blend_weight(state),
        }
    }

    pub fn resolve(
        &self,
        state: &LegState,
        probe: &ProbeResult,
        rest_foot: &Transform,
    ) -> FootTarget {
        self.target(state, &self.anchor(probe, rest_foot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gait::{GaitStateMachine, PhaseDurations};

    fn rest_foot() -> Transform {
        Transform::from_position_rotation(Vec3::new(0.1, 0.08, 0.02), Quat::from_rotation_y(0.3))
    }

    fn state(phase: LegPhase, phase_progress: f32, swing_progress: f32) -> LegState {
        LegState {
            phase,
            phase_time: 0.0,
            foot_index: 0,
            phase_progress,
            swing_progress,
        }
    }

    #[test]
    fn miss_falls_back_to_rest_pose() {
        let resolver = FootResolver::default().with_step_height(0.3);
        let rest = rest_foot();
        for phase in LegPhase::CYCLE {
            let target = resolver.resolve(&state(phase, 0.5, 0.5), &ProbeResult::miss(), &rest);
            assert_eq!(target.position, rest.position);
            assert_eq!(target.rotation, rest.rotation);
        }
    }

    #[test]
    fn hit_sits_foot_height_above_ground() {
        let resolver = FootResolver::default().with_foot_height(0.08);
        let probe = ProbeResult::hit(Vec3::new(0.1, 0.25, 0.0), Vec3::Y);
        let target = resolver.resolve(&state(LegPhase::Planted, 0.2, 0.0), &probe, &rest_foot());
        assert!((target.position - Vec3::new(0.1, 0.33, 0.0)).length() < 1e-6);
        assert_eq!(target.blend_weight, 1.0);
    }

    #[test]
    fn weights_per_phase() {
        assert_eq!(FootResolver::blend_weight(&state(LegPhase::Planted, 0.7, 0.0)), 1.0);
        let lifting = FootResolver::blend_weight(&state(LegPhase::Lifting, 0.25, 0.1));
        assert!((lifting - 0.75).abs() < 1e-6);
        assert_eq!(FootResolver::blend_weight(&state(LegPhase::Swinging, 0.5, 0.5)), 0.0);
        let placing = FootResolver::blend_weight(&state(LegPhase::Placing, 0.4, 0.9));
        assert!((placing - 0.4).abs() < 1e-6);
    }

    #[test]
    fn weight_rises_through_placing() {
        let resolver = FootResolver::default();
        let probe = ProbeResult::hit(Vec3::ZERO, Vec3::Y);
        let mut gait = GaitStateMachine::new(0, PhaseDurations::default());
        while gait.phase() != LegPhase::Placing {
            gait.advance(0.01);
        }

        let mut last = resolver.resolve(&gait.state(), &probe, &rest_foot()).blend_weight;
        assert!(last < 0.1);
        loop {
            let state = gait.advance(0.007);
            if state.phase != LegPhase::Placing {
                break;
            }
            let weight = resolver.resolve(&state, &probe, &rest_foot()).blend_weight;
            assert!(weight >= last);
            last = weight;
        }
        assert!(last > 0.9);
    }

    #[test]
    fn airborne_grounded_foot_is_lifted() {
        let resolver = FootResolver::default().with_step_height(0.2).with_foot_height(0.0);
        let probe = ProbeResult::hit(Vec3::ZERO, Vec3::Y);
        let target = resolver.resolve(&state(LegPhase::Swinging, 0.5, 0.5), &probe, &rest_foot());
        assert!((target.position.y - 0.2).abs() < 1e-5);
    }

    #[test]
    fn foot_tilts_with_slope() {
        let resolver = FootResolver::default();
        let normal = Vec3::new(-0.5, 1.0, 0.0).normalize();
        let probe = ProbeResult::hit(Vec3::ZERO, normal);
        let planted = state(LegPhase::Planted, 0.0, 0.0);
        let target = resolver.resolve(&planted, &probe, &Transform::IDENTITY);
        assert!((target.rotation * Vec3::Y - normal).length() < 1e-4);

        let flat = resolver
            .clone()
            .with_align_to_surface(false)
            .resolve(&state(LegPhase::Planted, 0.0, 0.0), &probe, &Transform::IDENTITY);
        assert_eq!(flat.rotation, Quat::IDENTITY);
    }
}
