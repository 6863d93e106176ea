use super::phase::{LegPhase, PhaseDurations};

/// Slack when comparing accumulated phase time against a duration.
const PHASE_EPSILON: f32 = 1e-5;

/// Snapshot of one leg's position in the gait cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegState {
    pub phase: LegPhase,
    /// Seconds spent in the current phase.
    pub phase_time: f32,
    pub foot_index: usize,
    /// Fraction of the current phase elapsed, in `[0, 1]`.
    pub phase_progress: f32,
    /// Fraction of the whole step (lifting through placing) elapsed; 0 while planted.
    pub swing_progress: f32,
}

/// Drives a single leg through Planted → Lifting → Swinging → Placing.
///
/// A call to [`advance`](Self::advance) performs at most one transition. Time
/// left over after a transition carries into the next phase, so the cycle
/// keeps its length while every phase is still observed.
#[derive(Debug, Clone)]
pub struct GaitStateMachine {
    foot_index: usize,
    durations: PhaseDurations,
    placement_height: Option<f32>,
    phase: LegPhase,
    phase_time: f32,
    hold: f32,
    start_delay: f32,
}

impl GaitStateMachine {
    pub fn new(foot_index: usize, durations: PhaseDurations) -> Self {
        Self {
            foot_index,
            durations,
            placement_height: None,
            phase: LegPhase::Planted,
            phase_time: 0.0,
            hold: 0.0,
            start_delay: 0.0,
        }
    }

    /// Extends the first planted phase by `delay` seconds.
    pub fn with_start_delay(mut self, delay: f32) -> Self {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self.start_delay = delay;
        self.hold = delay;
        self
    }

    /// Plants the foot early once its clearance drops to `height` while placing.
    pub fn with_placement_height(mut self, height: Option<f32>) -> Self {
        self.placement_height = height.filter(|h| h.is_finite());
        self
    }

    pub fn phase(&self) -> LegPhase {
        self.phase
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub fn advance(&mut self, delta_time: f32) -> LegState {
        self.advance_with_clearance(delta_time, None)
    }

    /// Advances the cycle; `clearance` is the foot's height above its ground
    /// target, when known.
    pub fn advance_with_clearance(&mut self, delta_time: f32, clearance: Option<f32>) -> LegState {
        self.advance_gated(delta_time, clearance, true)
    }

    /// Like [`advance_with_clearance`](Self::advance_with_clearance), but a
    /// finished Planted phase only ends when `may_unplant` is set. Until then
    /// the leg stays planted at full progress.
    pub fn advance_gated(
        &mut self,
        delta_time: f32,
        clearance: Option<f32>,
        may_unplant: bool,
    ) -> LegState {
        let mut dt = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        if self.hold > 0.0 {
            let used = dt.min(self.hold);
            self.hold -= used;
            dt -= used;
        }

        self.phase_time += dt;

        let duration = self.durations.get(self.phase);
        let placed = self.phase == LegPhase::Placing
            && matches!(
                (clearance, self.placement_height),
                (Some(c), Some(h)) if c <= h
            );

        let held = self.phase == LegPhase::Planted && !may_unplant;

        if placed {
            self.enter(self.phase.next(), 0.0);
        } else if held {
            self.phase_time = self.phase_time.min(duration);
        } else if self.phase_time + PHASE_EPSILON >= duration {
            let carry = (self.phase_time - duration).max(0.0);
            self.enter(self.phase.next(), carry);
        }

        self.state()
    }

    fn enter(&mut self, phase: LegPhase, carry: f32) {
        log::trace!(
            "leg {}: {:?} -> {:?} (carry {:.4}s)",
            self.foot_index,
            self.phase,
            phase,
            carry
        );
        self.phase = phase;
        self.phase_time = carry;
    }

    pub fn state(&self) -> LegState {
        LegState {
            phase: self.phase,
            phase_time: self.phase_time,
            foot_index: self.foot_index,
            phase_progress: self.phase_progress(),
            swing_progress: self.swing_progress(),
        }
    }

    fn phase_progress(&self) -> f32 {
        let duration = self.durations.get(self.phase);
        if duration > 0.0 {
            (self.phase_time / duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn swing_progress(&self) -> f32 {
        let before = match self.phase {
            LegPhase::Planted => return 0.0,
            LegPhase::Lifting => 0.0,
            LegPhase::Swinging => self.durations.lifting,
            LegPhase::Placing => self.durations.lifting + self.durations.swinging,
        };
        let total = self.durations.airborne();
        if total <= 0.0 {
            return 1.0;
        }
        let elapsed = self.phase_time.min(self.durations.get(self.phase));
        ((before + elapsed) / total).clamp(0.0, 1.0)
    }

    /// Seconds until the foot is expected to plant; zero while planted.
    pub fn time_to_plant(&self) -> f32 {
        let after = match self.phase {
            LegPhase::Planted => return 0.0,
            LegPhase::Lifting => self.durations.swinging + self.durations.placing,
            LegPhase::Swinging => self.durations.placing,
            LegPhase::Placing => 0.0,
        };
        let remaining = (self.durations.get(self.phase) - self.phase_time).max(0.0);
        remaining + after
    }

    /// Returns to the initial planted state, restoring the start delay.
    pub fn reset(&mut self) {
        self.phase = LegPhase::Planted;
        self.phase_time = 0.0;
        self.hold = self.start_delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_durations() -> PhaseDurations {
        PhaseDurations::new(0.3, 0.1, 0.2, 0.2)
    }

    #[test]
    fn full_cycle_after_point_eight_seconds() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        let mut state = gait.state();
        for _ in 0..15 {
            state = gait.advance(0.05);
        }
        assert_eq!(state.phase, LegPhase::Placing);

        state = gait.advance(0.05);
        assert_eq!(state.phase, LegPhase::Planted);
        assert!(state.phase_time.abs() < 1e-4);
    }

    #[test]
    fn transitions_follow_cycle_order() {
        let mut gait = GaitStateMachine::new(3, scenario_durations());
        let mut previous = gait.state().phase;
        // uneven steps, including ones longer than a phase
        let steps = [0.016, 0.033, 0.25, 0.001, 0.4, 0.07, 0.0, 0.12, 0.9, 0.05];
        for i in 0..400 {
            let state = gait.advance(steps[i % steps.len()]);
            assert_eq!(state.foot_index, 3);
            if state.phase != previous {
                assert_eq!(state.phase, previous.next());
            }
            previous = state.phase;
        }
    }

    #[test]
    fn long_frame_still_visits_every_phase() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        let phases: Vec<_> = (0..4).map(|_| gait.advance(2.0).phase).collect();
        assert_eq!(
            phases,
            vec![
                LegPhase::Lifting,
                LegPhase::Swinging,
                LegPhase::Placing,
                LegPhase::Planted
            ]
        );
    }

    #[test]
    fn placement_height_plants_early() {
        let mut gait =
            GaitStateMachine::new(0, scenario_durations()).with_placement_height(Some(0.01));
        while gait.phase() != LegPhase::Placing {
            gait.advance(0.05);
        }
        assert_eq!(
            gait.advance_with_clearance(0.01, Some(0.2)).phase,
            LegPhase::Placing
        );
        assert_eq!(
            gait.advance_with_clearance(0.01, Some(0.005)).phase,
            LegPhase::Planted
        );
    }

    #[test]
    fn clearance_outside_placing_is_ignored() {
        let mut gait =
            GaitStateMachine::new(0, scenario_durations()).with_placement_height(Some(1.0));
        let state = gait.advance_with_clearance(0.01, Some(0.0));
        assert_eq!(state.phase, LegPhase::Planted);
    }

    #[test]
    fn start_delay_holds_first_plant() {
        let mut gait = GaitStateMachine::new(1, scenario_durations()).with_start_delay(0.4);
        for _ in 0..13 {
            assert_eq!(gait.advance(0.05).phase, LegPhase::Planted);
        }
        assert_eq!(gait.advance(0.05).phase, LegPhase::Lifting);
    }

    #[test]
    fn invalid_delta_time_is_ignored() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        gait.advance(0.1);
        let before = gait.state();
        assert_eq!(gait.advance(-1.0), before);
        assert_eq!(gait.advance(f32::NAN), before);
        assert_eq!(gait.advance(f32::INFINITY), before);
    }

    #[test]
    fn swing_progress_spans_airborne_phases() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        assert_eq!(gait.state().swing_progress, 0.0);

        let mut last = 0.0;
        let mut seen_airborne = false;
        for _ in 0..160 {
            let state = gait.advance(0.005);
            if state.phase.is_airborne() {
                seen_airborne = true;
                assert!(state.swing_progress + 1e-5 >= last);
                last = state.swing_progress;
            } else if seen_airborne {
                break;
            }
        }
        assert!(last > 0.95);
    }

    #[test]
    fn time_to_plant_counts_down() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        assert_eq!(gait.time_to_plant(), 0.0);
        for _ in 0..6 {
            gait.advance(0.05);
        }
        assert_eq!(gait.phase(), LegPhase::Lifting);
        assert!((gait.time_to_plant() - 0.5).abs() < 1e-4);
        gait.advance(0.05);
        assert!((gait.time_to_plant() - 0.45).abs() < 1e-4);
    }

    #[test]
    fn gated_leg_waits_planted() {
        let mut gait = GaitStateMachine::new(0, scenario_durations());
        for _ in 0..20 {
            let state = gait.advance_gated(0.05, None, false);
            assert_eq!(state.phase, LegPhase::Planted);
        }
        assert!((gait.state().phase_progress - 1.0).abs() < 1e-6);

        // released: lifts on the next tick without waiting another phase
        let state = gait.advance_gated(0.05, None, true);
        assert_eq!(state.phase, LegPhase::Lifting);
    }
}
