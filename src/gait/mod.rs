//! Gait cycle: per-leg phases and the state machine that advances them.

mod machine;
mod phase;

pub use machine::{GaitStateMachine, LegState};
pub use phase::{LegPhase, PhaseDurations};
