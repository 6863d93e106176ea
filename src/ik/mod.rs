//! Inverse kinematics: leg chains, joint limits, the two-bone solver and the
//! blend stage that feeds it.

pub mod blend;
pub mod constraint;
pub mod leg;
pub mod solver;

pub use blend::{apply, BlendOutput, LegResult};
pub use constraint::{JointLimits, SwingCone};
pub use leg::{LegChain, LegChainBuilder};
pub use solver::{SolveResult, TwoBoneSolver};
