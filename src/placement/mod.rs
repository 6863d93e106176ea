//! Foot placement: turning probes and gait timing into foot targets, and
//! keeping the body low enough for the feet to reach them.

mod body;
mod curve;
mod resolver;

pub use body::{BodyAdjuster, BodyConfig};
pub use curve::{CurveKey, StepCurve};
pub use resolver::{FootAnchor, FootResolver, FootTarget};
