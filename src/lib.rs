//! # procedural-walk
//!
//! Procedural foot placement for walking skeletons, meant to run inside an
//! animation-evaluation pipeline after the base animation has been sampled.
//!
//! ## Features
//! - Per-leg gait state machine (Planted, Lifting, Swinging, Placing), with leg groups
//! - Terrain probing through a host-implemented [`GroundQuery`], with a built-in [`TerrainWorld`]
//! - Foot target resolution with surface alignment and step curves
//! - Body lowering and optional tilt toward the planted feet, smoothed by a second-order spring
//! - Analytic two-bone IK with hip swing and knee bend limits
//!
//! ## Example
//! ```rust,ignore
//! use procedural_walk::{InstanceArena, LegConfig, TerrainWorld, TickInput, WalkConfig};
//!
//! let config = WalkConfig::default()
//!     .with_leg(LegConfig::new("left", 1, 2, 3))
//!     .with_leg(LegConfig::new("right", 4, 5, 6).with_start_delay(0.4));
//!
//! let mut arena = InstanceArena::new();
//! let handle = arena.spawn(config, &rest_pose)?;
//!
//! let mut world = TerrainWorld::new();
//! world.add_ground_plane(0.0);
//!
//! let input = TickInput::new(&animated_pose, &world, 1.0 / 60.0).with_root(root);
//! if let Some(output) = arena.tick(handle, &input) {
//!     apply_to_skeleton(&output.pose);
//! }
//! ```

pub mod arena;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod gait;
pub mod ik;
pub mod instance;
pub mod math;
pub mod placement;
pub mod pose;
pub mod terrain;

pub use arena::{InstanceArena, InstanceHandle};
pub use config::{LegConfig, WalkConfig};
pub use dynamics::{SecondOrderDynamics, SpringParams, SpringPreset};
pub use error::{ConfigError, Degradation};
pub use gait::{GaitStateMachine, LegPhase, LegState, PhaseDurations};
pub use ik::{BlendOutput, JointLimits, LegChain, SolveResult, TwoBoneSolver};
pub use instance::{Stage, StepEvent, TickInput, TickOutput, WalkInstance};
pub use math::Transform;
pub use placement::{BodyConfig, FootAnchor, FootResolver, FootTarget, StepCurve};
pub use pose::Pose;
pub use terrain::{GroundQuery, ProbeResult, Ray, RayHit, Surface, TerrainWorld};
