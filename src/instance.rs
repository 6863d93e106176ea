//! Per-character evaluation: one [`WalkInstance`] owns every leg's gait,
//! cached ground anchors and the body spring, and runs the tick pipeline.

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::config::{LegConfig, WalkConfig};
use crate::error::{ConfigError, Degradation};
use crate::gait::{GaitStateMachine, LegPhase, LegState};
use crate::ik::{self, LegChain};
use crate::math::Transform;
use crate::placement::{BodyAdjuster, FootAnchor, FootResolver, FootTarget};
use crate::pose::Pose;
use crate::terrain::{GroundQuery, ProbeResult};

/// Per-leg storage sized for the common two-to-four legged case.
pub type PerLeg<T> = SmallVec<[T; 4]>;

/// Everything the host hands over for one tick.
pub struct TickInput<'a, G: GroundQuery + ?Sized> {
    /// Animated pose in model space.
    pub base_pose: &'a Pose,
    /// Model space to world space.
    pub root: Transform,
    pub delta_time: f32,
    /// Locomotion velocity in world space, used to predict landing spots.
    pub velocity: Vec3,
    pub ground: &'a G,
}

impl<'a, G: GroundQuery + ?Sized> TickInput<'a, G> {
    pub fn new(base_pose: &'a Pose, ground: &'a G, delta_time: f32) -> Self {
        Self {
            base_pose,
            root: Transform::IDENTITY,
            delta_time,
            velocity: Vec3::ZERO,
            ground,
        }
    }

    pub fn with_root(mut self, root: Transform) -> Self {
        self.root = root;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Foot contact changes, positions in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEvent {
    FootUp {
        leg: usize,
        position: Vec3,
    },
    FootDown {
        leg: usize,
        position: Vec3,
        normal: Vec3,
        grounded: bool,
    },
}

#[derive(Debug, Clone)]
pub struct TickOutput {
    pub pose: Pose,
    /// Indexed by leg; `None` for disabled legs.
    pub targets: PerLeg<Option<FootTarget>>,
    pub leg_states: PerLeg<Option<LegState>>,
    pub events: PerLeg<StepEvent>,
    pub degradations: PerLeg<Degradation>,
    /// Body offset along up applied before IK.
    pub body_offset: f32,
    /// Body tilt applied before IK, about the mean hip position.
    pub body_rotation: Quat,
}

/// Stages of a tick, run in [`Stage::PIPELINE`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Gait,
    Probe,
    Resolve,
    Body,
    BlendIk,
}

impl Stage {
    pub const PIPELINE: [Stage; 5] = [
        Stage::Gait,
        Stage::Probe,
        Stage::Resolve,
        Stage::Body,
        Stage::BlendIk,
    ];
}

/// Gait timing shared by the legs of one group; ungrouped legs get their own.
#[derive(Debug, Clone)]
struct GaitClock {
    gait: GaitStateMachine,
    legs: PerLeg<usize>,
}

#[derive(Debug, Clone)]
struct LegRuntime {
    name: String,
    chain: LegChain,
    clock: usize,
    rest_foot: Transform,
    /// Last grounded anchor, in world space so planted feet stay put while the root moves.
    anchor: Option<FootAnchor>,
    clearance: Option<f32>,
}

/// Working data handed from stage to stage within one tick.
struct Frame {
    pose: Pose,
    states: PerLeg<Option<LegState>>,
    left_phase: PerLeg<Option<LegPhase>>,
    probes: PerLeg<Option<ProbeResult>>,
    targets: PerLeg<Option<FootTarget>>,
    events: PerLeg<StepEvent>,
    degradations: PerLeg<Degradation>,
    body_offset: f32,
    body_rotation: Quat,
}

impl Frame {
    fn new(leg_count: usize, pose: Pose) -> Self {
        Self {
            pose,
            states: smallvec::smallvec![None; leg_count],
            left_phase: smallvec::smallvec![None; leg_count],
            probes: smallvec::smallvec![None; leg_count],
            targets: smallvec::smallvec![None; leg_count],
            events: SmallVec::new(),
            degradations: SmallVec::new(),
            body_offset: 0.0,
            body_rotation: Quat::IDENTITY,
        }
    }

    fn into_output(self) -> TickOutput {
        TickOutput {
            pose: self.pose,
            targets: self.targets,
            leg_states: self.states,
            events: self.events,
            degradations: self.degradations,
            body_offset: self.body_offset,
            body_rotation: self.body_rotation,
        }
    }
}

#[derive(Debug)]
pub struct WalkInstance {
    config: WalkConfig,
    up: Vec3,
    cos_max_slope: f32,
    resolver: FootResolver,
    body: BodyAdjuster,
    clocks: Vec<GaitClock>,
    legs: Vec<Option<LegRuntime>>,
    issues: Vec<ConfigError>,
}

impl WalkInstance {
    /// Builds an instance for a skeleton with the given rest pose.
    ///
    /// Legs with invalid settings are disabled and listed in
    /// [`config_issues`](Self::config_issues); only instance-wide problems
    /// return an error.
    pub fn new(config: WalkConfig, rest_pose: &Pose) -> Result<Self, ConfigError> {
        config.validate()?;

        let up = config.up_axis();
        let mut legs = Vec::with_capacity(config.legs.len());
        let mut clocks: Vec<GaitClock> = Vec::new();
        let mut groups: Vec<(u32, usize)> = Vec::new();
        let mut issues = Vec::new();

        for (index, leg) in config.legs.iter().enumerate() {
            match Self::build_leg(index, leg, rest_pose) {
                Ok(mut runtime) => {
                    let shared = leg
                        .group
                        .and_then(|g| groups.iter().find(|(id, _)| *id == g))
                        .map(|&(_, clock)| clock);
                    runtime.clock = match shared {
                        Some(clock) => {
                            log::debug!("leg {} steps with clock {}", index, clock);
                            clocks[clock].legs.push(index);
                            clock
                        }
                        None => {
                            let gait = GaitStateMachine::new(index, leg.phase_durations)
                                .with_start_delay(leg.start_delay)
                                .with_placement_height(config.placement_height);
                            clocks.push(GaitClock {
                                gait,
                                legs: smallvec::smallvec![index],
                            });
                            if let Some(group) = leg.group {
                                groups.push((group, clocks.len() - 1));
                            }
                            clocks.len() - 1
                        }
                    };
                    legs.push(Some(runtime));
                }
                Err(err) => {
                    log::warn!("disabling leg {} ({:?}): {}", index, leg.name, err);
                    issues.push(err);
                    legs.push(None);
                }
            }
        }

        log::info!(
            "walk instance ready: {} of {} legs enabled",
            legs.iter().flatten().count(),
            legs.len()
        );

        Ok(Self {
            up,
            cos_max_slope: config.max_slope_degrees.clamp(0.0, 180.0).to_radians().cos(),
            resolver: FootResolver::from_config(&config),
            body: BodyAdjuster::new(config.body, up),
            clocks,
            legs,
            issues,
            config,
        })
    }

    fn build_leg(
        index: usize,
        leg: &LegConfig,
        rest_pose: &Pose,
    ) -> Result<LegRuntime, ConfigError> {
        leg.phase_durations.validate(index)?;
        let chain = LegChain::builder(leg.hip, leg.knee, leg.ankle)
            .pole(leg.pole)
            .limits(leg.joint_limits)
            .build(index, rest_pose)?;
        let rest_foot = rest_pose
            .bone(leg.ankle)
            .copied()
            .unwrap_or(Transform::IDENTITY);

        Ok(LegRuntime {
            name: leg.name.clone(),
            chain,
            clock: 0,
            rest_foot,
            anchor: None,
            clearance: None,
        })
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Leg-scoped configuration errors found at creation.
    pub fn config_issues(&self) -> &[ConfigError] {
        &self.issues
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    pub fn is_leg_enabled(&self, leg: usize) -> bool {
        matches!(self.legs.get(leg), Some(Some(_)))
    }

    pub fn leg_name(&self, leg: usize) -> Option<&str> {
        self.runtime(leg).map(|r| r.name.as_str())
    }

    pub fn leg_state(&self, leg: usize) -> Option<LegState> {
        let clock = self.clocks.get(self.runtime(leg)?.clock)?;
        Some(LegState {
            foot_index: leg,
            ..clock.gait.state()
        })
    }

    /// Cached world-space anchor of a leg, if it has been grounded.
    pub fn anchor(&self, leg: usize) -> Option<FootAnchor> {
        self.runtime(leg).and_then(|r| r.anchor)
    }

    fn runtime(&self, leg: usize) -> Option<&LegRuntime> {
        self.legs.get(leg).and_then(Option::as_ref)
    }

    /// Back to planted legs, no anchors and a neutral body.
    pub fn reset(&mut self) {
        for clock in &mut self.clocks {
            clock.gait.reset();
        }
        for leg in self.legs.iter_mut().flatten() {
            leg.anchor = None;
            leg.clearance = None;
        }
        self.body.reset();
    }

    pub fn tick<G: GroundQuery + ?Sized>(&mut self, input: &TickInput<'_, G>) -> TickOutput {
        let mut frame = Frame::new(self.legs.len(), input.base_pose.clone());

        for stage in Stage::PIPELINE {
            match stage {
                Stage::Gait => self.run_gait(input, &mut frame),
                Stage::Probe => self.run_probe(input, &mut frame),
                Stage::Resolve => self.run_resolve(input, &mut frame),
                Stage::Body => self.run_body(input, &mut frame),
                Stage::BlendIk => self.run_blend_ik(&mut frame),
            }
        }

        frame.into_output()
    }

    fn run_gait<G: GroundQuery + ?Sized>(&mut self, input: &TickInput<'_, G>, frame: &mut Frame) {
        let root = input.root;
        let min_lag = self.config.min_distance_to_unplant;

        for clock in &mut self.clocks {
            let members = || {
                clock
                    .legs
                    .iter()
                    .filter_map(|&index| Some((index, self.legs.get(index)?.as_ref()?)))
            };

            // the group plants once its highest foot is down
            let clearance = members()
                .filter_map(|(_, leg)| leg.clearance)
                .reduce(f32::max);
            let may_unplant = min_lag.is_nan()
                || min_lag <= 0.0
                || members().any(|(_, leg)| {
                    planted_lag(leg, &frame.pose, &root, self.up) >= min_lag
                });

            let previous = clock.gait.phase();
            let state = clock
                .gait
                .advance_gated(input.delta_time, clearance, may_unplant);

            for (index, leg) in members() {
                if state.phase != previous {
                    frame.left_phase[index] = Some(previous);
                    if previous == LegPhase::Planted {
                        let position = match leg.anchor {
                            Some(anchor) => anchor.position,
                            None => root.transform_point(ankle_position(
                                &frame.pose,
                                &leg.chain,
                                &leg.rest_foot,
                            )),
                        };
                        frame.events.push(StepEvent::FootUp {
                            leg: index,
                            position,
                        });
                    }
                }
                frame.states[index] = Some(LegState {
                    foot_index: index,
                    ..state
                });
            }
        }
    }

    fn run_probe<G: GroundQuery + ?Sized>(&mut self, input: &TickInput<'_, G>, frame: &mut Frame) {
        let root = input.root;
        // trace in world units so a scaled root scales the trace with it
        let trace = self.config.probe_height.max(0.0) + self.config.probe_max_distance;
        let trace_world = root.transform_vector(-self.up * trace);
        let down_world = trace_world.normalize_or_zero();
        let max_distance = trace_world.length();
        let velocity_model = root.inverse_transform_point(root.position + input.velocity);

        for (index, slot) in self.legs.iter().enumerate() {
            let (Some(leg), Some(state)) = (slot, frame.states[index]) else {
                continue;
            };
            if leg.anchor.is_some() && !state.phase.accepts_retarget() {
                continue;
            }

            let time_to_plant = self
                .clocks
                .get(leg.clock)
                .map_or(0.0, |clock| clock.gait.time_to_plant());
            let predicted = ankle_position(&frame.pose, &leg.chain, &leg.rest_foot)
                + velocity_model * time_to_plant;
            let origin = root.transform_point(predicted + self.up * self.config.probe_height);

            let hit = input.ground.probe(origin, down_world, max_distance);
            let mut result = if hit.valid {
                ProbeResult::hit(
                    root.inverse_transform_point(hit.hit_position),
                    root.inverse_transform_normal(hit.hit_normal),
                )
            } else {
                hit
            };

            if result.valid && result.hit_normal.dot(self.up) < self.cos_max_slope {
                log::debug!("leg {}: surface too steep, ignoring hit", index);
                result = ProbeResult::miss();
            }
            if !result.valid {
                log::debug!("leg {}: no ground under foot, using rest pose", index);
                frame.degradations.push(Degradation::ProbeMiss { leg: index });
            }
            frame.probes[index] = Some(result);
        }
    }

    fn run_resolve<G: GroundQuery + ?Sized>(
        &mut self,
        input: &TickInput<'_, G>,
        frame: &mut Frame,
    ) {
        let root = input.root;

        for (index, slot) in self.legs.iter_mut().enumerate() {
            let (Some(leg), Some(state)) = (slot, frame.states[index]) else {
                continue;
            };

            let anchor = match frame.probes[index] {
                Some(probe) => {
                    let anchor = self.resolver.anchor(&probe, &leg.rest_foot);
                    leg.anchor = anchor.grounded.then(|| anchor_to_world(&anchor, &root));
                    anchor
                }
                None => match leg.anchor {
                    Some(world) => anchor_to_model(&world, &root),
                    None => self.resolver.anchor(&ProbeResult::miss(), &leg.rest_foot),
                },
            };

            let target = self.resolver.target(&state, &anchor);
            frame.targets[index] = Some(target);

            let ankle = ankle_position(&frame.pose, &leg.chain, &leg.rest_foot);
            leg.clearance = anchor
                .grounded
                .then(|| (ankle - anchor.position).dot(self.up));

            if frame.left_phase[index] == Some(LegPhase::Placing) {
                frame.events.push(StepEvent::FootDown {
                    leg: index,
                    position: root.transform_point(anchor.position),
                    normal: root.transform_normal(anchor.normal),
                    grounded: anchor.grounded,
                });
            }
        }
    }

    fn run_body<G: GroundQuery + ?Sized>(&mut self, input: &TickInput<'_, G>, frame: &mut Frame) {
        let up = self.up;
        let drops = self
            .legs
            .iter()
            .zip(frame.targets.iter())
            .filter_map(|(slot, target)| {
                let (leg, target) = (slot.as_ref()?, target.as_ref()?);
                let ankle = ankle_position(&frame.pose, &leg.chain, &leg.rest_foot);
                Some(((target.position - ankle).dot(up), target.blend_weight))
            });

        let desired = self.body.desired_offset(drops);
        let offset = self.body.update(desired, input.delta_time);
        if offset != 0.0 {
            frame.pose.translate(self.body.offset_vector(offset));
        }
        frame.body_offset = offset;

        // only planted feet define the ground plane
        let feet = frame
            .states
            .iter()
            .zip(frame.targets.iter())
            .filter_map(|(state, target)| {
                let planted = state.as_ref()?.phase == LegPhase::Planted;
                let target = target.as_ref()?;
                planted.then_some((target.position, target.blend_weight))
            });
        let slope = self.body.desired_slope(feet);
        let rotation = self.body.update_tilt(slope, input.delta_time);
        if rotation != Quat::IDENTITY {
            let (sum, count) = self
                .legs
                .iter()
                .flatten()
                .filter_map(|leg| frame.pose.bone(leg.chain.hip()))
                .fold((Vec3::ZERO, 0.0), |(sum, n), hip| (sum + hip.position, n + 1.0));
            if count > 0.0 {
                frame.pose.rotate_about(sum / count, rotation);
            }
        }
        frame.body_rotation = rotation;
    }

    fn run_blend_ik(&mut self, frame: &mut Frame) {
        let jobs = self
            .legs
            .iter()
            .zip(frame.targets.iter())
            .filter_map(|(slot, target)| Some((&slot.as_ref()?.chain, (*target)?)));

        let output = ik::apply(&frame.pose, jobs);

        for result in &output.results {
            if !result.solve.reached {
                log::debug!(
                    "leg {}: target out of reach by {:.4}, clamped",
                    result.leg,
                    result.solve.final_distance
                );
                frame.degradations.push(Degradation::UnreachableTarget {
                    leg: result.leg,
                    shortfall: result.solve.final_distance,
                });
            }
        }
        frame.pose = output.pose;
    }
}

fn ankle_position(pose: &Pose, chain: &LegChain, rest_foot: &Transform) -> Vec3 {
    pose.bone(chain.ankle())
        .map_or(rest_foot.position, |bone| bone.position)
}

/// How far a planted foot trails its animated ankle across the ground.
/// Unanchored feet are always free to step.
fn planted_lag(leg: &LegRuntime, pose: &Pose, root: &Transform, up: Vec3) -> f32 {
    let Some(anchor) = leg.anchor else {
        return f32::INFINITY;
    };
    let lag = root.inverse_transform_point(anchor.position)
        - ankle_position(pose, &leg.chain, &leg.rest_foot);
    (lag - up * lag.dot(up)).length()
}

fn anchor_to_world(anchor: &FootAnchor, root: &Transform) -> FootAnchor {
    FootAnchor {
        position: root.transform_point(anchor.position),
        rotation: (root.rotation * anchor.rotation).normalize(),
        normal: root.transform_normal(anchor.normal),
        grounded: anchor.grounded,
    }
}

fn anchor_to_model(anchor: &FootAnchor, root: &Transform) -> FootAnchor {
    FootAnchor {
        position: root.inverse_transform_point(anchor.position),
        rotation: (root.rotation.inverse() * anchor.rotation).normalize(),
        normal: root.inverse_transform_normal(anchor.normal),
        grounded: anchor.grounded,
    }
}
