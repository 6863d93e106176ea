use smallvec::SmallVec;

use super::leg::LegChain;
use super::solver::{SolveResult, TwoBoneSolver};
use crate::math::Transform;
use crate::placement::FootTarget;
use crate::pose::Pose;

/// Weights at or below this leave a leg on its base animation.
const MIN_WEIGHT: f32 = 1e-4;

#[derive(Debug, Clone, Copy)]
pub struct LegResult {
    pub leg: usize,
    pub solve: SolveResult,
}

#[derive(Debug, Clone)]
pub struct BlendOutput {
    pub pose: Pose,
    pub results: SmallVec<[LegResult; 4]>,
}

/// Blends each foot target into `base_pose` by its weight, then solves the leg.
///
/// Legs whose chain does not fit the pose are skipped and keep the base pose.
pub fn apply<'a, I>(base_pose: &Pose, targets: I) -> BlendOutput
where
    I: IntoIterator<Item = (&'a LegChain, FootTarget)>,
{
    let mut pose = base_pose.clone();
    let mut results = SmallVec::new();

    for (chain, target) in targets {
        let weight = target.blend_weight.clamp(0.0, 1.0);
        if weight <= MIN_WEIGHT {
            continue;
        }
        let Some(base_ankle) = base_pose.bone(chain.ankle()).copied() else {
            continue;
        };

        let goal = Transform {
            position: target.position,
            rotation: target.rotation,
            scale: base_ankle.scale,
        };
        let blended = base_ankle.lerp(&goal, weight);

        let joints = [chain.hip(), chain.knee(), chain.ankle()];
        let before = joints.map(|bone| pose.bone(bone).copied());

        let solve = TwoBoneSolver::solve(chain, &mut pose, blended.position);
        if let Some(ankle) = pose.bone_mut(chain.ankle()) {
            ankle.rotation = blended.rotation;
        }

        // bones hanging off the chain (twist bones, toes) move with their joint
        let stops = [Some(chain.knee()), Some(chain.ankle()), None];
        for ((joint, before), stop) in joints.into_iter().zip(before).zip(stops) {
            if let Some(before) = before {
                pose.carry_descendants(joint, &before, stop);
            }
        }

        results.push(LegResult {
            leg: chain.leg(),
            solve,
        });
    }

    BlendOutput { pose, results }
}
