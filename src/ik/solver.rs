use super::constraint::{clamp_bend, SwingCone};
use super::leg::LegChain;
use crate::pose::Pose;
use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct SolveResult {
    pub reached: bool,
    pub final_distance: f32,
}

/// Analytic hip-knee-ankle solver.
///
/// The hip stays where the pose puts it. Targets outside the reach allowed by
/// the knee range are clamped to the nearest reachable distance, and the thigh
/// is kept inside a swing cone around its direction in the incoming pose, so
/// the output never breaks the joint limits.
pub struct TwoBoneSolver;

impl TwoBoneSolver {
    pub const TOLERANCE: f32 = 0.001;

    pub fn solve(chain: &LegChain, pose: &mut Pose, target: Vec3) -> SolveResult {
        let (Some(hip), Some(knee), Some(ankle)) = (
            pose.bone(chain.hip).copied(),
            pose.bone(chain.knee).copied(),
            pose.bone(chain.ankle).copied(),
        ) else {
            return SolveResult {
                reached: false,
                final_distance: f32::INFINITY,
            };
        };

        let hip_pos = hip.position;
        let current_upper = direction_or(knee.position - hip_pos, chain.rest_upper_dir);
        let current_lower = direction_or(ankle.position - knee.position, chain.rest_lower_dir);

        let to_target = target - hip_pos;
        let distance = to_target.length();
        let dir = if distance > 0.0001 {
            to_target / distance
        } else {
            direction_or(ankle.position - hip_pos, chain.rest_upper_dir)
        };

        let (min_reach, max_reach) = chain.reach();
        let reach = distance.clamp(min_reach, max_reach).max(0.0001);

        let (u, l) = (chain.upper_length, chain.lower_length);
        let cos_hip = ((u * u + reach * reach - l * l) / (2.0 * u * reach)).clamp(-1.0, 1.0);
        let bend_axis = Self::bend_axis(dir, chain.pole, current_upper);
        let desired_upper = Quat::from_axis_angle(bend_axis, cos_hip.acos()) * dir;

        let upper_dir = SwingCone::from_radians(chain.limits.hip_swing_radians())
            .apply(desired_upper, current_upper);
        let knee_pos = hip_pos + upper_dir * u;

        let goal = hip_pos + dir * reach;
        let (knee_min, knee_max) = chain.limits.knee_range_radians();
        let lower_dir = clamp_bend(upper_dir, goal - knee_pos, bend_axis, knee_min, knee_max);
        let ankle_pos = knee_pos + lower_dir * l;

        if let Some(bone) = pose.bone_mut(chain.hip) {
            let swing = Quat::from_rotation_arc(current_upper, upper_dir);
            bone.rotation = (swing * hip.rotation).normalize();
        }
        if let Some(bone) = pose.bone_mut(chain.knee) {
            bone.position = knee_pos;
            let bend = Quat::from_rotation_arc(current_lower, lower_dir);
            bone.rotation = (bend * knee.rotation).normalize();
        }
        if let Some(bone) = pose.bone_mut(chain.ankle) {
            bone.position = ankle_pos;
        }

        let final_distance = (ankle_pos - target).length();
        SolveResult {
            reached: final_distance <= Self::TOLERANCE,
            final_distance,
        }
    }

    /// Axis about which the thigh rotates away from the hip-target line,
    /// chosen so the knee points at the pole.
    fn bend_axis(dir: Vec3, pole: Vec3, current_upper: Vec3) -> Vec3 {
        let perp = |v: Vec3| v - dir * v.dot(dir);

        let toward = [perp(pole), perp(current_upper)]
            .into_iter()
            .find(|v| v.length_squared() > 1e-6)
            .unwrap_or_else(|| dir.any_orthonormal_vector());

        dir.cross(toward).normalize_or_zero()
    }
}

fn direction_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len > 0.0001 {
        v / len
    } else {
        fallback
    }
}
