use glam::{Quat, Vec3};

use crate::math::Transform;

/// Model-space transforms of every bone, indexed by bone index.
///
/// Parent links are optional. Without them every bone stands alone and only
/// the bones a solver writes to move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    bones: Vec<Transform>,
    parents: Vec<Option<usize>>,
}

impl Pose {
    pub fn new(bones: Vec<Transform>) -> Self {
        Self {
            bones,
            parents: Vec::new(),
        }
    }

    /// Pose with a hierarchy; `parents[i]` is the parent of bone `i`.
    pub fn with_parents(bones: Vec<Transform>, parents: Vec<Option<usize>>) -> Self {
        Self { bones, parents }
    }

    pub fn bones(&self) -> &[Transform] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Transform> {
        self.bones.get(index)
    }

    pub fn bone_mut(&mut self, index: usize) -> Option<&mut Transform> {
        self.bones.get_mut(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// True when `ancestor` is found walking up from `bone`. Cycles end the walk.
    pub fn is_descendant(&self, bone: usize, ancestor: usize) -> bool {
        let mut current = self.parent(bone);
        for _ in 0..self.parents.len() {
            match current {
                Some(index) if index == ancestor => return true,
                Some(index) => current = self.parent(index),
                None => return false,
            }
        }
        false
    }

    /// Moves the descendants of `root` rigidly along with it, after `root`
    /// went from `before` to its current transform.
    ///
    /// The subtree under `stop` (and `stop` itself) is left alone; solvers
    /// place those bones themselves.
    pub fn carry_descendants(&mut self, root: usize, before: &Transform, stop: Option<usize>) {
        let Some(after) = self.bones.get(root).copied() else {
            return;
        };
        if after == *before || self.parents.is_empty() {
            return;
        }
        let delta = (after.rotation * before.rotation.inverse()).normalize();

        for index in 0..self.bones.len() {
            if index == root || !self.is_descendant(index, root) {
                continue;
            }
            if stop.is_some_and(|s| index == s || self.is_descendant(index, s)) {
                continue;
            }
            let bone = &mut self.bones[index];
            bone.position = after.position + delta * (bone.position - before.position);
            bone.rotation = (delta * bone.rotation).normalize();
        }
    }

    /// Moves every bone by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for bone in &mut self.bones {
            bone.position += offset;
        }
    }

    /// Rotates every bone about `pivot`.
    pub fn rotate_about(&mut self, pivot: Vec3, rotation: Quat) {
        for bone in &mut self.bones {
            bone.position = pivot + rotation * (bone.position - pivot);
            bone.rotation = (rotation * bone.rotation).normalize();
        }
    }
}

impl From<Vec<Transform>> for Pose {
    fn from(bones: Vec<Transform>) -> Self {
        Self::new(bones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foot_pose() -> Pose {
        Pose::with_parents(
            vec![
                Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
                Transform::from_position(Vec3::new(0.0, 0.1, 0.0)),
                Transform::from_position(Vec3::new(0.0, 0.0, 0.12)),
                Transform::from_position(Vec3::new(0.3, 0.0, 0.0)),
            ],
            vec![None, Some(0), Some(1), None],
        )
    }

    #[test]
    fn descendants_follow_parent_links() {
        let pose = foot_pose();
        assert!(pose.is_descendant(2, 0));
        assert!(pose.is_descendant(2, 1));
        assert!(!pose.is_descendant(3, 0));
        assert!(!pose.is_descendant(0, 2));
    }

    #[test]
    fn cyclic_parents_do_not_hang() {
        let pose = Pose::with_parents(vec![Transform::IDENTITY; 2], vec![Some(1), Some(0)]);
        assert!(!pose.is_descendant(0, 5));
    }

    #[test]
    fn carried_bones_keep_their_offset() {
        let mut pose = foot_pose();
        let before = *pose.bone(1).unwrap();
        let turn = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        *pose.bone_mut(1).unwrap() =
            Transform::from_position_rotation(Vec3::new(0.2, 0.3, 0.0), turn);

        pose.carry_descendants(1, &before, None);

        let toe = pose.bone(2).unwrap();
        assert!((toe.position - Vec3::new(0.32, 0.2, 0.0)).length() < 1e-5);
        assert!(toe.rotation.abs_diff_eq(turn, 1e-5));
        assert_eq!(pose.bone(3).unwrap().position, Vec3::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn stop_bone_subtree_is_skipped() {
        let mut pose = foot_pose();
        let before = *pose.bone(0).unwrap();
        pose.bone_mut(0).unwrap().position += Vec3::X;

        pose.carry_descendants(0, &before, Some(1));
        assert_eq!(pose.bone(1).unwrap().position, Vec3::new(0.0, 0.1, 0.0));
        assert_eq!(pose.bone(2).unwrap().position, Vec3::new(0.0, 0.0, 0.12));
    }
}
