use glam::{Quat, Vec3};

const MIN_SCALE: f32 = 1e-6;

/// Position, rotation and scale of a bone or of the character root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// Like [`transform_direction`](Self::transform_direction) but keeps
    /// the scale, so lengths come out in the target space's units.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (vector * self.scale)
    }

    /// Maps a surface normal, following mirrored and non-uniform scale.
    pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
        (self.rotation * (normal / self.safe_scale())).normalize_or_zero()
    }

    pub fn inverse_transform_normal(&self, normal: Vec3) -> Vec3 {
        ((self.rotation.inverse() * normal) * self.scale).normalize_or_zero()
    }

    /// Maps a point from the space this transform points into back to its local space.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (point - self.position);
        local / self.safe_scale()
    }

    /// Scale with near-zero components replaced, keeping the sign of mirrored axes.
    fn safe_scale(&self) -> Vec3 {
        let degenerate = self.scale.abs().cmplt(Vec3::splat(MIN_SCALE));
        let floor = Vec3::splat(MIN_SCALE).copysign(self.scale);
        Vec3::select(degenerate, floor, self.scale)
    }

    pub fn inverse_transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.inverse() * direction
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

/// Tilts `rotation` so that its `up` axis follows `normal`.
///
/// Degenerate normals leave the rotation untouched.
pub fn align_to_normal(rotation: Quat, up: Vec3, normal: Vec3) -> Quat {
    let up = up.normalize_or_zero();
    let normal = normal.normalize_or_zero();
    if up.length_squared() < 0.0001 || normal.length_squared() < 0.0001 {
        return rotation;
    }
    (Quat::from_rotation_arc(up, normal) * rotation).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_scale_round_trips_points() {
        let root = Transform {
            position: Vec3::new(1.0, 0.0, -2.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::new(-1.0, 1.0, 1.0),
        };
        let point = Vec3::new(0.1, 0.08, 0.3);

        let back = root.inverse_transform_point(root.transform_point(point));
        assert!((back - point).length() < 1e-5, "got {back}");
    }

    #[test]
    fn collapsed_axis_stays_finite() {
        let root = Transform {
            scale: Vec3::new(0.0, 2.0, -0.0),
            ..Transform::IDENTITY
        };
        let local = root.inverse_transform_point(Vec3::new(1.0, 4.0, 1.0));
        assert!(local.is_finite());
        assert!((local.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn vector_keeps_scale() {
        let root = Transform {
            scale: Vec3::splat(3.0),
            ..Transform::IDENTITY
        };
        assert_eq!(root.transform_vector(Vec3::NEG_Y), Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(root.transform_direction(Vec3::NEG_Y), Vec3::NEG_Y);
    }

    #[test]
    fn normals_follow_mirror() {
        let root = Transform {
            scale: Vec3::new(-1.0, 1.0, 1.0),
            ..Transform::IDENTITY
        };
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let world = root.transform_normal(normal);
        assert!((world - Vec3::new(-1.0, 1.0, 0.0).normalize()).length() < 1e-6);
        assert!((root.inverse_transform_normal(world) - normal).length() < 1e-6);
    }
}
