use glam::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    /// Builds a ray limited to `max_distance`. A zero direction yields an empty range.
    pub fn with_max_distance(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        let direction = direction.normalize_or_zero();
        let t_max = if direction == Vec3::ZERO {
            0.0
        } else {
            max_distance.max(0.0)
        };
        Self {
            origin,
            direction,
            t_min: 0.0,
            t_max,
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn is_empty(&self) -> bool {
        self.t_max <= self.t_min || self.direction == Vec3::ZERO
    }

    pub(crate) fn accepts(&self, t: f32) -> bool {
        t >= self.t_min && t <= self.t_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}
