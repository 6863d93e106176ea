use glam::Vec3;

use super::ray::{Ray, RayHit};

/// Result of a single downward trace for one foot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub hit_position: Vec3,
    pub hit_normal: Vec3,
    pub valid: bool,
}

impl ProbeResult {
    pub fn hit(hit_position: Vec3, hit_normal: Vec3) -> Self {
        Self {
            hit_position,
            hit_normal,
            valid: true,
        }
    }

    pub fn miss() -> Self {
        Self {
            hit_position: Vec3::ZERO,
            hit_normal: Vec3::ZERO,
            valid: false,
        }
    }
}

impl Default for ProbeResult {
    fn default() -> Self {
        Self::miss()
    }
}

/// Collision accessor supplied by the host.
///
/// Implementations must be deterministic for a given world snapshot so that
/// identical frames produce identical gaits.
pub trait GroundQuery {
    fn raycast(&self, ray: &Ray) -> Option<RayHit>;

    /// Traces from `origin` along `direction` up to `max_distance`.
    ///
    /// Never fails: a missing surface, a zero direction or a non-positive
    /// distance all produce an invalid result.
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> ProbeResult {
        if max_distance.is_nan() || max_distance <= 0.0 || !origin.is_finite() {
            return ProbeResult::miss();
        }
        let ray = Ray::with_max_distance(origin, direction, max_distance);
        if ray.is_empty() {
            return ProbeResult::miss();
        }
        match self.raycast(&ray) {
            Some(hit) => ProbeResult::hit(hit.point, hit.normal.normalize_or_zero()),
            None => ProbeResult::miss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainWorld;

    #[test]
    fn probe_reports_hit_and_normal() {
        let mut world = TerrainWorld::new();
        world.add_ground_plane(-0.5);

        let result = world.probe(Vec3::new(1.0, 1.0, 0.0), Vec3::NEG_Y, 3.0);
        assert!(result.valid);
        assert!((result.hit_position - Vec3::new(1.0, -0.5, 0.0)).length() < 1e-5);
        assert_eq!(result.hit_normal, Vec3::Y);
    }

    #[test]
    fn probe_fails_soft() {
        let mut world = TerrainWorld::new();
        world.add_ground_plane(-10.0);

        assert!(!world.probe(Vec3::ZERO, Vec3::NEG_Y, 2.0).valid);
        assert!(!world.probe(Vec3::ZERO, Vec3::ZERO, 20.0).valid);
        assert!(!world.probe(Vec3::ZERO, Vec3::NEG_Y, -1.0).valid);
        assert!(!world.probe(Vec3::ZERO, Vec3::NEG_Y, f32::NAN).valid);
    }

    #[test]
    fn probe_is_deterministic() {
        let mut world = TerrainWorld::new();
        world
            .add_ground_plane(0.0)
            .add_sphere(Vec3::new(0.3, -0.2, 0.1), 0.5);

        let origin = Vec3::new(0.25, 2.0, 0.0);
        let first = world.probe(origin, Vec3::NEG_Y, 5.0);
        for _ in 0..10 {
            assert_eq!(world.probe(origin, Vec3::NEG_Y, 5.0), first);
        }
    }
}
