use glam::Vec3;

use super::probe::GroundQuery;
use super::ray::{Ray, RayHit};
use super::surface::Surface;

/// A static snapshot of walkable surfaces.
#[derive(Debug, Default, Clone)]
pub struct TerrainWorld {
    surfaces: Vec<Surface>,
}

impl TerrainWorld {
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }

    pub fn add(&mut self, surface: Surface) -> &mut Self {
        self.surfaces.push(surface);
        self
    }

    pub fn add_ground_plane(&mut self, height: f32) -> &mut Self {
        self.add(Surface::plane(Vec3::new(0.0, height, 0.0), Vec3::Y))
    }

    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> &mut Self {
        self.add(Surface::from_center_half_extents(center, half_extents))
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32) -> &mut Self {
        self.add(Surface::sphere(center, radius))
    }

    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) -> &mut Self {
        self.add(Surface::triangle(a, b, c))
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Closest hit along the ray. On equal distance the surface added first wins.
    pub fn raycast_indexed(&self, ray: &Ray) -> Option<(usize, RayHit)> {
        let mut closest: Option<(usize, RayHit)> = None;

        for (i, surface) in self.surfaces.iter().enumerate() {
            if let Some(hit) = surface.ray_intersect(ray) {
                match &closest {
                    None => closest = Some((i, hit)),
                    Some((_, prev_hit)) if hit.t < prev_hit.t => {
                        closest = Some((i, hit));
                    }
                    _ => {}
                }
            }
        }

        closest
    }
}

impl GroundQuery for TerrainWorld {
    fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        self.raycast_indexed(ray).map(|(_, hit)| hit)
    }
}
