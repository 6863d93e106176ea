use glam::Vec3;

use super::ray::{Ray, RayHit};

const EPSILON: f32 = 0.0001;

/// Walkable geometry known to [`TerrainWorld`](super::TerrainWorld).
///
/// The set is closed, so intersection dispatches through a `match` instead of
/// a trait object per surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// Infinite plane through `point`.
    Plane { point: Vec3, normal: Vec3 },
    Aabb { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
    /// Two-sided triangle, handy for ramps.
    Triangle { a: Vec3, b: Vec3, c: Vec3 },
}

impl Surface {
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Surface::Plane {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    pub fn aabb(min: Vec3, max: Vec3) -> Self {
        Surface::Aabb {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::aabb(center - half_extents.abs(), center + half_extents.abs())
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Surface::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    pub fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Surface::Triangle { a, b, c }
    }

    pub fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        if ray.is_empty() {
            return None;
        }
        match *self {
            Surface::Plane { point, normal } => intersect_plane(ray, point, normal),
            Surface::Aabb { min, max } => intersect_aabb(ray, min, max),
            Surface::Sphere { center, radius } => intersect_sphere(ray, center, radius),
            Surface::Triangle { a, b, c } => intersect_triangle(ray, a, b, c),
        }
    }
}

fn facing(normal: Vec3, ray: &Ray) -> Vec3 {
    if normal.dot(ray.direction) > 0.0 {
        -normal
    } else {
        normal
    }
}

fn intersect_plane(ray: &Ray, point: Vec3, normal: Vec3) -> Option<RayHit> {
    let denom = normal.dot(ray.direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    if !ray.accepts(t) {
        return None;
    }
    Some(RayHit {
        t,
        point: ray.at(t),
        normal: facing(normal, ray),
    })
}

fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<RayHit> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    [-b - sqrt_d, -b + sqrt_d]
        .into_iter()
        .find(|&t| ray.accepts(t))
        .map(|t| {
            let point = ray.at(t);
            RayHit {
                t,
                point,
                normal: (point - center).normalize_or_zero(),
            }
        })
}

fn intersect_aabb(ray: &Ray, min: Vec3, max: Vec3) -> Option<RayHit> {
    let inv = |d: f32| if d.abs() > EPSILON { 1.0 / d } else { f32::MAX };
    let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

    let t1 = (min - ray.origin) * inv_dir;
    let t2 = (max - ray.origin) * inv_dir;

    let t_near = t1.min(t2).max_element();
    let t_far = t1.max(t2).min_element();

    if t_near > t_far || t_far < ray.t_min {
        return None;
    }

    let t = if t_near >= ray.t_min { t_near } else { t_far };
    if t > ray.t_max {
        return None;
    }

    let point = ray.at(t);
    Some(RayHit {
        t,
        point,
        normal: aabb_normal(min, max, point),
    })
}

fn aabb_normal(min: Vec3, max: Vec3, point: Vec3) -> Vec3 {
    let center = (min + max) * 0.5;
    let half_extents = (max - min) * 0.5;
    let p = (point - center) / half_extents.max(Vec3::splat(EPSILON));

    let abs_p = p.abs();
    if abs_p.x > abs_p.y && abs_p.x > abs_p.z {
        Vec3::X * p.x.signum()
    } else if abs_p.y >= abs_p.z {
        Vec3::Y * p.y.signum()
    } else {
        Vec3::Z * p.z.signum()
    }
}

fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<RayHit> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if !ray.accepts(t) {
        return None;
    }

    let normal = edge1.cross(edge2).normalize_or_zero();
    Some(RayHit {
        t,
        point: ray.at(t),
        normal: facing(normal, ray),
    })
}
