//! Terrain probing: rays, built-in surfaces and the host-facing query trait.

mod probe;
mod ray;
mod surface;
mod world;

pub use probe::{GroundQuery, ProbeResult};
pub use ray::{Ray, RayHit};
pub use surface::Surface;
pub use world::TerrainWorld;
