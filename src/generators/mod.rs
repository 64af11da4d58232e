//! Ray bundle generators: turn a light source description into the initial
//! rays of a trace.
pub mod point_source;
pub use point_source::*;
pub mod collimated;
pub use collimated::*;

use crate::core::bundle::RayBundle;
use crate::core::error::Result;
use crate::core::geometry::{Point2f, Point3f};
use crate::core::numeric::Float;
use crate::core::rng::Rng;
use crate::core::sampling::concentric_sample_disk;

pub trait RayGenerator {
    /// Produce `n` rays. The same generator and seed always yield the same bundle.
    fn generate(&self, n: usize, rng: &mut Rng) -> Result<RayBundle>;
}

/// Uniform sample of a disk of `radius` centered on the axis at height `z`.
pub(crate) fn sample_axial_disk(rng: &mut Rng, radius: Float, z: Float) -> Point3f {
    let p = concentric_sample_disk(&Point2f::new(rng.uniform_float(), rng.uniform_float())) * radius;
    Point3f::new(p.x, p.y, z)
}
