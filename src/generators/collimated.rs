use super::{sample_axial_disk, RayGenerator};
use crate::core::bundle::RayBundle;
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::numeric::Float;
use crate::core::rng::Rng;

/// Parallel rays starting on a disk in the plane `z = center.z`, as from a
/// source at infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct CollimatedBeam {
    pub center: Point3f,
    pub direction: Vector3f,
    pub radius: Float,
    pub wavelength: usize
}

impl CollimatedBeam {
    pub fn new(center: Point3f, direction: Vector3f, radius: Float, wavelength: usize) -> CollimatedBeam {
        CollimatedBeam { center, direction, radius, wavelength }
    }
}

impl RayGenerator for CollimatedBeam {
    fn generate(&self, n: usize, rng: &mut Rng) -> Result<RayBundle> {
        let origins = (0..n)
            .map(|_| {
                let p = sample_axial_disk(rng, self.radius, self.center.z);
                Point3f::new(p.x + self.center.x, p.y + self.center.y, p.z)
            })
            .collect();
        RayBundle::monochromatic(origins, vec![self.direction; n], self.wavelength)
    }
}
