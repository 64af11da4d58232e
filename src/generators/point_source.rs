use super::{sample_axial_disk, RayGenerator};
use crate::core::bundle::RayBundle;
use crate::core::error::{LensError, Result};
use crate::core::geometry::Point3f;
use crate::core::numeric::Float;
use crate::core::rng::Rng;
use crate::core::surface::SurfaceSequence;

/// Rays leaving a point and aimed at uniformly distributed points of a disk
/// centered on the optical axis (usually the front element).
#[derive(Debug, Clone, PartialEq)]
pub struct PointSource {
    pub position: Point3f,
    pub target_z: Float,
    pub target_radius: Float,
    pub wavelength: usize
}

impl PointSource {
    pub fn new(position: Point3f, target_z: Float, target_radius: Float, wavelength: usize) -> PointSource {
        PointSource { position, target_z, target_radius, wavelength }
    }

    /// Source aimed at the clear aperture of the first surface of `sequence`.
    pub fn toward_front(position: Point3f, sequence: &SurfaceSequence, wavelength: usize) -> PointSource {
        PointSource::new(position, sequence.front_z(), sequence.effective_semi_diameter(0), wavelength)
    }
}

impl RayGenerator for PointSource {
    fn generate(&self, n: usize, rng: &mut Rng) -> Result<RayBundle> {
        if self.target_z == self.position.z {
            return Err(LensError::InvalidParameter(
                "point source lies in its own target plane".into()));
        }
        let targets: Vec<Point3f> = (0..n)
            .map(|_| sample_axial_disk(rng, self.target_radius, self.target_z))
            .collect();
        let directions = targets.iter().map(|t| *t - self.position).collect();
        RayBundle::monochromatic(vec![self.position; n], directions, self.wavelength)
    }
}
