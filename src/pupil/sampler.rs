use super::samples::PupilSamples;
use crate::core::error::{LensError, Result};
use crate::core::geometry::{Point2f, Point3f};
use crate::core::numeric::Float;
use crate::core::rng::Rng;
use crate::generators::{PointSource, RayGenerator};
use crate::tracer::SequentialTracer;
use rayon::prelude::*;

/// Traces a point source at several off-axis heights and records where each
/// ray that got through the lens crossed a reference plane in object space.
pub struct PupilSampler<'t, 'a> {
    tracer: &'t SequentialTracer<'a>,
    source_z: Float,
    reference_z: Float,
    rays_per_sample: usize,
    wavelength: usize,
    seed: u64
}

impl<'t, 'a> PupilSampler<'t, 'a> {
    /// `source_z` is the object plane, `reference_z` the plane the entrance
    /// rays are projected onto. Both are in the lens frame.
    pub fn new(tracer: &'t SequentialTracer<'a>, source_z: Float, reference_z: Float) -> Result<PupilSampler<'t, 'a>> {
        let front = tracer.sequence().front_z();
        if !(source_z < front) {
            return Err(LensError::InvalidParameter(format!(
                "source plane {} must lie in front of the first surface at {}", source_z, front)));
        }
        if reference_z == source_z {
            return Err(LensError::InvalidParameter("reference plane coincides with the source plane".into()));
        }
        Ok(PupilSampler {
            tracer,
            source_z,
            reference_z,
            rays_per_sample: 2048,
            wavelength: 0,
            seed: 0
        })
    }

    pub fn with_rays(mut self, rays_per_sample: usize) -> PupilSampler<'t, 'a> {
        self.rays_per_sample = rays_per_sample;
        self
    }

    pub fn with_wavelength(mut self, wavelength: usize) -> PupilSampler<'t, 'a> {
        self.wavelength = wavelength;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> PupilSampler<'t, 'a> {
        self.seed = seed;
        self
    }

    /// Lens-frame axial position of a plane `distance` away from the source.
    pub fn lens_z(&self, distance: Float) -> Float {
        self.source_z + distance
    }

    /// One traced bundle per height, in parallel. Heights are off-axis
    /// distances along +y; rays that die leave undefined points.
    pub fn sample(&self, heights: &[Float]) -> Result<PupilSamples> {
        let sequence = self.tracer.sequence();
        let rows = heights.par_iter()
            .enumerate()
            .map(|(k, &h)| -> Result<Vec<Point2f>> {
                let mut rng = Rng::new(self.seed.wrapping_add(k as u64));
                let source = PointSource::toward_front(Point3f::new(0.0, h, self.source_z), sequence, self.wavelength);
                let mut bundle = source.generate(self.rays_per_sample, &mut rng)?;
                let report = self.tracer.trace(&mut bundle)?;
                debug!("Pupil sample at height {}: {} of {} rays survived", h, report.survivors(), report.rays);
                let entrance = bundle.entrance();
                Ok((0..bundle.len())
                    .map(|i| match entrance.get(i) {
                        Some((o, d)) if bundle.is_alive(i) && d.z != 0.0 => {
                            let t = (self.reference_z - o.z) / d.z;
                            (o + d * t).xy()
                        }
                        _ => Point2f::new(Float::NAN, Float::NAN)
                    })
                    .collect())
            })
            .collect::<Result<Vec<_>>>()?;
        PupilSamples::from_points(heights.to_vec(), &rows, self.reference_z - self.source_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::{SurfaceSequence, SurfaceSpec};
    use crate::pupil::VignettingEstimator;
    use crate::core::options::VignettingParams;

    fn stop_only(semi: Float) -> SurfaceSequence {
        SurfaceSequence::new(vec![
            SurfaceSpec::spherical(Float::INFINITY, 0.0, 3.0, &[1.0]),
            SurfaceSpec::stop(10.0, semi),
            SurfaceSpec::spherical(Float::INFINITY, 5.0, 20.0, &[1.0])
        ]).unwrap()
    }

    #[test]
    fn bare_stop_is_the_pupil() {
        let seq = stop_only(2.0);
        let tracer = SequentialTracer::new(&seq);
        let sampler = PupilSampler::new(&tracer, -100.0, 10.0).unwrap().with_rays(4000).with_seed(3);
        let samples = sampler.sample(&[0.0, 5.0]).unwrap();
        assert_eq!(samples.n_samples(), 2);
        assert!((samples.reference_distance() - 110.0).abs() < 1e-12);

        let estimator = VignettingEstimator::new(VignettingParams::default());
        let radius = estimator.entrance_pupil_radius(&samples).unwrap();
        assert!(radius < 2.0 && radius > 1.9, "{}", radius);
        for s in 0..2 {
            for p in samples.valid_points(s) {
                assert!(p.x * p.x + p.y * p.y < 4.0 + 1e-9);
            }
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        let seq = stop_only(2.0);
        let tracer = SequentialTracer::new(&seq);
        let sampler = PupilSampler::new(&tracer, -50.0, 10.0).unwrap().with_rays(64).with_seed(9);
        let a = sampler.sample(&[0.0, 1.0, 2.0]).unwrap();
        let b = sampler.sample(&[0.0, 1.0, 2.0]).unwrap();
        for s in 0..3 {
            let pa: Vec<Point2f> = a.valid_points(s).collect();
            let pb: Vec<Point2f> = b.valid_points(s).collect();
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn source_behind_front_surface_is_rejected() {
        let seq = stop_only(2.0);
        let tracer = SequentialTracer::new(&seq);
        assert!(PupilSampler::new(&tracer, 1.0, 10.0).is_err());
    }
}
