use crate::core::error::{LensError, Result};
use crate::core::geometry::Point2f;
use crate::core::numeric::Float;

/// Pupil-plane intersection coordinates indexed by (axis, off-axis sample, ray).
///
/// Axis 0 is x, axis 1 is y; off-axis sources are displaced along y. Rays that
/// did not survive the trace hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PupilSamples {
    n_rays: usize,
    data: Vec<Float>,
    off_axis: Vec<Float>,
    reference_distance: Float
}

impl PupilSamples {
    /// All coordinates start undefined.
    pub fn new(off_axis: Vec<Float>, n_rays: usize, reference_distance: Float) -> PupilSamples {
        let data = vec![Float::NAN; 2 * off_axis.len() * n_rays];
        PupilSamples { n_rays, data, off_axis, reference_distance }
    }

    /// Build from one row of points per off-axis distance. Shorter rows are
    /// padded with undefined points.
    pub fn from_points(off_axis: Vec<Float>, points: &[Vec<Point2f>], reference_distance: Float) -> Result<PupilSamples> {
        if points.len() != off_axis.len() {
            return Err(LensError::InvalidParameter(format!(
                "{} point rows for {} off-axis distances", points.len(), off_axis.len())));
        }
        let n_rays = points.iter().map(Vec::len).max().unwrap_or(0);
        let mut samples = PupilSamples::new(off_axis, n_rays, reference_distance);
        for (s, row) in points.iter().enumerate() {
            for (r, p) in row.iter().enumerate() {
                samples.set(s, r, *p);
            }
        }
        Ok(samples)
    }

    #[inline]
    fn offset(&self, axis: usize, sample: usize, ray: usize) -> usize {
        (axis * self.off_axis.len() + sample) * self.n_rays + ray
    }

    pub fn get(&self, axis: usize, sample: usize, ray: usize) -> Float {
        self.data[self.offset(axis, sample, ray)]
    }

    pub fn point(&self, sample: usize, ray: usize) -> Point2f {
        Point2f::new(self.get(0, sample, ray), self.get(1, sample, ray))
    }

    pub fn set(&mut self, sample: usize, ray: usize, p: Point2f) {
        let x = self.offset(0, sample, ray);
        let y = self.offset(1, sample, ray);
        self.data[x] = p.x;
        self.data[y] = p.y;
    }

    pub fn n_samples(&self) -> usize {
        self.off_axis.len()
    }

    pub fn n_rays(&self) -> usize {
        self.n_rays
    }

    pub fn off_axis(&self) -> &[Float] {
        &self.off_axis
    }

    /// Axial distance from the source plane to the plane the points lie in.
    pub fn reference_distance(&self) -> Float {
        self.reference_distance
    }

    /// Points usable for fitting: finite, and not exactly on the optical axis.
    ///
    /// Points at exactly (0, 0) are dropped as spurious generator output.
    pub fn valid_points(&self, sample: usize) -> impl Iterator<Item = Point2f> + '_ {
        (0..self.n_rays)
            .map(move |r| self.point(sample, r))
            .filter(|p| p.is_finite() && !(p.x == 0.0 && p.y == 0.0))
    }
}
