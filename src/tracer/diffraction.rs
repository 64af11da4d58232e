//! Simplified edge diffraction at the aperture stop.
//!
//! Rays passing close to the stop edge are bent by a random angle whose
//! spread follows from the uncertainty relation, `atan(lambda / (4 pi d))`
//! with `d` the distance to the edge. The deflection lies in the plane of the
//! ray and the radial direction, the edge normal of a circular stop.
use crate::core::error::{LensError, Result};
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::numeric::{Float, consts::{INV_4_PI, PI}};
use crate::core::rng::Rng;
use crate::core::sampling::sample_standard_normal;
use crate::core::surface::SurfaceSequence;

#[derive(Debug, Clone)]
pub struct BoundaryBending {
    seed: u64,
    wavelengths: Vec<Float>
}

impl BoundaryBending {
    /// Needs the physical wavelength of every index column on the sequence.
    pub fn new(sequence: &SurfaceSequence, seed: u64) -> Result<BoundaryBending> {
        let wavelengths = sequence.wavelengths()
            .ok_or_else(|| LensError::InvalidParameter(
                "boundary bending needs the physical wavelengths of the lens description".into()))?
            .to_vec();
        Ok(BoundaryBending { seed, wavelengths })
    }

    /// Standard deviation of the deflection angle for a ray `edge_distance` from the edge.
    pub fn spread(&self, wavelength: usize, edge_distance: Float) -> Float {
        if edge_distance <= 0.0 {
            return 0.5 * PI;
        }
        (self.wavelengths[wavelength] * INV_4_PI / edge_distance).atan()
    }

    /// Perturb the direction of the ray in `row` that crossed the stop at `p`.
    pub fn bend(&self, row: usize, p: &Point3f, d: &mut Vector3f, wavelength: usize, stop_radius: Float) {
        let mut rng = Rng::for_row(self.seed, row);
        let r = p.x.hypot(p.y);
        let radial = if r > 0.0 {
            Vector3f::new(p.x / r, p.y / r, 0.0)
        } else {
            let phi = 2.0 * PI * rng.uniform_float();
            Vector3f::new(phi.cos(), phi.sin(), 0.0)
        };
        // Component of the edge normal perpendicular to the ray
        let perp = radial - *d * radial.dot(d);
        let perp_len = perp.length();
        if perp_len == 0.0 {
            return;
        }
        let sigma = self.spread(wavelength, stop_radius - r);
        let theta = sigma * sample_standard_normal(&mut rng);
        *d = (*d * theta.cos() + perp * (theta.sin() / perp_len)).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::SurfaceSpec;

    fn sequence() -> SurfaceSequence {
        SurfaceSequence::new(vec![SurfaceSpec::stop(1.0, 2.0)]).unwrap()
            .with_wavelengths(&[550e-6]).unwrap()
    }

    #[test]
    fn requires_wavelengths() {
        let seq = SurfaceSequence::new(vec![SurfaceSpec::stop(1.0, 2.0)]).unwrap();
        assert!(BoundaryBending::new(&seq, 0).is_err());
    }

    #[test]
    fn spread_shrinks_away_from_edge() {
        let hook = BoundaryBending::new(&sequence(), 0).unwrap();
        let near = hook.spread(0, 1e-4);
        let far = hook.spread(0, 1.0);
        assert!(near > far);
        assert!(far < 1e-4);
    }

    #[test]
    fn bending_is_deterministic_and_unit() {
        let hook = BoundaryBending::new(&sequence(), 9).unwrap();
        let p = Point3f::new(1.9999, 0.0, 1.0);
        let mut a = Vector3f::axis();
        let mut b = Vector3f::axis();
        hook.bend(3, &p, &mut a, 0, 2.0);
        hook.bend(3, &p, &mut b, 0, 2.0);
        assert_eq!(a, b);
        assert!((a.length() - 1.0).abs() < 1e-12);
        assert!(a.y.abs() < 1e-12);
        assert!(a.x.abs() > 1e-3, "edge ray was not bent: {}", a);
    }

    #[test]
    fn edge_rays_bend_in_the_radial_plane() {
        let hook = BoundaryBending::new(&sequence(), 5).unwrap();
        let r = 1.9999 / (2.0 as Float).sqrt();
        let p = Point3f::new(r, -r, 1.0);
        let mut bent = 0;
        for row in 0..64 {
            let mut d = Vector3f::axis();
            hook.bend(row, &p, &mut d, 0, 2.0);
            assert!((d.x + d.y).abs() < 1e-12, "row {}: {}", row, d);
            if d.x.abs() > 1e-3 {
                bent += 1;
            }
        }
        assert!(bent >= 60, "only {} of 64 rows bent", bent);
    }
}
