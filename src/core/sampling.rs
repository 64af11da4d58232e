use super::numeric::{Float, consts::{FRAC_PI_2, FRAC_PI_4, PI}};
use super::geometry::Point2f;
use super::rng::Rng;

/// Map a point of the unit square onto the unit disk, preserving relative areas.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // Map uniform random numbers to $[-1,1]^2$
    let offset = Point2f::new(u.x * 2.0 - 1.0, u.y * 2.0 - 1.0);

    // Handle degeneracy at the origin
    if offset.x == 0.0 && offset.y == 0.0 {
        return Point2f::default();
    }

    // Apply concentric mapping to point
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    Point2f::new(theta.cos(), theta.sin()) * r
}

/// Standard normal sample (Box-Muller).
pub fn sample_standard_normal(rng: &mut Rng) -> Float {
    // Keep u1 away from zero so the logarithm stays finite
    let u1 = rng.uniform_float().max(Float::MIN_POSITIVE);
    let u2 = rng.uniform_float();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
