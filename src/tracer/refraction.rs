//! Ray/interface geometry: intersections and vector-form Snell refraction.
use crate::core::bundle::KillReason;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::numeric::{Float, quadratic_root, Root};
use crate::core::surface::SphericalSurface;

/// Where a ray meets an interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the (unit) direction.
    pub t: Float,
    pub point: Point3f,
    /// Surface normal oriented toward the incoming side for rays travelling +z.
    pub normal: Vector3f
}

/// Intersect a ray with the plane `z = plane_z`.
pub fn intersect_plane(plane_z: Float, o: &Point3f, d: &Vector3f) -> Result<Hit, KillReason> {
    if d.z == 0.0 {
        return Err(KillReason::Missed);
    }
    let t = (plane_z - o.z) / d.z;
    if t < 0.0 {
        return Err(KillReason::Backward);
    }
    Ok(Hit {
        t,
        point: *o + *d * t,
        normal: Vector3f::new(0.0, 0.0, -1.0)
    })
}

/// Intersect a ray with a spherical interface.
///
/// The "+" root is taken for a negative radius and the "-" root otherwise,
/// which selects the cap of the sphere that contains the surface vertex.
pub fn intersect_spherical(surface: &SphericalSurface, o: &Point3f, d: &Vector3f) -> Result<Hit, KillReason> {
    if surface.is_flat() {
        return intersect_plane(surface.vertex_z, o, d);
    }
    let radius = surface.radius;
    let center = Point3f::new(0.0, 0.0, surface.center_z());
    let oc = *o - center;
    let a = d.length_squared();
    let b = 2.0 * d.dot(&oc);
    let c = oc.length_squared() - radius * radius;
    let root = if radius < 0.0 { Root::Plus } else { Root::Minus };
    let t = quadratic_root(a, b, c, root).ok_or(KillReason::Missed)?;
    if t < 0.0 {
        return Err(KillReason::Backward);
    }
    let point = *o + *d * t;
    // Outward normal, flipped for negative radii
    let normal = (point - center) / radius;
    Ok(Hit { t, point, normal })
}

/// Refract unit direction `d` at a surface with normal `n` for the index
/// ratio `eta = n_incident / n_transmitted`. Returns `None` on total
/// internal reflection.
pub fn refract(d: &Vector3f, n: &Vector3f, eta: Float) -> Option<Vector3f> {
    let mut n = *n;
    let mut cos_theta_i = -n.dot(d);
    if cos_theta_i < 0.0 {
        // Face the normal toward the incoming ray
        n = -n;
        cos_theta_i = -cos_theta_i;
    }
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let cos2_theta_t = 1.0 - eta * eta * sin2_theta_i;
    if cos2_theta_t < 0.0 {
        return None;
    }
    let wt = *d * eta + n * (eta * cos_theta_i - cos2_theta_t.sqrt());
    Some(wt.normalize())
}
