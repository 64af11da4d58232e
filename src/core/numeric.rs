//! Type definitions and constants.

#[cfg(feature = "float_as_double")]
mod float_mod {
    pub type Float = f64;
    pub mod consts {
        pub use std::f64::consts::*;
    }
}
#[cfg(not(feature = "float_as_double"))]
mod float_mod {
    pub type Float = f32;
    pub mod consts {
        pub use std::f32::consts::*;
    }
}

pub use float_mod::Float;
pub mod consts {
    use super::float_mod::Float;
    pub use super::float_mod::consts::*;
    pub const INV_4_PI: Float = 1.0 / (PI * 4.0);
    /// Relative slack used when testing whether a point lies inside a circle.
    pub const ENCLOSURE_EPSILON: Float = 1e-9;
}

/// Which root of a quadratic to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// `(-b + sqrt(disc)) / 2a`
    Plus,
    /// `(-b - sqrt(disc)) / 2a`
    Minus
}

/// Solve `a t^2 + b t + c = 0` for the requested root.
/// Returns `None` for a negative discriminant (complex roots) or a degenerate `a`.
#[inline]
pub fn quadratic_root(a: Float, b: Float, c: Float, root: Root) -> Option<Float> {
    // Find quadratic discriminant
    let discrim = b as f64 * b as f64 - 4.0 * a as f64 * c as f64;
    if discrim < 0.0 || a == 0.0 {
        return None;
    }
    let root_discrim = discrim.sqrt();

    // Compute via the numerically stable pair, then pick by sign convention
    let q = if b < 0.0 {
        -0.5 * (b as f64 - root_discrim)
    } else {
        -0.5 * (b as f64 + root_discrim)
    };
    let t0 = q / a as f64;
    let t1 = if q != 0.0 { c as f64 / q } else { t0 };
    let (lo, hi) = if t0 > t1 { (t1, t0) } else { (t0, t1) };
    // With a > 0 the "+" root is always the larger one.
    let t = match (root, a > 0.0) {
        (Root::Plus, true) | (Root::Minus, false) => hi,
        (Root::Minus, true) | (Root::Plus, false) => lo
    };
    Some(t as Float)
}
