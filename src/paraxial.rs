//! Thick-lens (black box) model of a surface sequence, used to seed the
//! film position.
use crate::core::bundle::RayBundle;
use crate::core::error::{LensError, Result};
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::numeric::Float;
use crate::core::surface::SurfaceSequence;
use crate::tracer::SequentialTracer;

/// Focal point and principal plane on one side of the lens, as axial positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardinalPoints {
    pub principal_z: Float,
    pub focal_z: Float
}

/// Intersections of the exit ray with the axis (focal point) and with the
/// height of the entering ray (principal plane).
fn compute_cardinal_points(height: Float, o: &Point3f, d: &Vector3f) -> Option<CardinalPoints> {
    if d.y == 0.0 || !d.y.is_finite() {
        return None;
    }
    let tf = -o.y / d.y;
    let tp = (height - o.y) / d.y;
    Some(CardinalPoints {
        principal_z: o.z + d.z * tp,
        focal_z: o.z + d.z * tf
    })
}

/// Trace one ray parallel to the axis at `height` and return the cardinal
/// points behind the last surface, `None` if the ray does not emerge or
/// emerges parallel.
fn trace_parallel(sequence: &SurfaceSequence, wavelength: usize, height: Float) -> Result<Option<CardinalPoints>> {
    let origin = Point3f::new(0.0, height, sequence.front_z() - 1.0);
    let mut bundle = RayBundle::monochromatic(vec![origin], vec![Vector3f::new(0.0, 0.0, 1.0)], wavelength)?;
    SequentialTracer::new(sequence).trace(&mut bundle)?;
    Ok(match (bundle.origin(0), bundle.direction(0)) {
        (Some(o), Some(d)) => compute_cardinal_points(height, &o, &d),
        _ => None
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusModel {
    pub front: CardinalPoints,
    pub rear: CardinalPoints,
    pub effective_focal_length: Float,
    pub object_index: Float,
    pub image_index: Float
}

impl FocusModel {
    /// Build the model for one wavelength with uniform object and image media.
    pub fn build(sequence: &SurfaceSequence, wavelength: usize, object_index: Float, image_index: Float) -> Result<FocusModel> {
        let media = sequence.with_media(object_index, image_index);
        let height = 1e-3 * (0..media.len())
            .map(|i| media.effective_semi_diameter(i))
            .fold(Float::INFINITY, Float::min);

        let rear = trace_parallel(&media, wavelength, height)?
            .ok_or(LensError::ParaxialTraceFailed("rear"))?;
        let mirrored = trace_parallel(&media.reversed(), wavelength, height)?
            .ok_or(LensError::ParaxialTraceFailed("front"))?;
        let front = CardinalPoints {
            principal_z: -mirrored.principal_z,
            focal_z: -mirrored.focal_z
        };

        let effective_focal_length = (rear.focal_z - rear.principal_z) / image_index;
        info!("Cardinal points: p' = {} f' = {}, p = {} f = {}.",
            rear.principal_z, rear.focal_z, front.principal_z, front.focal_z);
        info!("Effective focal length {}", effective_focal_length);
        Ok(FocusModel { front, rear, effective_focal_length, object_index, image_index })
    }

    /// Axial position of the image of a point at `object_z`, from the Gaussian
    /// imaging equation. `None` when the image is virtual (or at infinity).
    pub fn image_position(&self, object_z: Float) -> Option<Float> {
        let s = self.front.principal_z - object_z;
        let vergence = if s.is_infinite() { 0.0 } else { self.object_index / s };
        let denominator = 1.0 / self.effective_focal_length - vergence;
        if !(denominator > 0.0) {
            return None;
        }
        Some(self.rear.principal_z + self.image_index / denominator)
    }

    /// Distance from the last surface to the image of a point at `object_z`.
    pub fn film_distance(&self, sequence: &SurfaceSequence, object_z: Float) -> Option<Float> {
        self.image_position(object_z).map(|z| z - sequence.rear_z())
    }

    pub fn back_focal_distance(&self, sequence: &SurfaceSequence) -> Float {
        self.rear.focal_z - sequence.rear_z()
    }
}
