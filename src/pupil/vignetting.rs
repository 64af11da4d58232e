use super::samples::PupilSamples;
use crate::core::error::{LensError, Result};
use crate::core::geometry::Point2f;
use crate::core::numeric::consts::ENCLOSURE_EPSILON;
use crate::core::numeric::Float;
use crate::core::options::{LensOptions, VignettingParams};
use crate::core::stats_accumulator::StatsAccumulator;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Which edge of the pupil a cutting circle clips. Off-axis sources are
/// displaced along +y, so "bottom" is the -y edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bottom,
    Top
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bottom => "bottom",
            Side::Top => "top"
        }
    }

    /// Direction from the pupil edge toward the circle center.
    #[inline]
    pub fn sign(self) -> Float {
        match self {
            Side::Bottom => 1.0,
            Side::Top => -1.0
        }
    }

    fn extreme<I: Iterator<Item = Float>>(self, values: I) -> Option<Float> {
        match self {
            Side::Bottom => values.fold(None, |m: Option<Float>, v| Some(m.map_or(v, |m| m.min(v)))),
            Side::Top => values.fold(None, |m: Option<Float>, v| Some(m.map_or(v, |m| m.max(v))))
        }
    }
}

impl FromStr for Side {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" => Ok(Side::Bottom),
            "top" => Ok(Side::Top),
            _ => Err(LensError::UnknownSide(s.to_owned()))
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A circle in the reference plane whose center moves linearly with the
/// off-axis distance of the source: `center_y = sensitivity * distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuttingCircle {
    pub side: Side,
    pub radius: Float,
    pub sensitivity: Float,
    /// Trial radii tested before the enclosure condition held.
    pub iterations: usize
}

impl CuttingCircle {
    pub fn center_at(&self, off_axis: Float) -> Float {
        self.sensitivity * off_axis
    }

    pub fn back_project(&self, reference_distance: Float) -> Result<PupilCircle> {
        back_project(self.radius, self.sensitivity, reference_distance)
    }
}

/// A circle at its physical axial position, measured from the source plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilCircle {
    pub radius: Float,
    pub distance: Float,
    pub sensitivity: Float
}

/// Undo the perspective scaling between the reference plane and the plane in
/// which a circle of the given sensitivity is stationary.
pub fn back_project(radius: Float, sensitivity: Float, reference_distance: Float) -> Result<PupilCircle> {
    let scale = 1.0 - sensitivity;
    if scale.abs() < 1e-12 || !scale.is_finite() {
        return Err(LensError::DegenerateSensitivity(sensitivity));
    }
    Ok(PupilCircle {
        radius: radius / scale,
        distance: reference_distance / scale,
        sensitivity
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct VignettingFit {
    pub entrance_pupil_radius: Float,
    pub bottom: CuttingCircle,
    pub top: CuttingCircle,
    pub reference_distance: Float
}

impl VignettingFit {
    /// The entrance pupil followed by the bottom and top circles, each at its
    /// physical position.
    pub fn physical_circles(&self) -> Result<[PupilCircle; 3]> {
        Ok([
            back_project(self.entrance_pupil_radius, 0.0, self.reference_distance)?,
            self.bottom.back_project(self.reference_distance)?,
            self.top.back_project(self.reference_distance)?
        ])
    }
}

struct SampleRow {
    distance: Float,
    vertex: Float,
    points: Vec<Point2f>
}

impl SampleRow {
    fn encloses(&self, center_y: Float, radius: Float) -> bool {
        let center = Point2f::new(0.0, center_y);
        let limit = radius * (1.0 + ENCLOSURE_EPSILON) + ENCLOSURE_EPSILON;
        let limit2 = limit * limit;
        self.points.iter().all(|p| p.distance_squared(&center) <= limit2)
    }
}

#[derive(Debug, Clone)]
pub struct VignettingEstimator {
    params: VignettingParams
}

impl VignettingEstimator {
    pub fn new(params: VignettingParams) -> VignettingEstimator {
        VignettingEstimator { params }
    }

    pub fn from_options() -> VignettingEstimator {
        VignettingEstimator::new(LensOptions::get().vignetting)
    }

    pub fn params(&self) -> &VignettingParams {
        &self.params
    }

    /// Radius of the smallest axis-centered circle holding every valid point
    /// of the zero-height sample.
    pub fn entrance_pupil_radius(&self, samples: &PupilSamples) -> Result<Float> {
        let on_axis = samples.off_axis().iter().position(|&d| d == 0.0)
            .ok_or(LensError::NoPupilSamples("no on-axis sample"))?;
        samples.valid_points(on_axis)
            .map(|p| p.norm())
            .fold(None, |m: Option<Float>, r| Some(m.map_or(r, |m| m.max(r))))
            .ok_or(LensError::NoPupilSamples("no valid on-axis points"))
    }

    /// Grow a circle from the extreme pupil point of every sample until, at
    /// every off-axis distance at once, it encloses all valid points.
    pub fn cutting_circle(&self, samples: &PupilSamples, side: Side) -> Result<CuttingCircle> {
        let step = self.params.step_size;
        if !(step > 0.0) || !step.is_finite() {
            return Err(LensError::InvalidParameter(format!("radius step {} must be positive", step)));
        }
        let margin = side.sign() * self.params.vertex_offset;
        let rows: Vec<SampleRow> = (0..samples.n_samples())
            .filter_map(|s| {
                let points: Vec<Point2f> = samples.valid_points(s).collect();
                let extreme = side.extreme(points.iter().map(|p| p.y))?;
                Some(SampleRow { distance: samples.off_axis()[s], vertex: extreme + margin, points })
            })
            .collect();
        let last = rows.last().ok_or(LensError::NoPupilSamples("no valid points at any off-axis distance"))?;
        if last.distance == 0.0 {
            return Err(LensError::NoPupilSamples("no off-axis sample with valid points"));
        }

        for k in 0..=self.params.max_iterations {
            let radius = k as Float * step;
            let enclosed = rows.par_iter()
                .all(|row| row.encloses(row.vertex + side.sign() * radius, radius));
            if enclosed {
                let center = last.vertex + side.sign() * radius;
                let circle = CuttingCircle {
                    side,
                    radius,
                    sensitivity: center / last.distance,
                    iterations: k
                };
                debug!("{} cutting circle: radius {} sensitivity {} after {} steps",
                    side, circle.radius, circle.sensitivity, k);
                StatsAccumulator::instance().report_counter("Vignetting/Search iterations", k as i64);
                return Ok(circle);
            }
        }
        warn!("{} cutting circle search gave up at radius {}",
            side, self.params.max_iterations as Float * step);
        Err(LensError::SearchExhausted { side: side.as_str(), max_iterations: self.params.max_iterations })
    }

    /// `cutting_circle` with the side given by name.
    pub fn cutting_circle_named(&self, samples: &PupilSamples, side: &str) -> Result<CuttingCircle> {
        self.cutting_circle(samples, side.parse()?)
    }

    pub fn estimate(&self, samples: &PupilSamples) -> Result<VignettingFit> {
        let entrance_pupil_radius = self.entrance_pupil_radius(samples)?;
        let bottom = self.cutting_circle(samples, Side::Bottom)?;
        let top = self.cutting_circle(samples, Side::Top)?;
        info!("Entrance pupil radius {}, bottom ({}, {}), top ({}, {})",
            entrance_pupil_radius, bottom.radius, bottom.sensitivity, top.radius, top.sensitivity);
        Ok(VignettingFit {
            entrance_pupil_radius,
            bottom,
            top,
            reference_distance: samples.reference_distance()
        })
    }
}
