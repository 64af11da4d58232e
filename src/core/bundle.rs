//! Structure-of-arrays batch of rays threaded through the tracer.
//!
//! Row `i` of every array refers to the same physical ray for the lifetime of
//! the bundle. Dead rows are never removed; their liveness entry records
//! where and why they died and the accessors return `None` for them.
use super::error::{LensError, Result};
use super::geometry::{Point3f, Vector3f};
use super::numeric::Float;
use std::fmt;

/// Why a ray was retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillReason {
    /// The ray does not meet the surface (complex intersection distance).
    Missed,
    /// The intersection lies behind the ray origin.
    Backward,
    /// The intersection lies on or outside the effective clear aperture.
    Vignetted,
    /// Total internal reflection at a refracting surface.
    TotalInternalReflection
}

impl fmt::Display for KillReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KillReason::Missed => "missed surface",
            KillReason::Backward => "negative distance",
            KillReason::Vignetted => "outside aperture",
            KillReason::TotalInternalReflection => "total internal reflection"
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead { surface: usize, reason: KillReason }
}

impl Liveness {
    #[inline]
    pub fn is_alive(&self) -> bool {
        *self == Liveness::Alive
    }
}

/// Positions and directions of every row at one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSnapshot {
    positions: Vec<Point3f>,
    directions: Vec<Vector3f>,
    alive: Vec<bool>
}

impl InterfaceSnapshot {
    pub(crate) fn capture(positions: &[Point3f], directions: &[Vector3f], liveness: &[Liveness]) -> InterfaceSnapshot {
        InterfaceSnapshot {
            positions: positions.to_vec(),
            directions: directions.to_vec(),
            alive: liveness.iter().map(Liveness::is_alive).collect()
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position and direction of row `i`, `None` when the ray was already dead.
    pub fn get(&self, i: usize) -> Option<(Point3f, Vector3f)> {
        if self.alive[i] {
            Some((self.positions[i], self.directions[i]))
        } else {
            None
        }
    }

    pub fn is_alive(&self, i: usize) -> bool {
        self.alive[i]
    }

    /// Rows alive at this interface, with their index.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, Point3f, Vector3f)> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i).map(|(p, d)| (i, p, d)))
    }
}

#[derive(Debug, Clone)]
pub struct RayBundle {
    pub(crate) origins: Vec<Point3f>,
    pub(crate) directions: Vec<Vector3f>,
    pub(crate) wavelengths: Vec<usize>,
    pub(crate) path_lengths: Vec<Float>,
    pub(crate) liveness: Vec<Liveness>,
    entrance: InterfaceSnapshot,
    middle: Option<InterfaceSnapshot>,
    exit: Option<InterfaceSnapshot>
}

impl RayBundle {
    /// Build a bundle from column arrays of equal length. Directions are
    /// normalized; rows with a zero or non-finite direction start dead.
    pub fn from_parts(
        origins: Vec<Point3f>,
        directions: Vec<Vector3f>,
        wavelengths: Vec<usize>
    ) -> Result<RayBundle> {
        let n = origins.len();
        if directions.len() != n {
            return Err(LensError::BundleLengthMismatch { attribute: "direction", found: directions.len(), expected: n });
        }
        if wavelengths.len() != n {
            return Err(LensError::BundleLengthMismatch { attribute: "wavelength", found: wavelengths.len(), expected: n });
        }
        let mut liveness = vec![Liveness::Alive; n];
        let directions: Vec<Vector3f> = directions.iter().zip(liveness.iter_mut())
            .map(|(d, live)| {
                let len = d.length();
                if len > 0.0 && len.is_finite() {
                    *d / len
                } else {
                    *live = Liveness::Dead { surface: 0, reason: KillReason::Missed };
                    *d
                }
            })
            .collect();
        let entrance = InterfaceSnapshot::capture(&origins, &directions, &liveness);
        Ok(RayBundle {
            origins,
            directions,
            wavelengths,
            path_lengths: vec![0.0; n],
            liveness,
            entrance,
            middle: None,
            exit: None
        })
    }

    /// Every ray at the same wavelength.
    pub fn monochromatic(origins: Vec<Point3f>, directions: Vec<Vector3f>, wavelength: usize) -> Result<RayBundle> {
        let n = origins.len();
        RayBundle::from_parts(origins, directions, vec![wavelength; n])
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn is_alive(&self, i: usize) -> bool {
        self.liveness[i].is_alive()
    }

    pub fn liveness(&self, i: usize) -> Liveness {
        self.liveness[i]
    }

    pub fn live_count(&self) -> usize {
        self.liveness.iter().filter(|l| l.is_alive()).count()
    }

    /// Liveness mask, one entry per row.
    pub fn alive_mask(&self) -> Vec<bool> {
        self.liveness.iter().map(Liveness::is_alive).collect()
    }

    pub fn origin(&self, i: usize) -> Option<Point3f> {
        if self.is_alive(i) { Some(self.origins[i]) } else { None }
    }

    pub fn direction(&self, i: usize) -> Option<Vector3f> {
        if self.is_alive(i) { Some(self.directions[i]) } else { None }
    }

    pub fn wavelength(&self, i: usize) -> usize {
        self.wavelengths[i]
    }

    /// Optical path length accumulated so far. For a dead ray this is the
    /// value reached before the surface that retired it.
    pub fn path_length(&self, i: usize) -> Float {
        self.path_lengths[i]
    }

    pub fn entrance(&self) -> &InterfaceSnapshot {
        &self.entrance
    }

    /// State at the aperture stop, once traced.
    pub fn middle(&self) -> Option<&InterfaceSnapshot> {
        self.middle.as_ref()
    }

    /// State after the last surface, once traced.
    pub fn exit(&self) -> Option<&InterfaceSnapshot> {
        self.exit.as_ref()
    }

    pub(crate) fn record_middle(&mut self) -> Result<()> {
        if self.middle.is_some() {
            return Err(LensError::SnapshotAlreadyRecorded("middle"));
        }
        self.middle = Some(InterfaceSnapshot::capture(&self.origins, &self.directions, &self.liveness));
        Ok(())
    }

    pub(crate) fn record_exit(&mut self) -> Result<()> {
        if self.exit.is_some() {
            return Err(LensError::SnapshotAlreadyRecorded("exit"));
        }
        self.exit = Some(InterfaceSnapshot::capture(&self.origins, &self.directions, &self.liveness));
        Ok(())
    }

    /// True once a trace has populated the snapshots.
    pub fn is_traced(&self) -> bool {
        self.middle.is_some() || self.exit.is_some()
    }
}
