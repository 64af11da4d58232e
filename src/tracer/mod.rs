//! Sequential surface tracer.
//!
//! Rays are propagated from the scene side to the sensor side, one surface at
//! a time. Within a surface every row is independent, so the per-surface
//! update runs row-parallel; the surfaces themselves are strictly ordered.
pub mod refraction;
pub use refraction::*;
pub mod diffraction;
pub use diffraction::*;

use crate::core::bundle::{KillReason, Liveness, RayBundle};
use crate::core::error::{LensError, Result};
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::numeric::Float;
use crate::core::observer::{NullObserver, SurfaceEvent, TraceObserver};
use crate::core::options::LensOptions;
use crate::core::stats_accumulator::StatsAccumulator;
use crate::core::surface::{IndexTable, Surface, SurfaceKind, SurfaceSequence};
use rayon::prelude::*;
use std::ops::Add;

/// Rays retired at one surface, by cause.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KillCounts {
    pub missed: usize,
    pub backward: usize,
    pub vignetted: usize,
    pub total_internal_reflection: usize
}

impl KillCounts {
    fn record(mut self, reason: KillReason) -> KillCounts {
        match reason {
            KillReason::Missed => self.missed += 1,
            KillReason::Backward => self.backward += 1,
            KillReason::Vignetted => self.vignetted += 1,
            KillReason::TotalInternalReflection => self.total_internal_reflection += 1
        }
        self
    }

    pub fn get(&self, reason: KillReason) -> usize {
        match reason {
            KillReason::Missed => self.missed,
            KillReason::Backward => self.backward,
            KillReason::Vignetted => self.vignetted,
            KillReason::TotalInternalReflection => self.total_internal_reflection
        }
    }

    pub fn total(&self) -> usize {
        self.missed + self.backward + self.vignetted + self.total_internal_reflection
    }
}

impl Add for KillCounts {
    type Output = KillCounts;

    fn add(self, o: KillCounts) -> KillCounts {
        KillCounts {
            missed: self.missed + o.missed,
            backward: self.backward + o.backward,
            vignetted: self.vignetted + o.vignetted,
            total_internal_reflection: self.total_internal_reflection + o.total_internal_reflection
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceReport {
    pub surface: usize,
    pub kind: SurfaceKind,
    /// Live rays arriving at the surface.
    pub entering: usize,
    pub killed: KillCounts
}

impl SurfaceReport {
    pub fn surviving(&self) -> usize {
        self.entering - self.killed.total()
    }
}

/// Summary of one trace call.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceReport {
    pub rays: usize,
    pub live_at_start: usize,
    pub surfaces: Vec<SurfaceReport>
}

impl TraceReport {
    pub fn survivors(&self) -> usize {
        self.surfaces.last().map(SurfaceReport::surviving).unwrap_or(self.live_at_start)
    }

    pub fn killed(&self) -> KillCounts {
        self.surfaces.iter().fold(KillCounts::default(), |acc, s| acc + s.killed)
    }

    /// Fraction of the bundle that made it through, 0 for an empty bundle.
    pub fn throughput(&self) -> Float {
        if self.rays == 0 {
            0.0
        } else {
            self.survivors() as Float / self.rays as Float
        }
    }
}

pub struct SequentialTracer<'a> {
    sequence: &'a SurfaceSequence,
    diffraction: Option<BoundaryBending>
}

impl<'a> SequentialTracer<'a> {
    pub fn new(sequence: &'a SurfaceSequence) -> SequentialTracer<'a> {
        SequentialTracer { sequence, diffraction: None }
    }

    /// Tracer configured from the process-wide options.
    pub fn from_options(sequence: &'a SurfaceSequence) -> Result<SequentialTracer<'a>> {
        let options = LensOptions::get();
        let tracer = SequentialTracer::new(sequence);
        if options.diffraction {
            Ok(tracer.with_diffraction(BoundaryBending::new(sequence, options.seed)?))
        } else {
            Ok(tracer)
        }
    }

    pub fn with_diffraction(mut self, hook: BoundaryBending) -> SequentialTracer<'a> {
        self.diffraction = Some(hook);
        self
    }

    pub fn sequence(&self) -> &SurfaceSequence {
        self.sequence
    }

    pub fn trace(&self, bundle: &mut RayBundle) -> Result<TraceReport> {
        self.trace_observed(bundle, &mut NullObserver)
    }

    /// Trace `bundle` in place, notifying `observer` after every surface.
    ///
    /// Configuration problems are reported before any ray moves. Rays that
    /// miss, are clipped or totally internally reflected are retired without
    /// error; a bundle that ends fully dead is a valid result.
    pub fn trace_observed(&self, bundle: &mut RayBundle, observer: &mut dyn TraceObserver) -> Result<TraceReport> {
        let sequence = self.sequence;
        sequence.validate()?;
        self.check_bundle(bundle)?;

        let rays = bundle.len();
        let live_at_start = bundle.live_count();
        let last = sequence.len() - 1;
        let mut previous: IndexTable = sequence.object_indices().iter().copied().collect();
        let mut surfaces = Vec::with_capacity(sequence.len());

        for (k, surface) in sequence.surfaces().iter().enumerate() {
            let before = if observer.enabled() { Some(bundle.origins.clone()) } else { None };
            let entering = bundle.live_count();
            let semi_diameter = sequence.effective_semi_diameter(k);

            let killed = match surface {
                Surface::Spherical(s) => {
                    let current = &s.indices;
                    let prev = &previous;
                    let killed = propagate(bundle, k, |_, o, d, opl, w| {
                        let hit = intersect_spherical(s, o, d)?;
                        if hit.point.radial_squared() >= semi_diameter * semi_diameter {
                            return Err(KillReason::Vignetted);
                        }
                        let eta = prev[w] / current[w];
                        let refracted = refract(d, &hit.normal, eta)
                            .ok_or(KillReason::TotalInternalReflection)?;
                        *opl += hit.t * prev[w];
                        *o = hit.point;
                        *d = refracted;
                        Ok(())
                    });
                    previous = s.indices.clone();
                    killed
                }
                Surface::Stop(s) => {
                    let prev = &previous;
                    let hook = self.diffraction.as_ref();
                    let killed = propagate(bundle, k, |row, o, d, opl, w| {
                        let hit = intersect_plane(s.vertex_z, o, d)?;
                        if hit.point.radial_squared() >= semi_diameter * semi_diameter {
                            return Err(KillReason::Vignetted);
                        }
                        *opl += hit.t * prev[w];
                        *o = hit.point;
                        if let Some(hook) = hook {
                            hook.bend(row, &hit.point, d, w, semi_diameter);
                        }
                        Ok(())
                    });
                    bundle.record_middle()?;
                    killed
                }
            };
            if k == last {
                bundle.record_exit()?;
            }

            trace!("Surface {} ({}): {} rays in, {} killed", k, surface.kind(), entering, killed.total());
            surfaces.push(SurfaceReport {
                surface: k,
                kind: surface.kind(),
                entering,
                killed
            });

            if let Some(before) = before {
                observer.on_surface(&SurfaceEvent {
                    surface_index: k,
                    surface,
                    before: &before,
                    bundle
                });
            }
        }

        let report = TraceReport { rays, live_at_start, surfaces };
        report_stats(&report);
        debug!("Traced {} rays through {} surfaces, {} survived",
            rays, sequence.len(), report.survivors());
        Ok(report)
    }

    fn check_bundle(&self, bundle: &RayBundle) -> Result<()> {
        if bundle.is_traced() {
            return Err(LensError::SnapshotAlreadyRecorded("middle"));
        }
        let count = self.sequence.n_wavelengths();
        if let Some((ray, &index)) = bundle.wavelengths.iter().enumerate()
            .find(|(i, w)| **w >= count && bundle.is_alive(*i))
        {
            return Err(LensError::WavelengthOutOfRange { ray, index, count });
        }
        Ok(())
    }
}

/// Apply `step` to every live row in parallel. A row whose step fails is
/// retired and keeps the state it had before this surface.
fn propagate<F>(bundle: &mut RayBundle, surface: usize, step: F) -> KillCounts
where
F: Fn(usize, &mut Point3f, &mut Vector3f, &mut Float, usize) -> std::result::Result<(), KillReason> + Sync
{
    let RayBundle { origins, directions, wavelengths, path_lengths, liveness, .. } = bundle;
    origins.par_iter_mut()
        .zip(directions.par_iter_mut())
        .zip(path_lengths.par_iter_mut())
        .zip(liveness.par_iter_mut())
        .zip(wavelengths.par_iter())
        .enumerate()
        .filter_map(|(row, ((((o, d), opl), live), &w))| {
            if !live.is_alive() {
                return None;
            }
            // Work on copies so a retired ray is left untouched
            let (mut o2, mut d2, mut opl2) = (*o, *d, *opl);
            match step(row, &mut o2, &mut d2, &mut opl2, w) {
                Ok(()) => {
                    *o = o2;
                    *d = d2;
                    *opl = opl2;
                    None
                }
                Err(reason) => {
                    *live = Liveness::Dead { surface, reason };
                    Some(reason)
                }
            }
        })
        .fold(KillCounts::default, KillCounts::record)
        .reduce(KillCounts::default, |a, b| a + b)
}

fn report_stats(report: &TraceReport) {
    let stats = StatsAccumulator::instance();
    let killed = report.killed();
    stats.report_counter("Tracer/Rays traced", report.rays as i64);
    stats.report_counter("Tracer/Rays outside aperture", killed.vignetted as i64);
    stats.report_counter("Tracer/Rays missing a surface", (killed.missed + killed.backward) as i64);
    stats.report_counter("Tracer/Total internal reflections", killed.total_internal_reflection as i64);
    stats.report_percentage("Tracer/Rays vignetted by lens system",
        (report.live_at_start - report.survivors()) as i64, report.live_at_start as i64);
}

#[cfg(test)]
mod tests;
