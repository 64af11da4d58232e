//! Hooks for watching a trace surface by surface, e.g. to draw ray paths.
use super::bundle::RayBundle;
use super::geometry::Point3f;
use super::surface::Surface;

/// State handed to an observer after a surface has been processed.
pub struct SurfaceEvent<'a> {
    pub surface_index: usize,
    pub surface: &'a Surface,
    /// Ray origins before this surface, row aligned with `bundle`.
    pub before: &'a [Point3f],
    pub bundle: &'a RayBundle
}

impl<'a> SurfaceEvent<'a> {
    /// Segments `(start, end)` of the rows that reached this surface alive.
    pub fn segments(&self) -> impl Iterator<Item = (usize, Point3f, Point3f)> + '_ {
        (0..self.before.len())
            .filter_map(move |i| self.bundle.origin(i).map(|end| (i, self.before[i], end)))
    }
}

pub trait TraceObserver {
    /// When false the tracer skips copying ray origins before each surface.
    fn enabled(&self) -> bool {
        true
    }

    fn on_surface(&mut self, event: &SurfaceEvent<'_>);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TraceObserver for NullObserver {
    fn enabled(&self) -> bool {
        false
    }

    fn on_surface(&mut self, _event: &SurfaceEvent<'_>) {}
}

/// A single straight piece of a ray path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegment {
    pub ray: usize,
    pub surface: usize,
    pub start: Point3f,
    pub end: Point3f
}

/// Collects every segment endpoint, in trace order.
#[derive(Debug, Default, Clone)]
pub struct SegmentRecorder {
    pub segments: Vec<RaySegment>
}

impl SegmentRecorder {
    pub fn new() -> SegmentRecorder {
        SegmentRecorder::default()
    }

    /// Segments of one ray, ordered from scene to sensor.
    pub fn path(&self, ray: usize) -> Vec<RaySegment> {
        self.segments.iter().filter(|s| s.ray == ray).copied().collect()
    }
}

impl TraceObserver for SegmentRecorder {
    fn on_surface(&mut self, event: &SurfaceEvent<'_>) {
        let surface = event.surface_index;
        self.segments.extend(event.segments()
            .map(|(ray, start, end)| RaySegment { ray, surface, start, end }));
    }
}
