use super::*;
use crate::core::geometry::{Point2f, Point3f, Vector3f};
use crate::core::observer::SegmentRecorder;
use crate::core::numeric::consts::PI;
use crate::core::rng::Rng;
use crate::core::sampling::concentric_sample_disk;
use crate::core::surface::{ApertureStop, SurfaceSpec};
use crate::generators::{CollimatedBeam, RayGenerator};

const EPS: Float = 1e-9;

fn fan(heights: &[Float], slope: Float) -> RayBundle {
    let origins = heights.iter().map(|&h| Point3f::new(h, 0.5 * h, 0.0)).collect();
    let directions = heights.iter().map(|_| Vector3f::new(slope, -0.5 * slope, 1.0)).collect();
    RayBundle::monochromatic(origins, directions, 0).unwrap()
}

#[test]
fn flat_surface_with_matched_indices_translates_rays() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(Float::INFINITY, 10.0, 20.0, &[1.0]),
        SurfaceSpec::stop(5.0, 20.0),
    ]).unwrap();
    let mut bundle = fan(&[-3.0, -1.0, 0.0, 2.0, 4.0], 0.1);
    let before: Vec<Vector3f> = (0..bundle.len()).map(|i| bundle.direction(i).unwrap()).collect();
    SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    assert_eq!(bundle.live_count(), 5);
    let middle = bundle.middle().unwrap();
    for i in 0..bundle.len() {
        let d = bundle.direction(i).unwrap();
        assert!((d - before[i]).length() < EPS);
        let (p, _) = middle.get(i).unwrap();
        assert!((p.z - 15.0).abs() < EPS);
        let o = bundle.entrance().get(i).unwrap().0;
        // Pure translation along the original direction
        let expected = o + before[i] * ((15.0 - o.z) / before[i].z);
        assert!(p.distance(&expected) < EPS);
    }
}

#[test]
fn equal_indices_do_not_bend_at_a_sphere() {
    for &radius in &[30.0, -30.0] {
        let seq = SurfaceSequence::new(vec![
            SurfaceSpec::spherical(radius, 10.0, 15.0, &[1.0]),
            SurfaceSpec::stop(5.0, 15.0),
        ]).unwrap();
        let mut bundle = fan(&[-5.0, -2.0, 0.0, 1.0, 6.0], -0.05);
        let before: Vec<Vector3f> = (0..bundle.len()).map(|i| bundle.direction(i).unwrap()).collect();
        SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
        for i in 0..bundle.len() {
            if let Some(d) = bundle.direction(i) {
                assert!((d - before[i]).length() < EPS, "radius {} row {}", radius, i);
            }
        }
        assert!(bundle.live_count() > 0);
    }
}

#[test]
fn aperture_boundary_is_exclusive() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(Float::INFINITY, 10.0, 2.0, &[1.5]),
        SurfaceSpec::stop(5.0, 20.0),
    ]).unwrap();
    let origins = vec![
        Point3f::new(2.0, 0.0, 0.0),
        Point3f::new(0.0, -2.0, 0.0),
        Point3f::new(1.999, 0.0, 0.0),
    ];
    let mut bundle = RayBundle::monochromatic(origins, vec![Vector3f::axis(); 3], 0).unwrap();
    let report = SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    assert_eq!(bundle.liveness(0), Liveness::Dead { surface: 0, reason: KillReason::Vignetted });
    assert_eq!(bundle.liveness(1), Liveness::Dead { surface: 0, reason: KillReason::Vignetted });
    assert!(bundle.is_alive(2));
    assert_eq!(report.surfaces[0].killed.vignetted, 2);
    assert_eq!(report.survivors(), 1);
}

#[test]
fn path_length_accumulates_and_survives_death() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(Float::INFINITY, 10.0, 5.0, &[1.5]),
        SurfaceSpec::stop(5.0, 1.0),
    ]).unwrap();
    let origins = vec![Point3f::new(0.5, 0.0, 0.0), Point3f::new(2.0, 0.0, 0.0)];
    let mut bundle = RayBundle::monochromatic(origins, vec![Vector3f::axis(); 2], 0).unwrap();
    SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    assert!(bundle.is_alive(0));
    assert!((bundle.path_length(0) - (10.0 + 5.0 * 1.5)).abs() < EPS);
    assert_eq!(bundle.liveness(1), Liveness::Dead { surface: 1, reason: KillReason::Vignetted });
    assert!((bundle.path_length(1) - 10.0).abs() < EPS);
    assert_eq!(bundle.origin(1), None);
}

#[test]
fn path_length_matches_recorded_segments() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(40.0, 5.0, 12.0, &[1.6]),
        SurfaceSpec::spherical(-60.0, 4.0, 12.0, &[1.0]),
        SurfaceSpec::stop(6.0, 8.0),
        SurfaceSpec::spherical(25.0, 3.0, 10.0, &[1.5]),
    ]).unwrap();
    let mut rng = Rng::new(4);
    let mut bundle = CollimatedBeam::new(Point3f::zero(), Vector3f::new(0.02, 0.0, 1.0), 6.0, 0)
        .generate(200, &mut rng).unwrap();
    let mut recorder = SegmentRecorder::new();
    SequentialTracer::new(&seq).trace_observed(&mut bundle, &mut recorder).unwrap();
    let (media, _) = seq.media();
    assert!(bundle.live_count() > 0);
    for i in 0..bundle.len() {
        if !bundle.is_alive(i) {
            continue;
        }
        let path = recorder.path(i);
        assert_eq!(path.len(), seq.len());
        let expected: Float = path.iter()
            .map(|s| s.start.distance(&s.end) * media[s.surface][0])
            .sum();
        assert!((bundle.path_length(i) - expected).abs() < 1e-7);
    }
}

#[test]
fn middle_snapshot_is_written_once() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(50.0, 5.0, 10.0, &[1.5]),
        SurfaceSpec::stop(5.0, 10.0),
    ]).unwrap();
    let mut bundle = fan(&[0.0, 1.0], 0.0);
    let tracer = SequentialTracer::new(&seq);
    tracer.trace(&mut bundle).unwrap();
    assert!(bundle.middle().is_some());
    assert!(bundle.exit().is_some());
    let origins: Vec<Option<Point3f>> = (0..2).map(|i| bundle.origin(i)).collect();
    let err = tracer.trace(&mut bundle);
    assert!(matches!(err, Err(LensError::SnapshotAlreadyRecorded(_))));
    let after: Vec<Option<Point3f>> = (0..2).map(|i| bundle.origin(i)).collect();
    assert_eq!(origins, after);
}

#[test]
fn two_stops_fail_before_propagation() {
    let stop = |z: Float| Surface::Stop(ApertureStop { vertex_z: z, offset: 1.0, semi_diameter: 5.0 });
    let result = SurfaceSequence::from_surfaces(vec![stop(1.0), stop(2.0)]);
    assert!(matches!(result, Err(LensError::MultipleApertureStops { count: 2 })));
}

#[test]
fn wavelength_out_of_range_is_rejected() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(50.0, 5.0, 10.0, &[1.5, 1.6]),
        SurfaceSpec::stop(5.0, 10.0),
    ]).unwrap();
    let mut bundle = RayBundle::from_parts(
        vec![Point3f::zero(); 2], vec![Vector3f::axis(); 2], vec![1, 2]).unwrap();
    let err = SequentialTracer::new(&seq).trace(&mut bundle);
    assert!(matches!(err, Err(LensError::WavelengthOutOfRange { ray: 1, index: 2, count: 2 })));
    assert!(!bundle.is_traced());
    assert_eq!(bundle.path_length(0), 0.0);
}

#[test]
fn dispersion_separates_wavelengths() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(30.0, 5.0, 10.0, &[1.5, 1.6]),
        SurfaceSpec::stop(5.0, 10.0),
    ]).unwrap();
    let origin = Point3f::new(3.0, 0.0, 0.0);
    let mut bundle = RayBundle::from_parts(
        vec![origin, origin], vec![Vector3f::axis(); 2], vec![0, 1]).unwrap();
    SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    let d0 = bundle.direction(0).unwrap();
    let d1 = bundle.direction(1).unwrap();
    // The denser medium bends harder toward the axis
    assert!(d1.x < d0.x);
    assert!(d0.x < 0.0);
}

#[test]
fn total_internal_reflection_retires_ray() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(Float::INFINITY, 5.0, 50.0, &[1.0]),
        SurfaceSpec::stop(5.0, 50.0),
    ]).unwrap()
        .with_object_indices(&[1.5]).unwrap();
    let steep = Vector3f::new(0.8, 0.0, 0.6);
    let mut bundle = RayBundle::monochromatic(
        vec![Point3f::zero(), Point3f::zero()], vec![steep, Vector3f::axis()], 0).unwrap();
    let report = SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    assert_eq!(bundle.liveness(0), Liveness::Dead { surface: 0, reason: KillReason::TotalInternalReflection });
    assert!(bundle.is_alive(1));
    assert_eq!(report.killed().total_internal_reflection, 1);
}

#[test]
fn stop_smaller_than_footprint_round_trip() {
    let (radius, index, gap, stop_radius, beam_radius) = (100.0, 1.5, 10.0, 3.0, 5.0);
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(radius, 10.0, 10.0, &[index]),
        SurfaceSpec::stop(gap, stop_radius),
    ]).unwrap();
    let mut rng = Rng::new(1234);
    let n = 1000;
    let origins: Vec<Point3f> = (0..n).map(|_| {
        let p = concentric_sample_disk(&Point2f::new(rng.uniform_float(), rng.uniform_float())) * beam_radius;
        Point3f::new(p.x, p.y, 0.0)
    }).collect();
    let mut bundle = RayBundle::monochromatic(origins, vec![Vector3f::axis(); n], 0).unwrap();
    let report = SequentialTracer::new(&seq).trace(&mut bundle).unwrap();

    // Paraxial footprint of the beam at the stop
    let power = (index - 1.0) / radius;
    let footprint = beam_radius * (1.0 - gap * power / index);
    let expected = (stop_radius / footprint).powi(2);
    let fraction = bundle.live_count() as Float / n as Float;
    assert!((fraction - expected).abs() < 0.06, "fraction {} expected {}", fraction, expected);
    assert_eq!(report.survivors(), bundle.live_count());

    let exit = bundle.exit().unwrap();
    for (_, p, _) in exit.iter_live() {
        assert!(p.radial_squared().sqrt() < stop_radius);
    }
}

#[test]
fn all_dead_bundle_is_not_an_error() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(50.0, 5.0, 10.0, &[1.5]),
        SurfaceSpec::stop(5.0, 10.0),
        SurfaceSpec::spherical(-50.0, 5.0, 10.0, &[1.0]),
    ]).unwrap();
    let origins = (0..16).map(|i| Point3f::new(100.0 + i as Float, 0.0, 0.0)).collect();
    let mut bundle = RayBundle::monochromatic(origins, vec![Vector3f::axis(); 16], 0).unwrap();
    let report = SequentialTracer::new(&seq).trace(&mut bundle).unwrap();
    assert_eq!(bundle.live_count(), 0);
    assert_eq!(report.survivors(), 0);
    assert_eq!(report.throughput(), 0.0);
    assert!(bundle.exit().unwrap().iter_live().next().is_none());
}

#[test]
fn observer_sees_every_surface() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::spherical(50.0, 5.0, 10.0, &[1.5]),
        SurfaceSpec::stop(5.0, 10.0),
        SurfaceSpec::spherical(-50.0, 5.0, 10.0, &[1.0]),
    ]).unwrap();
    let mut bundle = fan(&[0.0, 1.0, 2.0], 0.0);
    let mut recorder = SegmentRecorder::new();
    SequentialTracer::new(&seq).trace_observed(&mut bundle, &mut recorder).unwrap();
    assert_eq!(recorder.segments.len(), 9);
    let path = recorder.path(2);
    assert_eq!(path[0].start, Point3f::new(2.0, 1.0, 0.0));
    for pair in path.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test]
fn diffraction_hook_bends_edge_rays_radially() {
    let seq = SurfaceSequence::new(vec![
        SurfaceSpec::stop(5.0, 1.0),
    ]).unwrap()
        .with_wavelengths(&[550e-6]).unwrap();
    let n = 32;
    let mut origins: Vec<Point3f> = (0..n)
        .map(|k| {
            let phi = 2.0 * PI * k as Float / n as Float;
            Point3f::new(0.9999 * phi.cos(), 0.9999 * phi.sin(), 0.0)
        })
        .collect();
    origins.push(Point3f::zero());
    let mut plain = RayBundle::monochromatic(origins.clone(), vec![Vector3f::axis(); n + 1], 0).unwrap();
    let mut bent = RayBundle::monochromatic(origins.clone(), vec![Vector3f::axis(); n + 1], 0).unwrap();
    SequentialTracer::new(&seq).trace(&mut plain).unwrap();
    SequentialTracer::new(&seq)
        .with_diffraction(BoundaryBending::new(&seq, 17).unwrap())
        .trace(&mut bent).unwrap();

    let mut deflected = 0;
    for i in 0..n {
        assert_eq!(plain.direction(i), Some(Vector3f::axis()));
        assert_eq!(plain.origin(i), bent.origin(i));
        let d = bent.direction(i).unwrap();
        let o = origins[i];
        assert!((d.length() - 1.0).abs() < EPS);
        // Deflection stays in the plane of the axis and the radial direction
        assert!((d.x * o.y - d.y * o.x).abs() < EPS, "row {} left the radial plane: {}", i, d);
        if d.x.hypot(d.y) > 1e-3 {
            deflected += 1;
        }
    }
    assert!(deflected >= n - 2, "only {} of {} edge rays were bent", deflected, n);
    // Far from the edge the spread is negligible
    let center = bent.direction(n).unwrap();
    assert!((center - Vector3f::axis()).length() < 1e-3);
}

#[test]
fn repeated_traces_keep_the_stats_queue_bounded() {
    use crate::core::stats_accumulator::PENDING_LIMIT;
    let seq = SurfaceSequence::new(vec![SurfaceSpec::stop(1.0, 2.0)]).unwrap();
    let tracer = SequentialTracer::new(&seq);
    for _ in 0..10_000 {
        let mut bundle = RayBundle::monochromatic(vec![Point3f::zero()], vec![Vector3f::axis()], 0).unwrap();
        tracer.trace(&mut bundle).unwrap();
    }
    assert!(StatsAccumulator::instance().pending() < 2 * PENDING_LIMIT);
}
