use super::tabular::{parse_number, parse_record, Record};
use super::*;
use crate::core::surface::Surface;
use std::io::Write;

const DOUBLET: &str = "\
# simple doublet
wavelengths 486.1 587.6 656.3
diaphragm 8
object_medium 1.0 1.0 1.0
  50.0   0.0  20.0  1.5224 1.5168 1.5143   # crown
 -40.0   5.0  20.0  1.6321 1.6200 1.6150
   inf   2.0  20.0  1.0 1.0 1.0
stop     0.0  5.0   10.0

  30.0   4.0  18.0  1.5 1.5 1.5
  inf    3.0  18.0  1.0 1.0 1.0
";

#[test]
fn numbers() {
    assert_eq!(parse_number("2.5").unwrap().1, 2.5);
    assert_eq!(parse_number("-1e2").unwrap().1, -100.0);
    assert!(parse_number("inf").unwrap().1.is_infinite());
    assert_eq!(parse_number("-Infinity").unwrap().1, Float::NEG_INFINITY);
}

#[test]
fn records() {
    assert_eq!(parse_record("   ").unwrap().1, Record::Blank);
    assert_eq!(parse_record("# only a comment").unwrap().1, Record::Blank);
    assert_eq!(parse_record("diaphragm 4.5").unwrap().1, Record::Diaphragm(4.5));
    match parse_record("spherical 10 1 2 1.5 # note").unwrap().1 {
        Record::Surface(row) => {
            assert_eq!(row.kind.as_deref(), Some("spherical"));
            assert_eq!(row.radius, 10.0);
            assert_eq!(row.indices, vec![1.5]);
        }
        other => panic!("unexpected {:?}", other)
    }
    match parse_record("inf 1 2 1.0").unwrap().1 {
        Record::Surface(row) => {
            assert!(row.kind.is_none());
            assert!(row.radius.is_infinite());
        }
        other => panic!("unexpected {:?}", other)
    }
    assert!(parse_record("10 1").is_err());
}

#[test]
fn doublet_with_unit_scale() {
    let seq = load_str(DOUBLET, LensFormat::Tabular, 0.001).unwrap();
    assert_eq!(seq.len(), 6);
    assert_eq!(seq.stop_index(), 3);
    assert_eq!(seq.n_wavelengths(), 3);
    assert!((seq.diaphragm_diameter().unwrap() - 0.008).abs() < 1e-12);
    assert!((seq.wavelengths().unwrap()[1] - 0.5876).abs() < 1e-12);
    match &seq.surfaces()[1] {
        Surface::Spherical(s) => {
            assert!((s.radius + 0.04).abs() < 1e-12);
            assert!((s.vertex_z - 0.005).abs() < 1e-12);
            assert!((s.semi_diameter - 0.01).abs() < 1e-12);
            assert_eq!(s.indices.len(), 3);
        }
        other => panic!("unexpected {:?}", other)
    }
    assert!(seq.surfaces()[2].radius().is_infinite());
    assert!((seq.rear_z() - 0.019).abs() < 1e-12);
}

#[test]
fn zero_radius_is_the_stop() {
    let text = "50 0 20 1.5\n0 5 10\n-50 5 20 1.0\n";
    let seq = load_str(text, LensFormat::Tabular, 1.0).unwrap();
    assert_eq!(seq.stop_index(), 1);
}

#[test]
fn parse_error_reports_line() {
    let text = "50 0 20 1.5\n0 5 10\n-50 five 20 1.0\n";
    match load_str(text, LensFormat::Tabular, 1.0) {
        Err(LensError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected {:?}", other)
    }
}

#[test]
fn unknown_kind() {
    let text = "mirror 50 0 20 1.5\nstop 0 5 10\n";
    match load_str(text, LensFormat::Tabular, 1.0) {
        Err(LensError::UnknownSurfaceKind(kind)) => assert_eq!(kind, "mirror"),
        other => panic!("unexpected {:?}", other)
    }
}

#[test]
fn two_stops_are_rejected() {
    let text = "0 0 10\n50 5 20 1.5\n0 5 10\n";
    match load_str(text, LensFormat::Tabular, 1.0) {
        Err(LensError::MultipleApertureStops { count }) => assert_eq!(count, 2),
        other => panic!("unexpected {:?}", other)
    }
}

#[test]
fn refractive_surface_needs_indices() {
    let text = "spherical 50 0 20\nstop 0 5 10\n";
    assert!(matches!(load_str(text, LensFormat::Tabular, 1.0), Err(LensError::Parse { line: 1, .. })));
}

#[test]
fn json_lens() {
    let text = r#"{
        "wavelengths": [587.6],
        "surfaces": [
            { "radius": 50.0, "offset": 0.0, "diameter": 20.0, "indices": [1.5168] },
            { "kind": "stop", "offset": 5.0, "diameter": 14.0 },
            { "offset": 5.0, "diameter": 20.0, "indices": [1.0] }
        ]
    }"#;
    let seq = load_str(text, LensFormat::Json, 1.0).unwrap();
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.stop_index(), 1);
    assert!(seq.surfaces()[2].radius().is_infinite());
    assert!(matches!(load_str("{ \"surfaces\": [", LensFormat::Json, 1.0), Err(LensError::Parse { .. })));
}

#[test]
fn load_from_disk() {
    let path = std::env::temp_dir().join(format!("lenstrace-loader-{}.lens", std::process::id()));
    {
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(DOUBLET.as_bytes()).unwrap();
    }
    let seq = load_file(&path, 1.0).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(seq.len(), 6);
    assert!(matches!(load_file(&path, 1.0), Err(LensError::Io(_))));
}
