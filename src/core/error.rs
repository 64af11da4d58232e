//! Error types shared across the crate.
use super::numeric::Float;
use thiserror::Error;

/// Fatal configuration errors.
///
/// Per-ray numerical failures (missed surfaces, clipped rays, total internal
/// reflection) are never reported here; they retire the ray instead.
#[derive(Error, Debug)]
pub enum LensError {
    #[error("surface sequence has no aperture stop")]
    MissingApertureStop,

    #[error("surface sequence has {count} aperture stops, expected exactly one")]
    MultipleApertureStops { count: usize },

    #[error("unknown surface kind `{0}`")]
    UnknownSurfaceKind(String),

    #[error("surface sequence is empty")]
    EmptySequence,

    #[error("surface {surface} has {found} refractive indices, expected {expected}")]
    IndexTableMismatch { surface: usize, found: usize, expected: usize },

    #[error("ray attribute `{attribute}` has {found} rows, expected {expected}")]
    BundleLengthMismatch { attribute: &'static str, found: usize, expected: usize },

    #[error("ray {ray} uses wavelength index {index} but only {count} wavelengths are defined")]
    WavelengthOutOfRange { ray: usize, index: usize, count: usize },

    #[error("the {0} interface snapshot was already recorded for this bundle")]
    SnapshotAlreadyRecorded(&'static str),

    #[error("unknown pupil side `{0}`, expected `top` or `bottom`")]
    UnknownSide(String),

    #[error("cutting circle search for the {side} side exceeded {max_iterations} iterations")]
    SearchExhausted { side: &'static str, max_iterations: usize },

    #[error("no usable pupil samples: {0}")]
    NoPupilSamples(&'static str),

    #[error("sensitivity {0} cannot be back-projected")]
    DegenerateSensitivity(Float),

    #[error("paraxial ray could not be traced through the {0} of the lens")]
    ParaxialTraceFailed(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("lens description line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LensError>;
