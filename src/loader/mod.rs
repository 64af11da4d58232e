//! Lens description loaders.
//!
//! Both the legacy tabular text format and the JSON format produce a
//! `LensDescription`, which is turned into a validated `SurfaceSequence` with
//! a unit scale applied to every length.
pub mod tabular;
pub mod json;

use crate::core::error::{LensError, Result};
use crate::core::numeric::Float;
use crate::core::surface::{SurfaceKind, SurfaceSequence, SurfaceSpec};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One surface row as written in a lens file, lengths still unscaled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurfaceRow {
    /// Source line, 0 when the format has no line structure.
    #[serde(skip)]
    pub line: usize,
    #[serde(default)]
    pub kind: Option<String>,
    /// Curvature radius; infinite (or absent in JSON) for a flat surface.
    #[serde(default = "flat")]
    pub radius: Float,
    pub offset: Float,
    pub diameter: Float,
    #[serde(default)]
    pub indices: Vec<Float>
}

fn flat() -> Float {
    Float::INFINITY
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LensDescription {
    #[serde(default)]
    pub wavelengths: Vec<Float>,
    #[serde(default)]
    pub diaphragm: Option<Float>,
    #[serde(default)]
    pub object_medium: Vec<Float>,
    pub surfaces: Vec<SurfaceRow>
}

impl SurfaceRow {
    fn to_spec(&self, scale: Float) -> Result<SurfaceSpec> {
        let kind = match &self.kind {
            Some(k) => Some(k.parse::<SurfaceKind>()?),
            None => None
        };
        let offset = self.offset * scale;
        let semi_diameter = 0.5 * self.diameter * scale;
        match kind {
            Some(SurfaceKind::ApertureStop) => Ok(SurfaceSpec::stop(offset, semi_diameter)),
            None if self.radius == 0.0 => Ok(SurfaceSpec::stop(offset, semi_diameter)),
            Some(SurfaceKind::RefractiveSpherical) if self.radius == 0.0 => Err(LensError::Parse {
                line: self.line,
                message: "refractive surface with zero radius".into()
            }),
            _ if self.indices.is_empty() => Err(LensError::Parse {
                line: self.line,
                message: "refractive surface without refractive indices".into()
            }),
            _ => Ok(SurfaceSpec::spherical(self.radius * scale, offset, semi_diameter, &self.indices))
        }
    }
}

impl LensDescription {
    /// Build the surface sequence, multiplying every length by `scale`.
    pub fn into_sequence(self, scale: Float) -> Result<SurfaceSequence> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(LensError::InvalidParameter(format!("unit scale {} must be positive", scale)));
        }
        let specs = self.surfaces.iter()
            .map(|row| row.to_spec(scale))
            .collect::<Result<Vec<_>>>()?;
        let mut sequence = SurfaceSequence::new(specs)?;
        if let Some(d) = self.diaphragm {
            sequence = sequence.with_diaphragm(d * scale);
        }
        if !self.object_medium.is_empty() {
            sequence = sequence.with_object_indices(&self.object_medium)?;
        }
        if !self.wavelengths.is_empty() {
            let scaled: Vec<Float> = self.wavelengths.iter().map(|w| w * scale).collect();
            sequence = sequence.with_wavelengths(&scaled)?;
        }
        info!("Loaded lens with {} surfaces, aperture stop at surface {}",
            sequence.len(), sequence.stop_index());
        Ok(sequence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensFormat {
    Tabular,
    Json
}

impl LensFormat {
    /// `.json` files are structured, anything else is tabular.
    pub fn from_path(path: &Path) -> LensFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => LensFormat::Json,
            _ => LensFormat::Tabular
        }
    }
}

pub fn load_str(text: &str, format: LensFormat, scale: Float) -> Result<SurfaceSequence> {
    let description = match format {
        LensFormat::Tabular => tabular::parse_description(text)?,
        LensFormat::Json => json::parse_description(text)?
    };
    description.into_sequence(scale)
}

pub fn load_file<P: AsRef<Path>>(path: P, scale: Float) -> Result<SurfaceSequence> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!("Reading lens description {}", path.display());
    load_str(&text, LensFormat::from_path(path), scale)
}

#[cfg(test)]
mod tests;
