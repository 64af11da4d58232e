//! Optical surfaces and the ordered sequence a ray crosses from scene to sensor.
use super::error::{LensError, Result};
use super::numeric::Float;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Per-wavelength refractive indices of the medium following a surface.
pub type IndexTable = SmallVec<[Float; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    RefractiveSpherical,
    ApertureStop
}

impl FromStr for SurfaceKind {
    type Err = LensError;

    fn from_str(s: &str) -> Result<SurfaceKind> {
        match s.to_ascii_lowercase().as_str() {
            "spherical" | "refractive" | "sphere" => Ok(SurfaceKind::RefractiveSpherical),
            "stop" | "aperture" | "diaphragm" => Ok(SurfaceKind::ApertureStop),
            _ => Err(LensError::UnknownSurfaceKind(s.to_owned()))
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::RefractiveSpherical => write!(f, "spherical"),
            SurfaceKind::ApertureStop => write!(f, "stop")
        }
    }
}

/// A spherical refracting interface. An infinite radius is a flat interface.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalSurface {
    /// Signed radius of curvature; positive when the center lies behind the vertex.
    pub radius: Float,
    pub vertex_z: Float,
    pub offset: Float,
    pub semi_diameter: Float,
    /// Indices of the medium after this surface, one per wavelength.
    pub indices: IndexTable
}

impl SphericalSurface {
    #[inline]
    pub fn center_z(&self) -> Float {
        self.vertex_z + self.radius
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.radius.is_infinite()
    }
}

/// The planar, non-refracting surface that limits the beam.
#[derive(Debug, Clone, PartialEq)]
pub struct ApertureStop {
    pub vertex_z: Float,
    pub offset: Float,
    pub semi_diameter: Float
}

#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Spherical(SphericalSurface),
    Stop(ApertureStop)
}

impl Surface {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Surface::Spherical(_) => SurfaceKind::RefractiveSpherical,
            Surface::Stop(_) => SurfaceKind::ApertureStop
        }
    }

    pub fn vertex_z(&self) -> Float {
        match self {
            Surface::Spherical(s) => s.vertex_z,
            Surface::Stop(s) => s.vertex_z
        }
    }

    pub fn offset(&self) -> Float {
        match self {
            Surface::Spherical(s) => s.offset,
            Surface::Stop(s) => s.offset
        }
    }

    pub fn semi_diameter(&self) -> Float {
        match self {
            Surface::Spherical(s) => s.semi_diameter,
            Surface::Stop(s) => s.semi_diameter
        }
    }

    /// Signed curvature radius, 0 for the aperture stop.
    pub fn radius(&self) -> Float {
        match self {
            Surface::Spherical(s) => s.radius,
            Surface::Stop(_) => 0.0
        }
    }
}

/// Description of one surface before positions are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub kind: SurfaceKind,
    pub radius: Float,
    pub offset: Float,
    pub semi_diameter: Float,
    pub indices: Vec<Float>
}

impl SurfaceSpec {
    pub fn spherical(radius: Float, offset: Float, semi_diameter: Float, indices: &[Float]) -> SurfaceSpec {
        SurfaceSpec {
            kind: SurfaceKind::RefractiveSpherical,
            radius,
            offset,
            semi_diameter,
            indices: indices.to_vec()
        }
    }

    pub fn stop(offset: Float, semi_diameter: Float) -> SurfaceSpec {
        SurfaceSpec {
            kind: SurfaceKind::ApertureStop,
            radius: 0.0,
            offset,
            semi_diameter,
            indices: Vec::new()
        }
    }
}

/// Ordered, validated list of surfaces.
///
/// Construction guarantees exactly one aperture stop and index tables of a
/// common length on every refractive surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSequence {
    surfaces: Vec<Surface>,
    stop_index: usize,
    diaphragm_diameter: Option<Float>,
    object_indices: IndexTable,
    wavelengths: Option<Vec<Float>>
}

impl SurfaceSequence {
    /// Resolve axial positions from cumulative offsets and validate.
    pub fn new(specs: Vec<SurfaceSpec>) -> Result<SurfaceSequence> {
        let mut z: Float = 0.0;
        let mut surfaces = Vec::with_capacity(specs.len());
        for spec in specs {
            z += spec.offset;
            let surface = match spec.kind {
                SurfaceKind::ApertureStop => Surface::Stop(ApertureStop {
                    vertex_z: z,
                    offset: spec.offset,
                    semi_diameter: spec.semi_diameter
                }),
                SurfaceKind::RefractiveSpherical if spec.radius == 0.0 => {
                    // Zero curvature radius always marks the stop.
                    Surface::Stop(ApertureStop {
                        vertex_z: z,
                        offset: spec.offset,
                        semi_diameter: spec.semi_diameter
                    })
                }
                SurfaceKind::RefractiveSpherical => Surface::Spherical(SphericalSurface {
                    radius: spec.radius,
                    vertex_z: z,
                    offset: spec.offset,
                    semi_diameter: spec.semi_diameter,
                    indices: spec.indices.iter().copied().collect()
                })
            };
            surfaces.push(surface);
        }
        SurfaceSequence::from_surfaces(surfaces)
    }

    /// Validate surfaces whose positions are already resolved.
    pub fn from_surfaces(surfaces: Vec<Surface>) -> Result<SurfaceSequence> {
        let stop_index = validate_surfaces(&surfaces)?;
        let n_wavelengths = surfaces.iter()
            .filter_map(|s| match s {
                Surface::Spherical(s) => Some(s.indices.len()),
                Surface::Stop(_) => None
            })
            .next()
            .unwrap_or(1);
        let object_indices = std::iter::repeat(1.0).take(n_wavelengths).collect();
        debug!("Surface sequence with {} surfaces, stop at {}, {} wavelengths",
            surfaces.len(), stop_index, n_wavelengths);
        Ok(SurfaceSequence {
            surfaces,
            stop_index,
            diaphragm_diameter: None,
            object_indices,
            wavelengths: None
        })
    }

    /// Restrict the aperture stop with a global diaphragm diameter.
    pub fn with_diaphragm(mut self, diameter: Float) -> SurfaceSequence {
        let own = 2.0 * self.surfaces[self.stop_index].semi_diameter();
        if diameter > own {
            warn!("Diaphragm diameter {} is greater than the stop diameter {}. The stop limits the beam.",
                diameter, own);
        }
        self.diaphragm_diameter = Some(diameter);
        self
    }

    /// Set the object-medium indices, one per wavelength.
    pub fn with_object_indices(mut self, indices: &[Float]) -> Result<SurfaceSequence> {
        if indices.len() != self.n_wavelengths() {
            return Err(LensError::IndexTableMismatch {
                surface: 0,
                found: indices.len(),
                expected: self.n_wavelengths()
            });
        }
        self.object_indices = indices.iter().copied().collect();
        Ok(self)
    }

    /// Attach the physical wavelength of each index column, in lens units.
    pub fn with_wavelengths(mut self, wavelengths: &[Float]) -> Result<SurfaceSequence> {
        if wavelengths.len() != self.n_wavelengths() {
            return Err(LensError::InvalidParameter(format!(
                "{} wavelengths given for {} index columns", wavelengths.len(), self.n_wavelengths())));
        }
        self.wavelengths = Some(wavelengths.to_vec());
        Ok(self)
    }

    /// Re-run the structural checks. Sequences built through the constructors
    /// always pass; the tracer calls this before propagating any ray.
    pub fn validate(&self) -> Result<()> {
        validate_surfaces(&self.surfaces).map(|_| ())
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn stop_index(&self) -> usize {
        self.stop_index
    }

    pub fn diaphragm_diameter(&self) -> Option<Float> {
        self.diaphragm_diameter
    }

    pub fn n_wavelengths(&self) -> usize {
        self.object_indices.len()
    }

    pub fn object_indices(&self) -> &[Float] {
        &self.object_indices
    }

    pub fn wavelengths(&self) -> Option<&[Float]> {
        self.wavelengths.as_deref()
    }

    /// Semi-diameter that actually limits rays at surface `i`.
    pub fn effective_semi_diameter(&self, i: usize) -> Float {
        let own = self.surfaces[i].semi_diameter();
        match (&self.surfaces[i], self.diaphragm_diameter) {
            (Surface::Stop(_), Some(d)) => own.min(0.5 * d),
            _ => own
        }
    }

    pub fn front_z(&self) -> Float {
        self.surfaces.first().map(Surface::vertex_z).unwrap_or(0.0)
    }

    pub fn rear_z(&self) -> Float {
        self.surfaces.last().map(Surface::vertex_z).unwrap_or(0.0)
    }

    /// Index table of the medium in front of each surface, and of the image space.
    pub fn media(&self) -> (Vec<IndexTable>, IndexTable) {
        let mut table = self.object_indices.clone();
        let mut before = Vec::with_capacity(self.surfaces.len());
        for surface in &self.surfaces {
            before.push(table.clone());
            if let Surface::Spherical(s) = surface {
                table = s.indices.clone();
            }
        }
        (before, table)
    }

    /// Copy with uniform object and image media at every wavelength. The image
    /// medium replaces the table of the last refractive surface.
    pub fn with_media(&self, object_index: Float, image_index: Float) -> SurfaceSequence {
        let mut sequence = self.clone();
        let n = sequence.n_wavelengths();
        sequence.object_indices = std::iter::repeat(object_index).take(n).collect();
        if let Some(Surface::Spherical(last)) = sequence.surfaces.iter_mut()
            .rev()
            .find(|s| s.kind() == SurfaceKind::RefractiveSpherical)
        {
            last.indices = std::iter::repeat(image_index).take(n).collect();
        }
        sequence
    }

    /// The same system seen from the sensor side: surface order reversed, axis
    /// mirrored (z -> -z), radii negated and media shifted so that every surface
    /// again carries the index of the medium that follows it.
    pub fn reversed(&self) -> SurfaceSequence {
        let (before, image) = self.media();
        let n = self.surfaces.len();
        let mut surfaces = Vec::with_capacity(n);
        let mut previous_z: Float = 0.0;
        for i in (0..n).rev() {
            let vertex_z = -self.surfaces[i].vertex_z();
            let offset = vertex_z - previous_z;
            previous_z = vertex_z;
            surfaces.push(match &self.surfaces[i] {
                Surface::Spherical(s) => Surface::Spherical(SphericalSurface {
                    radius: -s.radius,
                    vertex_z,
                    offset,
                    semi_diameter: s.semi_diameter,
                    indices: before[i].clone()
                }),
                Surface::Stop(s) => Surface::Stop(ApertureStop {
                    vertex_z,
                    offset,
                    semi_diameter: s.semi_diameter
                })
            });
        }
        SurfaceSequence {
            surfaces,
            stop_index: n - 1 - self.stop_index,
            diaphragm_diameter: self.diaphragm_diameter,
            object_indices: image,
            wavelengths: self.wavelengths.clone()
        }
    }
}

/// Returns the position of the single aperture stop.
fn validate_surfaces(surfaces: &[Surface]) -> Result<usize> {
    if surfaces.is_empty() {
        return Err(LensError::EmptySequence);
    }
    let stops: Vec<usize> = surfaces.iter().enumerate()
        .filter(|(_, s)| s.kind() == SurfaceKind::ApertureStop)
        .map(|(i, _)| i)
        .collect();
    let stop_index = match stops.len() {
        0 => return Err(LensError::MissingApertureStop),
        1 => stops[0],
        count => return Err(LensError::MultipleApertureStops { count })
    };

    let mut expected: Option<usize> = None;
    for (i, surface) in surfaces.iter().enumerate() {
        if let Surface::Spherical(s) = surface {
            if s.radius == 0.0 {
                return Err(LensError::InvalidParameter(format!(
                    "refractive surface {} has zero curvature radius", i)));
            }
            if s.indices.is_empty() {
                return Err(LensError::IndexTableMismatch { surface: i, found: 0, expected: expected.unwrap_or(1) });
            }
            match expected {
                None => expected = Some(s.indices.len()),
                Some(n) if n != s.indices.len() => {
                    return Err(LensError::IndexTableMismatch { surface: i, found: s.indices.len(), expected: n });
                }
                _ => {}
            }
        }
    }
    Ok(stop_index)
}
