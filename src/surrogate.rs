//! Paired entrance/exit ray samples for fitting a surrogate model of the
//! lens, and a little-endian binary exchange format for them.
use crate::core::bundle::RayBundle;
use crate::core::error::{LensError, Result};
use crate::core::numeric::Float;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const HEADER: [u8; 8] = [b'R', b'A', b'Y', b'P', b'A', b'I', b'R', 0x1];

/// Transverse ray state: position and direction components across the axis.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RayState {
    pub x: Float,
    pub y: Float,
    pub dx: Float,
    pub dy: Float
}

impl RayState {
    pub fn new(x: Float, y: Float, dx: Float, dy: Float) -> RayState {
        RayState { x, y, dx, dy }
    }

    pub fn to_array(&self) -> [Float; 4] {
        [self.x, self.y, self.dx, self.dy]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPair {
    pub input: RayState,
    pub output: RayState,
    pub path_length: Float
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayPairTable {
    pairs: Vec<RayPair>
}

impl RayPairTable {
    pub fn new(pairs: Vec<RayPair>) -> RayPairTable {
        RayPairTable { pairs }
    }

    /// One pair per ray that survived the trace of `bundle`.
    pub fn from_bundle(bundle: &RayBundle) -> Result<RayPairTable> {
        let exit = bundle.exit()
            .ok_or_else(|| LensError::InvalidParameter("bundle has not been traced".into()))?;
        let entrance = bundle.entrance();
        let pairs = exit.iter_live()
            .filter_map(|(i, p, d)| {
                let (o, v) = entrance.get(i)?;
                Some(RayPair {
                    input: RayState::new(o.x, o.y, v.x, v.y),
                    output: RayState::new(p.x, p.y, d.x, d.y),
                    path_length: bundle.path_length(i)
                })
            })
            .collect::<Vec<_>>();
        debug!("Collected {} ray pairs from {} rays", pairs.len(), bundle.len());
        Ok(RayPairTable { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[RayPair] {
        &self.pairs
    }

    /// Header, pair count (u64), then per pair the input state, output state
    /// and path length as f64, all little-endian.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&HEADER)?;
        w.write_u64::<LittleEndian>(self.pairs.len() as u64)?;
        for pair in &self.pairs {
            for v in pair.input.to_array().iter().chain(pair.output.to_array().iter()) {
                w.write_f64::<LittleEndian>(*v as f64)?;
            }
            w.write_f64::<LittleEndian>(pair.path_length as f64)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<RayPairTable> {
        let mut header = [0_u8; 8];
        r.read_exact(&mut header)?;
        if header != HEADER {
            return Err(LensError::InvalidParameter("not a ray pair table or incompatible version".into()));
        }
        let n = r.read_u64::<LittleEndian>()? as usize;
        let mut pairs = Vec::with_capacity(n.min(1 << 20));
        let mut row = [0.0_f64; 9];
        for _ in 0..n {
            r.read_f64_into::<LittleEndian>(&mut row)?;
            let v: Vec<Float> = row.iter().map(|&x| x as Float).collect();
            pairs.push(RayPair {
                input: RayState::new(v[0], v[1], v[2], v[3]),
                output: RayState::new(v[4], v[5], v[6], v[7]),
                path_length: v[8]
            });
        }
        Ok(RayPairTable { pairs })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<RayPairTable> {
        RayPairTable::read_from(&mut BufReader::new(File::open(path)?))
    }
}

/// A regression from entrance ray state to exit ray state and path length.
pub trait SurrogateFit {
    fn fit(&mut self, table: &RayPairTable) -> Result<()>;

    fn evaluate(&self, input: &RayState) -> Option<(RayState, Float)>;
}

/// First order surrogate: every output is an affine function of the input
/// state, fitted by least squares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearSurrogate {
    /// One row per output (x, y, dx, dy, path length): constant term, then
    /// the coefficients of x, y, dx, dy.
    coefficients: Option<[[Float; 5]; 5]>
}

impl LinearSurrogate {
    pub fn coefficients(&self) -> Option<&[[Float; 5]; 5]> {
        self.coefficients.as_ref()
    }
}

/// Solve `a x = b` in place by gaussian elimination with partial pivoting.
fn solve5(mut a: [[Float; 5]; 5], mut b: [Float; 5]) -> Option<[Float; 5]> {
    for col in 0..5 {
        let pivot = (col..5).max_by(|&i, &j| a[i][col].abs().partial_cmp(&a[j][col].abs())
            .unwrap_or(std::cmp::Ordering::Equal))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..5 {
            let f = a[row][col] / a[col][col];
            for k in col..5 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = [0.0; 5];
    for row in (0..5).rev() {
        let s: Float = (row + 1..5).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - s) / a[row][row];
    }
    Some(x)
}

impl SurrogateFit for LinearSurrogate {
    fn fit(&mut self, table: &RayPairTable) -> Result<()> {
        let mut normal = [[0.0 as Float; 5]; 5];
        let mut rhs = [[0.0 as Float; 5]; 5];
        for pair in table.pairs() {
            let i = pair.input.to_array();
            let basis = [1.0, i[0], i[1], i[2], i[3]];
            let o = pair.output.to_array();
            let targets = [o[0], o[1], o[2], o[3], pair.path_length];
            for r in 0..5 {
                for c in 0..5 {
                    normal[r][c] += basis[r] * basis[c];
                }
                for (t, target) in targets.iter().enumerate() {
                    rhs[t][r] += basis[r] * target;
                }
            }
        }
        let mut coefficients = [[0.0; 5]; 5];
        for (t, b) in rhs.iter().enumerate() {
            coefficients[t] = solve5(normal, *b).ok_or_else(|| LensError::InvalidParameter(
                format!("{} ray pairs do not determine a linear surrogate", table.len())))?;
        }
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn evaluate(&self, input: &RayState) -> Option<(RayState, Float)> {
        let c = self.coefficients.as_ref()?;
        let i = input.to_array();
        let basis = [1.0, i[0], i[1], i[2], i[3]];
        let out: Vec<Float> = c.iter()
            .map(|row| row.iter().zip(basis.iter()).map(|(a, b)| a * b).sum())
            .collect();
        Some((RayState::new(out[0], out[1], out[2], out[3]), out[4]))
    }
}
