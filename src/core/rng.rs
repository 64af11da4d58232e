//! PCG32 pseudo-random number generator used by the ray generators and the
//! diffraction hook. Sequences are reproducible for a given seed.
use hexf::*;
use super::numeric::Float;

#[cfg(feature = "float_as_double")]
pub const ONE_MINUS_EPSILON: f64 = hexf64!("0x1.fffffffffffffp-1");
#[cfg(not(feature = "float_as_double"))]
pub const ONE_MINUS_EPSILON: f32 = hexf32!("0x1.fffffep-1");

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

#[derive(Debug, Copy, Clone)]
pub struct Rng {
    state: u64,
    inc: u64
}

impl Rng {
    pub fn new(seed: u64) -> Rng {
        let mut rng = Rng::default();
        rng.set_sequence(seed);
        rng
    }

    /// Generator for one row of a bundle. Rows traced in parallel draw from
    /// independent streams so results do not depend on scheduling.
    pub fn for_row(seed: u64, row: usize) -> Rng {
        let mut rng = Rng::new(seed);
        rng.inc = (row as u64).wrapping_shl(1) | 1;
        rng.next_u32();
        rng
    }

    pub fn set_sequence(&mut self, initseq: u64) {
        self.state = 0;
        self.inc = initseq.wrapping_shl(1) | 1;
        self.next_u32();
        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        self.next_u32();
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted = ((old.wrapping_shr(18) ^ old).wrapping_shr(27)) as u32;
        let rot = old.wrapping_shr(59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform sample in [0, 1).
    pub fn uniform_float(&mut self) -> Float {
        (self.next_u32() as Float * hexf64!("0x1.0p-32") as Float).min(ONE_MINUS_EPSILON)
    }
}

impl Default for Rng {
    fn default() -> Rng {
        Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM
        }
    }
}
