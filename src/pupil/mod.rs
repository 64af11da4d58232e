//! Entrance pupil and vignetting estimation from traced pupil-plane samples.
pub mod samples;
pub use samples::*;
pub mod vignetting;
pub use vignetting::*;
pub mod sampler;
pub use sampler::*;
