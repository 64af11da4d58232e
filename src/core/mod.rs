pub mod numeric;
pub mod error;
pub mod geometry;
pub mod rng;
pub mod sampling;
pub mod options;
pub mod stats_accumulator;
pub mod surface;
pub mod bundle;
pub mod observer;
