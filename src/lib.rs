#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

extern crate rayon;

pub mod core;
pub mod tracer;
pub mod generators;
pub mod pupil;
pub mod loader;
pub mod paraxial;
pub mod surrogate;
