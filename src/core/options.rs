//! Process-wide options, set once by the command line front end and read by
//! the library where a caller does not pass an explicit value.
use super::error::{LensError, Result};
use super::numeric::Float;
use parking_lot::RwLock;

/// Tunables of the cutting-circle search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignettingParams {
    /// Inward offset applied to the extreme pupil point before the search.
    pub vertex_offset: Float,
    /// Increment of the trial radius.
    pub step_size: Float,
    pub max_iterations: usize
}

impl Default for VignettingParams {
    fn default() -> VignettingParams {
        VignettingParams {
            vertex_offset: 0.0,
            step_size: 0.01,
            max_iterations: 100_000
        }
    }
}

#[derive(Debug, Clone)]
pub struct LensOptions {
    /// Worker threads for row-parallel tracing; 0 lets rayon decide.
    pub n_threads: usize,
    pub quiet: bool,
    pub seed: u64,
    /// Enable the boundary-bending hook at the aperture stop.
    pub diffraction: bool,
    pub vignetting: VignettingParams
}

impl Default for LensOptions {
    fn default() -> LensOptions {
        LensOptions {
            n_threads: 0,
            quiet: false,
            seed: 0,
            diffraction: false,
            vignetting: VignettingParams::default()
        }
    }
}

lazy_static! {
    static ref OPTIONS: RwLock<LensOptions> = RwLock::new(LensOptions::default());
}

impl LensOptions {
    /// Snapshot of the current options.
    pub fn get() -> LensOptions {
        OPTIONS.read().clone()
    }

    pub fn set(options: LensOptions) {
        *OPTIONS.write() = options;
    }

    /// Size the global rayon pool from `n_threads`. Returns the number of
    /// worker threads, leaving the default pool alone when `n_threads` is 0.
    pub fn configure_thread_pool() -> Result<usize> {
        let n_threads = LensOptions::get().n_threads;
        if n_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build_global()
                .map_err(|e| LensError::InvalidParameter(format!("unable to start {} worker threads: {}", n_threads, e)))?;
            info!("Tracing with {} worker threads", n_threads);
        }
        Ok(rayon::current_num_threads())
    }
}
