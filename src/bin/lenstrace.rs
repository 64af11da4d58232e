use anyhow::{Context, Result};
use clap::Parser;
use lenstrace::core::geometry::{Point3f, Vector3f};
use lenstrace::core::numeric::Float;
use lenstrace::core::options::{LensOptions, VignettingParams};
use lenstrace::core::rng::Rng;
use lenstrace::core::stats_accumulator::StatsAccumulator;
use lenstrace::generators::{CollimatedBeam, RayGenerator};
use lenstrace::loader;
use lenstrace::paraxial::FocusModel;
use lenstrace::pupil::{PupilSampler, VignettingEstimator};
use lenstrace::surrogate::{LinearSurrogate, RayPairTable, SurrogateFit};
use lenstrace::tracer::SequentialTracer;
use log::info;
use std::io;
use std::path::PathBuf;

/// Trace a lens description and report its focus, entrance pupil and
/// vignetting circles.
#[derive(Parser, Debug)]
#[command(name = "lenstrace", version)]
struct Args {
    /// Lens description (`.json` for the structured format, tabular otherwise)
    lens: PathBuf,

    /// Factor applied to every length in the lens file
    #[arg(long, default_value_t = 1.0)]
    scale: Float,

    /// Wavelength column used for tracing
    #[arg(short, long, default_value_t = 0)]
    wavelength: usize,

    #[arg(long, default_value_t = 1.0)]
    object_index: Float,

    #[arg(long, default_value_t = 1.0)]
    image_index: Float,

    /// Axial position of an object to focus on, in the lens frame
    #[arg(long, allow_hyphen_values = true)]
    focus_z: Option<Float>,

    /// Distance of the source plane in front of the first surface [default: 10 focal lengths]
    #[arg(long)]
    source_distance: Option<Float>,

    /// Largest off-axis source height [default: 0.3 source distances]
    #[arg(long)]
    max_height: Option<Float>,

    /// Number of off-axis heights, the axis included
    #[arg(long, default_value_t = 6)]
    heights: usize,

    /// Rays traced per off-axis height
    #[arg(short, long, default_value_t = 4096)]
    rays: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads, 0 for one per core
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,

    /// Inward margin of the pupil vertex in the cutting circle search
    #[arg(long, default_value_t = 0.0)]
    vertex_offset: Float,

    /// Radius increment of the cutting circle search
    #[arg(long, default_value_t = 0.01)]
    step: Float,

    #[arg(long, default_value_t = 100_000)]
    max_iterations: usize,

    /// Bend rays at the aperture stop edge
    #[arg(long)]
    diffraction: bool,

    /// Write entrance/exit ray pairs of an on-axis beam to this file
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(short, long)]
    quiet: bool
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    LensOptions::set(LensOptions {
        n_threads: args.threads,
        quiet: args.quiet,
        seed: args.seed,
        diffraction: args.diffraction,
        vignetting: VignettingParams {
            vertex_offset: args.vertex_offset,
            step_size: args.step,
            max_iterations: args.max_iterations
        }
    });
    LensOptions::configure_thread_pool().context("unable to start the worker pool")?;

    let sequence = loader::load_file(&args.lens, args.scale)
        .with_context(|| format!("unable to load {}", args.lens.display()))?;
    let focus = FocusModel::build(&sequence, args.wavelength, args.object_index, args.image_index)?;
    println!("Effective focal length  {:.6}", focus.effective_focal_length);
    println!("Back focal distance     {:.6}", focus.back_focal_distance(&sequence));
    if let Some(z) = args.focus_z {
        match focus.film_distance(&sequence, z) {
            Some(d) => println!("Film distance           {:.6}", d),
            None => println!("Film distance           no real image of z = {}", z)
        }
    }

    let tracer = SequentialTracer::from_options(&sequence)?;
    let source_distance = args.source_distance
        .unwrap_or_else(|| 10.0 * focus.effective_focal_length.abs());
    let source_z = sequence.front_z() - source_distance;
    let max_height = args.max_height.unwrap_or(0.3 * source_distance);
    let n_heights = args.heights.max(2);
    let heights: Vec<Float> = (0..n_heights)
        .map(|k| max_height * k as Float / (n_heights - 1) as Float)
        .collect();
    info!("Sampling the pupil from z = {} at {} heights up to {}", source_z, n_heights, max_height);

    let sampler = PupilSampler::new(&tracer, source_z, sequence.front_z())?
        .with_rays(args.rays)
        .with_wavelength(args.wavelength)
        .with_seed(args.seed);
    let samples = sampler.sample(&heights)?;
    let fit = VignettingEstimator::from_options().estimate(&samples)?;
    let circles = fit.physical_circles()?;
    println!("{:<16}{:>14}{:>14}{:>14}", "circle", "radius", "z", "sensitivity");
    for (name, circle) in ["entrance pupil", "bottom cut", "top cut"].iter().zip(circles.iter()) {
        println!("{:<16}{:>14.6}{:>14.6}{:>14.6}",
            name, circle.radius, sampler.lens_z(circle.distance), circle.sensitivity);
    }

    if let Some(path) = &args.export {
        let beam = CollimatedBeam::new(
            Point3f::new(0.0, 0.0, sequence.front_z() - 1.0),
            Vector3f::new(0.0, 0.0, 1.0),
            sequence.effective_semi_diameter(0),
            args.wavelength);
        let mut bundle = beam.generate(args.rays, &mut Rng::new(args.seed))?;
        tracer.trace(&mut bundle)?;
        let table = RayPairTable::from_bundle(&bundle)?;
        table.save(path).with_context(|| format!("unable to write {}", path.display()))?;
        let mut surrogate = LinearSurrogate::default();
        match surrogate.fit(&table) {
            Ok(()) => info!("Linear surrogate: {:?}", surrogate.coefficients()),
            Err(e) => log::warn!("No linear surrogate: {}", e)
        }
        println!("Wrote {} ray pairs to {}", table.len(), path.display());
    }

    if !LensOptions::get().quiet {
        let stats = StatsAccumulator::instance();
        stats.accumulate();
        stats.print(&mut io::stdout())?;
    }
    Ok(())
}
