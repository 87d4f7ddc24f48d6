mod metrics;
mod snapshots;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use flock_core::{BruteForce, Emitter, FlockSimulation, FlockStats, NeighborQuery, SpatialGrid};
use flock_params::{layout, NeighborStrategy, SimulationConfig};
use metrics::MetricsWriter;
use snapshots::SnapshotWriter;

#[derive(Parser)]
#[command(name = "flock-headless")]
#[command(about = "Headless CLI runner for Flock boid experiments")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory for results
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Override the number of frames to run
    #[arg(long)]
    steps: Option<u32>,

    /// Override the seeding RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Abort on the first frame with a numeric fault
    #[arg(long)]
    strict: bool,
}

fn load_config(path: &Path) -> anyhow::Result<SimulationConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: SimulationConfig =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("Loading configuration from {}", cli.config.display());
    let mut config = load_config(&cli.config)?;
    if let Some(steps) = cli.steps {
        config.world.steps = steps;
    }
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
    }

    config.validate()?;
    if config.world.steps == 0 {
        bail!("Step count must be greater than 0.");
    }
    if config.world.dt == 0.0 {
        bail!("Time step (dt) must be positive.");
    }
    layout::validate_params_layout().map_err(anyhow::Error::msg)?;
    layout::log_layouts();

    std::fs::create_dir_all(&cli.out)?;

    let mut emitter = Emitter::new(config.world.seed);
    let (boids, predator) = emitter.emit(&config.flock, config.world.size);
    log::info!(
        "Seeded {} boids in a {}x{} world (seed {})",
        boids.len(),
        config.world.size[0],
        config.world.size[1],
        config.world.seed
    );

    match config.neighbors.strategy {
        NeighborStrategy::BruteForce => {
            let sim = FlockSimulation::with_query(config.flock, boids, predator, BruteForce)?;
            run(sim, &config, &cli)
        }
        NeighborStrategy::Grid => {
            let grid = match config.neighbors.cell_size {
                Some(size) => SpatialGrid::with_cell_size(size),
                None => SpatialGrid::new(),
            };
            let sim = FlockSimulation::with_query(config.flock, boids, predator, grid)?;
            run(sim, &config, &cli)
        }
    }
}

fn run<Q: NeighborQuery>(
    sim: FlockSimulation<Q>,
    config: &SimulationConfig,
    cli: &Cli,
) -> anyhow::Result<()> {
    let mut sim = sim.with_boundary(config.world.boundary, config.world.size);
    let mut metrics_writer = MetricsWriter::new(&cli.out)?;
    let snapshot_writer = SnapshotWriter::new(&cli.out)?;
    let metrics_every = config.output.metrics_every;

    log::info!(
        "Starting simulation for {} steps using {} neighbor search...",
        config.world.steps,
        sim.query().name()
    );
    let start_time = Instant::now();
    let mut total_faults = 0usize;

    for step in 0..=config.world.steps {
        let step_start = Instant::now();

        if step > 0 {
            let report = sim.advance(config.world.dt)?;
            if report.total_faults() > 0 {
                total_faults += report.total_faults();
                if cli.strict {
                    bail!(
                        "Numeric fault at frame {}: {} boid(s) reset{}",
                        report.frame,
                        report.numeric_faults,
                        if report.predator_fault { ", predator reset" } else { "" }
                    );
                }
            }
            metrics_writer.record_frame(&report);
        }

        if metrics_every > 0 && step % metrics_every == 0 {
            let stats = FlockStats::from_state(&sim.current_state());
            let step_time = step_start.elapsed();
            metrics_writer.write_step(&stats, step_time)?;

            log::info!(
                "Step {}: centroid=({:.1}, {:.1}), speed={:.2}, polarization={:.3}, Time={:?}",
                step,
                stats.centroid_x,
                stats.centroid_y,
                stats.mean_speed,
                stats.polarization,
                step_time
            );
        }

        if config.output.snapshot_steps.contains(&step) {
            let path = snapshot_writer.write_boids_snapshot(step, &sim.current_state())?;
            log::info!("Snapshot written to {}", path.display());
        }
    }

    if total_faults > 0 {
        log::warn!("{} numeric fault(s) were reset during the run", total_faults);
    }
    log::info!(
        "Simulation completed in {:?} ({} metrics rows)",
        start_time.elapsed(),
        metrics_writer.rows()
    );
    log::info!("Results written to {}", cli.out.display());

    Ok(())
}
