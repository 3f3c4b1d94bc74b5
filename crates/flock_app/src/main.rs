//! # flock_app
//!
//! Headless driver for the flock simulation. Spawns a population, runs the
//! fixed-rate frame loop and writes per-frame timings to a CSV file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flock_agent::AgentId;
use flock_math::Vec2;
use flock_sim::{
    Composite, CsvTelemetry, Flock, FlockConfig, LinearScan, LoopConfig, SpatialQuery,
    StayInRadius, UniformGrid,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flock_app", about = "Headless 2-D boids flock")]
struct Args {
    /// Number of agents to spawn (overrides the config file)
    #[arg(short, long)]
    count: Option<usize>,

    /// Number of frames to run (0 = until interrupted)
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Target frames per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// RNG seed for reproducible populations (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with flock parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the `Timestamp, FPS` table
    #[arg(long, default_value = "TimingResults.csv")]
    timing_log: PathBuf,

    /// Highlight this agent after spawning
    #[arg(long)]
    search: Option<u64>,

    /// Delete this agent after spawning
    #[arg(long)]
    delete: Option<u64>,

    /// Use a uniform grid instead of a linear scan for neighbor lookups
    #[arg(long)]
    grid: bool,
}

/// Weight of the pull that keeps the flock around the origin.
const STAY_IN_RADIUS_WEIGHT: f32 = 0.1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("flock_app=info".parse()?)
                .add_directive("flock_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading flock config");
            FlockConfig::from_json_file(path)?
        }
        None => FlockConfig::default(),
    };
    if let Some(count) = args.count {
        config.starting_count = count;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if args.grid {
        let cell_size = config.neighbor_radius;
        drive(&args, config, UniformGrid::new(cell_size))
    } else {
        drive(&args, config, LinearScan::new())
    }
}

fn drive<Q: SpatialQuery>(args: &Args, config: FlockConfig, spatial: Q) -> Result<()> {
    let count = config.starting_count;
    let area = count as f32 * config.agent_density;
    let behaviour = Composite::boids().with(
        StayInRadius {
            center: Vec2::ZERO,
            radius: area.max(config.neighbor_radius),
        },
        STAY_IN_RADIUS_WEIGHT,
    );
    let telemetry = CsvTelemetry::create(&args.timing_log)
        .with_context(|| format!("creating {}", args.timing_log.display()))?;

    let mut flock = Flock::new(config, behaviour, spatial, telemetry)?;
    flock.start(count)?;

    if let Some(id) = args.search {
        if flock.search(AgentId(id)).is_none() {
            warn!(agent_id = id, "search target does not exist");
        }
    }
    if let Some(id) = args.delete {
        flock.delete(AgentId(id));
    }

    let ticks = flock.run(&LoopConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
    })?;
    flock.stop();

    let agents = flock.agents();
    let (sum, top_speed) = agents.iter().fold((Vec2::ZERO, 0.0f32), |(sum, top), agent| {
        (sum + agent.position(), top.max(agent.velocity().length()))
    });
    let centroid = if agents.is_empty() {
        Vec2::ZERO
    } else {
        sum / agents.len() as f32
    };
    info!(
        ticks,
        agents = agents.len(),
        centroid_x = centroid.x,
        centroid_y = centroid.y,
        top_speed,
        highlighted = ?flock.highlighted(),
        timing_log = %args.timing_log.display(),
        "simulation finished"
    );
    Ok(())
}
