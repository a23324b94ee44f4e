//! Offline closed-loop run of the planner
//!
//! Drives the ego vehicle around a track with seeded random traffic and
//! reports lane changes and speed. With `--plot` the driven trace is saved
//! through gnuplot (`.svg` or `.png`).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use highway_planner::common::{Visualizable, DEFAULT_MAX_S};
use highway_planner::simulation::{HighwaySimulation, SimulationConfig};
use highway_planner::utils::Visualizer;
use highway_planner::{HighwayPlanner, Path2D, PlannerConfig, WaypointMap};

#[derive(Parser)]
#[command(name = "highway_sim")]
#[command(about = "Run the highway planner against simulated traffic", long_about = None)]
struct Cli {
    /// Planning cycles to run
    #[arg(long, default_value_t = 3000)]
    cycles: usize,

    /// Number of traffic vehicles
    #[arg(long, default_value_t = 12)]
    traffic: usize,

    /// Seed for traffic placement and speeds
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Path points driven between two cycles
    #[arg(long, default_value_t = 5)]
    consumed: usize,

    /// Radius of the generated ring track [m]
    #[arg(long, default_value_t = 800.0)]
    radius: f64,

    /// Waypoint table to drive on instead of the ring track
    #[arg(long)]
    map: Option<PathBuf>,

    /// Track length for `--map`
    #[arg(long, default_value_t = DEFAULT_MAX_S)]
    max_s: f64,

    /// Save a plot of the run to this file
    #[arg(long)]
    plot: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let map = match &cli.map {
        Some(path) => WaypointMap::from_csv(path, cli.max_s)?,
        None => WaypointMap::ring(cli.radius, 360)?,
    };
    let planner = HighwayPlanner::new(Arc::new(map), PlannerConfig::default())?;
    let config = SimulationConfig {
        traffic: cli.traffic,
        consumed_per_cycle: cli.consumed,
        seed: cli.seed,
        ..SimulationConfig::default()
    };
    let mut sim = HighwaySimulation::new(planner, config)?;

    let mut lane_changes = 0;
    let mut failed = 0;
    let mut closest = f64::INFINITY;
    for cycle in 0..cli.cycles {
        let lane = sim.session().lane;
        match sim.step() {
            Ok(outcome) if outcome.decision.lane != lane => {
                lane_changes += 1;
                log::info!(
                    "cycle {}: {} to lane {} at {:.1} mph (s {:.1})",
                    cycle,
                    outcome.decision.maneuver,
                    outcome.decision.lane,
                    outcome.decision.reference_speed,
                    sim.ego().s
                );
            }
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                log::warn!("cycle {} failed: {}", cycle, e);
            }
        }
        if let Some(gap) = sim.closest_in_lane() {
            closest = closest.min(gap);
        }
        if cycle % 500 == 0 {
            log::info!("cycle {}: {}, driving {:.1} mph", cycle, sim.session(), sim.ego().speed);
        }
    }

    let driven = Path2D::from_points(sim.trace().to_vec()).total_length();
    log::info!(
        "{} cycles: {:.0} m driven, {} lane changes, {} failed cycles, closest in-lane gap {:.1} m",
        cli.cycles,
        driven,
        lane_changes,
        failed,
        closest
    );

    if let Some(path) = &cli.plot {
        let mut vis = Visualizer::new();
        vis.set_title(&format!("Highway run, {} cycles", cli.cycles));
        sim.visualize(&mut vis);
        vis.focus(sim.ego().position(), 150.0);
        let file = path.to_string_lossy();
        if path.extension().map_or(false, |ext| ext == "svg") {
            vis.save_svg(&file, 1000, 1000)?;
        } else {
            vis.save_png(&file, 1000, 1000)?;
        }
        log::info!("plot saved to {}", file);
    }
    Ok(())
}
