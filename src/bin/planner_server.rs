//! Planner server binary
//!
//! Loads the highway waypoint table and serves the driving simulator over a
//! WebSocket, one planning session per connected vehicle.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use highway_planner::bridge::Server;
use highway_planner::common::DEFAULT_MAX_S;
use highway_planner::{HighwayPlanner, PlannerConfig, WaypointMap};

#[derive(Parser)]
#[command(name = "planner_server")]
#[command(about = "Highway path planner for the driving simulator", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port the simulator connects to
    #[arg(long, default_value_t = 4567)]
    port: u16,

    /// Waypoint table, one `x y s dx dy` row per line
    #[arg(long, default_value = "data/highway_map.csv")]
    map: PathBuf,

    /// Track length at which s wraps back to 0
    #[arg(long, default_value_t = DEFAULT_MAX_S)]
    max_s: f64,

    /// Speed limit in telemetry units (mph)
    #[arg(long)]
    max_speed: Option<f64>,

    /// Minimum longitudinal gap to other vehicles [m]
    #[arg(long)]
    safety_gap: Option<f64>,

    /// Number of lanes
    #[arg(long)]
    lanes: Option<usize>,
}

impl Cli {
    fn config(&self) -> PlannerConfig {
        let defaults = PlannerConfig::default();
        PlannerConfig {
            max_speed: self.max_speed.unwrap_or(defaults.max_speed),
            safety_gap: self.safety_gap.unwrap_or(defaults.safety_gap),
            lane_count: self.lanes.unwrap_or(defaults.lane_count),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let map = WaypointMap::from_csv(&cli.map, cli.max_s)?;
    let planner = HighwayPlanner::new(Arc::new(map), cli.config())?;
    log::info!(
        "{} lanes, limit {:.1}, gap {:.1} m",
        planner.config().lane_count,
        planner.config().max_speed,
        planner.config().safety_gap
    );
    Server::run(Arc::new(planner), &cli.host, cli.port).await?;
    Ok(())
}
