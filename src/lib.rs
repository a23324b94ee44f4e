//! highway_planner - per-cycle motion planning for a multi-lane highway
//!
//! Every cycle the planner reads the vehicle state, the unconsumed tail of
//! its last path and the surrounding traffic, decides on a lane and a
//! reference speed, and emits the next fixed-length path.

// Core modules
pub mod common;
pub mod utils;

// Planning pipeline
pub mod mapping;
pub mod prediction;
pub mod mission_planning;
pub mod path_planning;
pub mod planner;

// Collaborators
pub mod bridge;
pub mod simulation;

// Re-export common types for convenience
pub use common::{EgoState, NeighborObservation, Path2D, Point2D, Pose2D};
pub use common::{BehaviorPolicy, FrenetFrame, PlannerConfig};
pub use common::{PlannerError, PlannerResult};
pub use mapping::WaypointMap;
pub use planner::{CycleOutcome, HighwayPlanner, Telemetry};
