//! Closed-loop highway simulation
//!
//! Stands in for the driving simulator: every cycle the ego vehicle drives a
//! fixed number of points of the last issued path, traffic advances at
//! constant speed in its lane, and the planner receives the resulting
//! telemetry. Used by the offline `highway_sim` binary and by tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::common::{
    EgoState, FrenetFrame, NeighborObservation, Path2D, PlannerError, PlannerResult, Point2D, Visualizable,
};
use crate::mapping::plot_lane_edges;
use crate::mission_planning::SessionState;
use crate::planner::{CycleOutcome, HighwayPlanner, Telemetry};
use crate::utils::{colors, PathStyle, PointStyle, Visualizer};

/// Configuration for the offline simulation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of traffic vehicles
    pub traffic: usize,
    /// Path points the ego vehicle drives between two planning cycles
    pub consumed_per_cycle: usize,
    /// Mean traffic speed [m/s]
    pub traffic_speed: f64,
    /// Standard deviation of traffic speed [m/s]
    pub traffic_speed_std: f64,
    /// Traffic is never spawned closer than this to the ego start [m]
    pub spawn_clearance: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            traffic: 12,
            consumed_per_cycle: 5,
            traffic_speed: 18.0,
            traffic_speed_std: 2.0,
            spawn_clearance: 40.0,
            seed: 42,
        }
    }
}

/// A traffic vehicle following its lane center at constant speed
#[derive(Debug, Clone, Copy)]
pub struct SimulatedCar {
    pub id: i64,
    pub s: f64,
    pub d: f64,
    /// [m/s]
    pub speed: f64,
}

impl SimulatedCar {
    pub fn observe<F: FrenetFrame>(&self, map: &F) -> NeighborObservation {
        let here = map.to_cartesian(self.s, self.d);
        let ahead = map.to_cartesian(self.s + 1.0, self.d);
        let heading = (ahead.y - here.y).atan2(ahead.x - here.x);
        NeighborObservation::new(
            self.id,
            here.x,
            here.y,
            self.speed * heading.cos(),
            self.speed * heading.sin(),
            self.s,
            self.d,
        )
    }
}

pub struct HighwaySimulation {
    planner: HighwayPlanner,
    config: SimulationConfig,
    session: SessionState,
    ego: EgoState,
    pending: Path2D,
    traffic: Vec<SimulatedCar>,
    trace: Vec<Point2D>,
}

impl HighwaySimulation {
    pub fn new(planner: HighwayPlanner, config: SimulationConfig) -> PlannerResult<Self> {
        if config.consumed_per_cycle == 0 {
            return Err(PlannerError::InvalidParameter(
                "consumed_per_cycle must be at least 1".to_string(),
            ));
        }
        let session = planner.new_session();
        let map = planner.map();
        let d = planner.config().lane_center_d(session.lane);
        let start = map.to_cartesian(0.0, d);
        let ahead = map.to_cartesian(1.0, d);
        let yaw = (ahead.y - start.y).atan2(ahead.x - start.x);
        let ego = EgoState::new(start.x, start.y, 0.0, d, yaw, 0.0);

        let traffic = Self::spawn_traffic(&planner, &config)?;
        Ok(Self {
            planner,
            config,
            session,
            ego,
            pending: Path2D::new(),
            traffic,
            trace: vec![start],
        })
    }

    fn spawn_traffic(planner: &HighwayPlanner, config: &SimulationConfig) -> PlannerResult<Vec<SimulatedCar>> {
        let max_s = planner.map().max_s();
        if config.traffic > 0 && max_s <= 2.0 * config.spawn_clearance {
            return Err(PlannerError::InvalidParameter(format!(
                "track of {:.1} m is too short for a spawn clearance of {:.1} m",
                max_s, config.spawn_clearance
            )));
        }
        let speeds = Normal::new(config.traffic_speed, config.traffic_speed_std)
            .map_err(|e| PlannerError::InvalidParameter(format!("traffic speed: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let lanes = planner.config().lane_count;
        Ok((0..config.traffic)
            .map(|i| SimulatedCar {
                id: i as i64,
                s: rng.gen_range(config.spawn_clearance..max_s - config.spawn_clearance),
                d: planner.config().lane_center_d(rng.gen_range(0..lanes)),
                speed: speeds.sample(&mut rng).max(0.0),
            })
            .collect())
    }

    pub fn telemetry(&self) -> Telemetry {
        let map = self.planner.map();
        let (end_path_s, end_path_d) = self.pending.last().map(|p| map.to_frenet(*p)).unwrap_or((0.0, 0.0));
        Telemetry {
            ego: self.ego,
            previous_path: self.pending.clone(),
            end_path_s,
            end_path_d,
            neighbors: self.traffic.iter().map(|car| car.observe(map)).collect(),
        }
    }

    /// Plan once, then drive the vehicle and the traffic forward
    pub fn step(&mut self) -> PlannerResult<CycleOutcome> {
        let telemetry = self.telemetry();
        let outcome = self.planner.plan_cycle(&mut self.session, &telemetry)?;
        self.drive(&outcome.path);
        Ok(outcome)
    }

    fn drive(&mut self, path: &Path2D) {
        let consumed = self.config.consumed_per_cycle.min(path.len());
        let tick = self.planner.config().tick_duration;
        let max_s = self.planner.map().max_s();

        if consumed > 0 {
            let before = if consumed >= 2 { path.points[consumed - 2] } else { self.ego.position() };
            let here = path.points[consumed - 1];
            let step = here.distance(&before);
            let yaw = if step > 0.0 { (here.y - before.y).atan2(here.x - before.x) } else { self.ego.yaw };
            let (s, d) = self.planner.map().to_frenet(here);
            let speed = self.planner.config().from_mps(step / tick);
            self.ego = EgoState::new(here.x, here.y, s, d, yaw, speed);
            self.trace.extend_from_slice(&path.points[..consumed]);
        }
        self.pending = Path2D::from_points(path.points[consumed..].to_vec());

        let elapsed = consumed as f64 * tick;
        for car in self.traffic.iter_mut() {
            car.s = (car.s + car.speed * elapsed).rem_euclid(max_s);
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn ego(&self) -> &EgoState {
        &self.ego
    }

    pub fn traffic(&self) -> &[SimulatedCar] {
        &self.traffic
    }

    pub fn pending(&self) -> &Path2D {
        &self.pending
    }

    /// Every point the ego vehicle has driven through
    pub fn trace(&self) -> &[Point2D] {
        &self.trace
    }

    pub fn planner(&self) -> &HighwayPlanner {
        &self.planner
    }

    /// Distance to the closest traffic vehicle in the ego lane, either way
    pub fn closest_in_lane(&self) -> Option<f64> {
        let config = self.planner.config();
        let max_s = self.planner.map().max_s();
        let lane = config.lane_of(self.ego.d)?;
        self.traffic
            .iter()
            .filter(|car| config.lane_of(car.d) == Some(lane))
            .map(|car| {
                let gap = (car.s - self.ego.s).rem_euclid(max_s);
                gap.min(max_s - gap)
            })
            .fold(None, |best: Option<f64>, gap| Some(best.map_or(gap, |b| b.min(gap))))
    }
}

impl Visualizable for HighwaySimulation {
    fn visualize(&self, vis: &mut Visualizer) {
        let map = self.planner.map();
        let config = self.planner.config();
        map.visualize(vis);
        let edges: Vec<f64> = (0..=config.lane_count).map(|lane| lane as f64 * config.lane_width).collect();
        plot_lane_edges(vis, map, &edges);

        let trace = Path2D::from_points(self.trace.clone());
        vis.plot_path(&trace, &PathStyle::new(colors::TRACE, "Driven").with_line_width(1.5));
        vis.plot_path(&self.pending, &PathStyle::new(colors::PLANNED, "Planned"));
        let cars: Vec<Point2D> = self.traffic.iter().map(|car| map.to_cartesian(car.s, car.d)).collect();
        vis.plot_points(&cars, &PointStyle::new(colors::TRAFFIC, "Traffic").with_size(1.5).with_symbol('S'));
        vis.plot_vehicle(&self.ego.pose(), 1.5);
    }
}
