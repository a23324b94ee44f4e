//! One planning cycle: prediction, behavior decision, trajectory synthesis
//!
//! `HighwayPlanner` is immutable and may be shared by every connected vehicle;
//! all per-vehicle state lives in the `SessionState` passed to each cycle.

use std::sync::Arc;

use crate::common::{
    BehaviorPolicy, EgoState, FrenetFrame, NeighborObservation, Path2D, PlannerConfig, PlannerResult,
};
use crate::mapping::WaypointMap;
use crate::mission_planning::{Decision, HighwayPolicy, SessionState};
use crate::path_planning::TrajectorySynthesizer;
use crate::prediction::{LaneClassification, NeighborPredictor};

/// Everything the simulator reports for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub ego: EgoState,
    /// Points of the last issued path the vehicle has not reached yet
    pub previous_path: Path2D,
    pub end_path_s: f64,
    pub end_path_d: f64,
    pub neighbors: Vec<NeighborObservation>,
}

impl Telemetry {
    /// Ego state as seen from the end of the committed path
    pub fn planning_ego(&self) -> EgoState {
        let mut ego = self.ego;
        if !self.previous_path.is_empty() {
            ego.s = self.end_path_s;
        }
        ego
    }
}

/// Result of one cycle, kept for logging and inspection
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub lanes: LaneClassification,
    pub decision: Decision,
    pub path: Path2D,
}

pub struct HighwayPlanner<P: BehaviorPolicy = HighwayPolicy> {
    map: Arc<WaypointMap>,
    config: PlannerConfig,
    predictor: NeighborPredictor,
    policy: P,
    synthesizer: TrajectorySynthesizer,
}

impl HighwayPlanner<HighwayPolicy> {
    pub fn new(map: Arc<WaypointMap>, config: PlannerConfig) -> PlannerResult<Self> {
        let policy = HighwayPolicy::new(config.clone());
        Self::with_policy(map, config, policy)
    }
}

impl<P: BehaviorPolicy> HighwayPlanner<P> {
    pub fn with_policy(map: Arc<WaypointMap>, config: PlannerConfig, policy: P) -> PlannerResult<Self> {
        config.validate()?;
        let predictor = NeighborPredictor::new(config.clone(), map.max_s());
        let synthesizer = TrajectorySynthesizer::new(config.clone());
        Ok(Self { map, config, predictor, policy, synthesizer })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn map(&self) -> &WaypointMap {
        &self.map
    }

    /// A session for a newly connected vehicle
    pub fn new_session(&self) -> SessionState {
        SessionState::for_config(&self.config)
    }

    /// Run one cycle. The session is only updated when a path was produced,
    /// so a failed cycle leaves the next one starting from the same state.
    pub fn plan_cycle(&self, session: &mut SessionState, telemetry: &Telemetry) -> PlannerResult<CycleOutcome> {
        let ego = telemetry.planning_ego();
        let prev_size = telemetry.previous_path.len();

        let lanes = self.predictor.classify(&telemetry.neighbors, session.lane, ego.s, prev_size);
        let decision = self.policy.decide(&ego, &lanes, session);
        let path = self.synthesizer.synthesize(
            self.map.as_ref(),
            &ego,
            &telemetry.previous_path,
            decision.lane,
            decision.reference_speed,
        )?;

        log::debug!(
            "cycle {}: s {:.1} prev {} {:?} -> {} to lane {} @ {:.2}",
            session.cycles,
            ego.s,
            prev_size,
            lanes,
            decision.maneuver,
            decision.lane,
            decision.reference_speed
        );
        session.apply(&decision);
        Ok(CycleOutcome { lanes, decision, path })
    }
}
