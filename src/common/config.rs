//! Planner configuration

use crate::common::error::{PlannerError, PlannerResult};

/// Track length of the simulator highway loop [m]
pub const DEFAULT_MAX_S: f64 = 6945.554;

/// Configuration shared by the predictor, the behavior policy and the
/// trajectory synthesizer
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Number of same-direction lanes
    pub lane_count: usize,
    /// Lane width [m]
    pub lane_width: f64,
    /// Upper bound of the reference speed [mph]
    pub max_speed: f64,
    /// Reference speed change per cycle [mph]
    pub acceleration_step: f64,
    /// Longitudinal gap below which a neighbor blocks a lane [m]
    pub safety_gap: f64,
    /// Time between consecutive path points [s]
    pub tick_duration: f64,
    /// Number of points in every issued path
    pub horizon_count: usize,
    /// Longitudinal distance between forward anchors [m]
    pub anchor_spacing: f64,
    /// Number of forward anchors placed in the target lane
    pub anchor_count: usize,
    /// Local-frame x distance used to pace the resampling [m]
    pub lookahead: f64,
    /// Metres per second for one telemetry speed unit
    pub mps_per_speed_unit: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            lane_width: 4.0,
            max_speed: 49.5,
            acceleration_step: 0.224,
            safety_gap: 30.0,
            tick_duration: 0.02,
            horizon_count: 50,
            anchor_spacing: 30.0,
            anchor_count: 3,
            lookahead: 30.0,
            mps_per_speed_unit: 1.0 / 2.24,
        }
    }
}

impl PlannerConfig {
    /// Lane index whose center is closest to the middle of the road
    pub fn center_lane(&self) -> usize {
        self.lane_count / 2
    }

    /// Lateral offset of a lane center
    pub fn lane_center_d(&self, lane: usize) -> f64 {
        self.lane_width * (lane as f64 + 0.5)
    }

    /// Lane index containing lateral offset `d`, or `None` when off-road
    pub fn lane_of(&self, d: f64) -> Option<usize> {
        let lane = (d / self.lane_width).floor();
        if lane >= 0.0 && lane < self.lane_count as f64 {
            Some(lane as usize)
        } else {
            None
        }
    }

    /// Convert telemetry speed units to metres per second
    pub fn to_mps(&self, speed: f64) -> f64 {
        speed * self.mps_per_speed_unit
    }

    /// Convert metres per second to telemetry speed units
    pub fn from_mps(&self, mps: f64) -> f64 {
        mps / self.mps_per_speed_unit
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.lane_count == 0 {
            return Err(PlannerError::InvalidParameter("lane_count must be at least 1".to_string()));
        }
        if self.horizon_count == 0 || self.anchor_count == 0 {
            return Err(PlannerError::InvalidParameter(
                "horizon_count and anchor_count must be at least 1".to_string(),
            ));
        }
        let positive = [
            ("lane_width", self.lane_width),
            ("max_speed", self.max_speed),
            ("acceleration_step", self.acceleration_step),
            ("safety_gap", self.safety_gap),
            ("tick_duration", self.tick_duration),
            ("anchor_spacing", self.anchor_spacing),
            ("lookahead", self.lookahead),
            ("mps_per_speed_unit", self.mps_per_speed_unit),
        ];
        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(PlannerError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
