//! Per-vehicle planning session
//!
//! The only values that survive from one cycle to the next. Every connected
//! vehicle owns its own instance; nothing here is shared between sessions.

use std::fmt;

use crate::common::PlannerConfig;
use crate::mission_planning::Decision;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    /// Target lane index, `0` is the leftmost lane
    pub lane: usize,
    /// Commanded speed in telemetry speed units
    pub reference_speed: f64,
    /// Number of planning cycles completed
    pub cycles: u64,
}

impl SessionState {
    pub fn new(lane: usize, reference_speed: f64) -> Self {
        Self { lane, reference_speed, cycles: 0 }
    }

    /// Fresh session: standing still in the center lane
    pub fn for_config(config: &PlannerConfig) -> Self {
        Self::new(config.center_lane(), 0.0)
    }

    pub fn apply(&mut self, decision: &Decision) {
        self.lane = decision.lane;
        self.reference_speed = decision.reference_speed;
        self.cycles += 1;
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {} @ {:.2}", self.lane, self.reference_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission_planning::Maneuver;

    #[test]
    fn test_fresh_session_starts_in_center_lane() {
        let session = SessionState::for_config(&PlannerConfig::default());
        assert_eq!(session.lane, 1);
        assert_eq!(session.reference_speed, 0.0);
    }

    #[test]
    fn test_apply_decision() {
        let mut session = SessionState::new(1, 20.0);
        session.apply(&Decision { maneuver: Maneuver::ShiftLeft, lane: 0, reference_speed: 20.0 });
        assert_eq!(session.lane, 0);
        assert_eq!(session.cycles, 1);
        assert_eq!(format!("{}", session), "lane 0 @ 20.00");
    }
}
