//! Behavior decision policy
//!
//! A three-state lane policy (keep, shift left, shift right) re-evaluated from
//! scratch every cycle. Only the lane index and the reference speed carry
//! over, through `SessionState`.
//!
//! Rules, in order:
//! 1. Lane ahead blocked: shift left if that lane is free, else shift right if
//!    that lane is free, else follow the leader (slow down by one step while
//!    faster than it, otherwise match its speed).
//! 2. Lane ahead clear: drift one lane towards the center when the lane in
//!    between is free, and speed up by one step up to the limit.

use std::fmt;

use crate::common::{BehaviorPolicy, EgoState, PlannerConfig};
use crate::mission_planning::SessionState;
use crate::prediction::LaneClassification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    KeepLane,
    ShiftLeft,
    ShiftRight,
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Maneuver::KeepLane => "keep lane",
            Maneuver::ShiftLeft => "shift left",
            Maneuver::ShiftRight => "shift right",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub maneuver: Maneuver,
    pub lane: usize,
    pub reference_speed: f64,
}

/// Overtake when blocked, otherwise return to the center lane at full speed
#[derive(Debug, Clone)]
pub struct HighwayPolicy {
    config: PlannerConfig,
}

impl HighwayPolicy {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    fn clamp_speed(&self, speed: f64) -> f64 {
        speed.max(0.0).min(self.config.max_speed)
    }

    fn follow(&self, speed: f64, lead_speed: f64) -> f64 {
        if speed > lead_speed {
            self.clamp_speed(speed - self.config.acceleration_step)
        } else {
            self.clamp_speed(lead_speed)
        }
    }

    fn recenter(&self, lane: usize, lanes: &LaneClassification) -> Maneuver {
        let center = self.config.center_lane();
        if lane > center && !lanes.left_blocked {
            Maneuver::ShiftLeft
        } else if lane < center && !lanes.right_blocked {
            Maneuver::ShiftRight
        } else {
            Maneuver::KeepLane
        }
    }

    fn target_lane(&self, lane: usize, maneuver: Maneuver) -> usize {
        match maneuver {
            Maneuver::KeepLane => lane,
            Maneuver::ShiftLeft => lane.saturating_sub(1),
            Maneuver::ShiftRight => (lane + 1).min(self.config.lane_count - 1),
        }
    }
}

impl BehaviorPolicy for HighwayPolicy {
    fn decide(&self, _ego: &EgoState, lanes: &LaneClassification, session: &SessionState) -> Decision {
        let lane = session.lane.min(self.config.lane_count - 1);
        let speed = session.reference_speed;

        let (maneuver, reference_speed) = if lanes.ahead_blocked {
            if !lanes.left_blocked && lane > 0 {
                (Maneuver::ShiftLeft, speed)
            } else if !lanes.right_blocked && lane + 1 < self.config.lane_count {
                (Maneuver::ShiftRight, speed)
            } else {
                (Maneuver::KeepLane, self.follow(speed, lanes.lead_speed))
            }
        } else {
            let speed = self.clamp_speed(speed + self.config.acceleration_step);
            (self.recenter(lane, lanes), speed)
        };

        Decision {
            maneuver,
            lane: self.target_lane(lane, maneuver),
            reference_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 0.224;

    fn ego() -> EgoState {
        EgoState::new(0.0, 0.0, 100.0, 6.0, 0.0, 30.0)
    }

    fn blocked_ahead(lead_speed: f64) -> LaneClassification {
        LaneClassification { ahead_blocked: true, lead_speed, ..LaneClassification::default() }
    }

    #[test]
    fn test_free_road_accelerates_to_limit() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let mut session = SessionState::new(1, 0.0);
        let mut previous = session.reference_speed;
        for _ in 0..400 {
            let decision = policy.decide(&ego(), &LaneClassification::default(), &session);
            assert_eq!(decision.maneuver, Maneuver::KeepLane);
            session.apply(&decision);
            assert!(session.reference_speed - previous <= STEP + 1e-9);
            assert!(session.reference_speed <= 49.5);
            previous = session.reference_speed;
        }
        assert!((session.reference_speed - 49.5).abs() < 1e-9);
    }

    #[test]
    fn test_blocked_prefers_left_lane() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(1, 40.0);
        let decision = policy.decide(&ego(), &blocked_ahead(30.0), &session);
        assert_eq!(decision.maneuver, Maneuver::ShiftLeft);
        assert_eq!(decision.lane, 0);
        assert_eq!(decision.reference_speed, 40.0);
    }

    #[test]
    fn test_blocked_left_takes_right_lane() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(1, 40.0);
        let lanes = LaneClassification { left_blocked: true, ..blocked_ahead(30.0) };
        let decision = policy.decide(&ego(), &lanes, &session);
        assert_eq!(decision.maneuver, Maneuver::ShiftRight);
        assert_eq!(decision.lane, 2);
    }

    #[test]
    fn test_leftmost_lane_cannot_shift_left() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(0, 40.0);
        let decision = policy.decide(&ego(), &blocked_ahead(30.0), &session);
        assert_eq!(decision.lane, 1);
    }

    #[test]
    fn test_boxed_in_slows_down_by_one_step() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(1, 40.0);
        let lanes = LaneClassification { left_blocked: true, right_blocked: true, ..blocked_ahead(30.0) };
        let decision = policy.decide(&ego(), &lanes, &session);
        assert_eq!(decision.maneuver, Maneuver::KeepLane);
        assert_eq!(decision.lane, 1);
        assert!((decision.reference_speed - (40.0 - STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_boxed_in_behind_faster_leader_snaps_to_its_speed() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(2, 20.0);
        let lanes = LaneClassification { left_blocked: true, ..blocked_ahead(35.0) };
        let decision = policy.decide(&ego(), &lanes, &session);
        assert_eq!(decision.lane, 2);
        assert_eq!(decision.reference_speed, 35.0);
    }

    #[test]
    fn test_snap_never_exceeds_limit() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(0, 10.0);
        let lanes = LaneClassification { right_blocked: true, ..blocked_ahead(80.0) };
        let decision = policy.decide(&ego(), &lanes, &session);
        assert_eq!(decision.reference_speed, 49.5);
    }

    #[test]
    fn test_boxed_in_without_leader_speed_decays_gradually() {
        // lead_speed stays at its zero default: speed drops one step per cycle
        // and settles at zero instead of going negative
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let lanes = LaneClassification { left_blocked: true, right_blocked: true, ..blocked_ahead(0.0) };
        let mut session = SessionState::new(1, 0.5);
        session.apply(&policy.decide(&ego(), &lanes, &session));
        assert!((session.reference_speed - (0.5 - STEP)).abs() < 1e-9);
        session.apply(&policy.decide(&ego(), &lanes, &session));
        session.apply(&policy.decide(&ego(), &lanes, &session));
        assert_eq!(session.reference_speed, 0.0);
    }

    #[test]
    fn test_recenter_from_left_lane() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(0, 30.0);
        let decision = policy.decide(&ego(), &LaneClassification::default(), &session);
        assert_eq!(decision.maneuver, Maneuver::ShiftRight);
        assert_eq!(decision.lane, 1);
        assert!((decision.reference_speed - (30.0 + STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_recenter_waits_for_free_lane() {
        let policy = HighwayPolicy::new(PlannerConfig::default());
        let session = SessionState::new(2, 30.0);
        let lanes = LaneClassification { left_blocked: true, ..LaneClassification::default() };
        let decision = policy.decide(&ego(), &lanes, &session);
        assert_eq!(decision.maneuver, Maneuver::KeepLane);
        assert_eq!(decision.lane, 2);
    }

    #[test]
    fn test_lane_changes_one_step_on_wide_roads() {
        let policy = HighwayPolicy::new(PlannerConfig { lane_count: 5, ..PlannerConfig::default() });
        let mut session = SessionState::new(0, 30.0);
        let mut lanes_seen = vec![session.lane];
        for _ in 0..4 {
            session.apply(&policy.decide(&ego(), &LaneClassification::default(), &session));
            lanes_seen.push(session.lane);
        }
        assert_eq!(lanes_seen, vec![0, 1, 2, 2, 2]);
    }
}
