//! Neighbor prediction
//!
//! Projects every tracked vehicle forward by the duration of the path that is
//! already committed, then classifies it against the ego lane. Both sides of
//! each comparison therefore refer to the instant the new path segment begins.

use crate::common::{NeighborObservation, PlannerConfig};

/// Occupancy of the ego lane and its two neighbors for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaneClassification {
    pub ahead_blocked: bool,
    pub left_blocked: bool,
    pub right_blocked: bool,
    /// Speed of the blocking vehicle ahead, in telemetry speed units.
    /// Zero when nothing blocks the lane.
    pub lead_speed: f64,
}

/// Where a neighbor sits relative to the ego lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeLane {
    Same,
    Left,
    Right,
    Other,
}

#[derive(Debug, Clone)]
pub struct NeighborPredictor {
    config: PlannerConfig,
    track_length: f64,
}

impl NeighborPredictor {
    /// `track_length` is the `s` at which the road wraps back to zero
    pub fn new(config: PlannerConfig, track_length: f64) -> Self {
        Self { config, track_length }
    }

    /// `s` of the neighbor after `prev_size` ticks at constant speed
    pub fn predict_s(&self, car: &NeighborObservation, prev_size: usize) -> f64 {
        car.s + prev_size as f64 * self.config.tick_duration * car.speed()
    }

    /// Signed longitudinal distance from `ego_s` to `other_s`, taking the
    /// shorter way around the track
    pub fn gap(&self, ego_s: f64, other_s: f64) -> f64 {
        let half = self.track_length / 2.0;
        (other_s - ego_s + half).rem_euclid(self.track_length) - half
    }

    pub fn relative_lane(&self, ego_lane: usize, lane: usize) -> RelativeLane {
        if lane == ego_lane {
            RelativeLane::Same
        } else if lane + 1 == ego_lane {
            RelativeLane::Left
        } else if lane == ego_lane + 1 {
            RelativeLane::Right
        } else {
            RelativeLane::Other
        }
    }

    pub fn classify(
        &self,
        neighbors: &[NeighborObservation],
        ego_lane: usize,
        ego_s: f64,
        prev_size: usize,
    ) -> LaneClassification {
        let safety_gap = self.config.safety_gap;
        let mut lanes = LaneClassification::default();

        for car in neighbors {
            let lane = match self.config.lane_of(car.d) {
                Some(lane) => lane,
                None => continue,
            };
            let gap = self.gap(ego_s, self.predict_s(car, prev_size));

            match self.relative_lane(ego_lane, lane) {
                RelativeLane::Same => {
                    if gap > 0.0 && gap < safety_gap {
                        lanes.ahead_blocked = true;
                        lanes.lead_speed = self.config.from_mps(car.speed());
                    }
                }
                RelativeLane::Left => lanes.left_blocked |= gap.abs() < safety_gap,
                RelativeLane::Right => lanes.right_blocked |= gap.abs() < safety_gap,
                RelativeLane::Other => {}
            }
        }
        lanes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: f64 = 6945.554;

    fn predictor() -> NeighborPredictor {
        NeighborPredictor::new(PlannerConfig::default(), TRACK)
    }

    fn car_at(s: f64, d: f64, speed: f64) -> NeighborObservation {
        NeighborObservation::new(0, 0.0, 0.0, speed, 0.0, s, d)
    }

    #[test]
    fn test_predict_s_uses_committed_duration() {
        let car = NeighborObservation::new(3, 0.0, 0.0, 6.0, 8.0, 100.0, 6.0);
        // 40 points * 0.02 s * 10 m/s
        assert!((predictor().predict_s(&car, 40) - 108.0).abs() < 1e-9);
    }

    #[test]
    fn test_car_ahead_within_gap_blocks() {
        let lanes = predictor().classify(&[car_at(120.0, 6.0, 10.0)], 1, 100.0, 0);
        assert!(lanes.ahead_blocked);
        assert!(!lanes.left_blocked && !lanes.right_blocked);
        assert!((lanes.lead_speed - 22.4).abs() < 1e-9);
    }

    #[test]
    fn test_car_behind_or_far_ahead_does_not_block() {
        let cars = [car_at(90.0, 6.0, 10.0), car_at(140.0, 6.0, 10.0)];
        let lanes = predictor().classify(&cars, 1, 100.0, 0);
        assert!(!lanes.ahead_blocked);
        assert_eq!(lanes.lead_speed, 0.0);
    }

    #[test]
    fn test_projection_moves_car_out_of_gap() {
        // 25 m ahead now, 25 + 50 * 0.02 * 10 = 35 m ahead once the path ends
        let lanes = predictor().classify(&[car_at(125.0, 6.0, 10.0)], 1, 100.0, 50);
        assert!(!lanes.ahead_blocked);
    }

    #[test]
    fn test_adjacent_lanes_block_both_directions() {
        let cars = [car_at(80.0, 2.0, 20.0), car_at(115.0, 10.0, 20.0)];
        let lanes = predictor().classify(&cars, 1, 100.0, 0);
        assert!(lanes.left_blocked);
        assert!(lanes.right_blocked);
        assert!(!lanes.ahead_blocked);
    }

    #[test]
    fn test_two_lanes_away_is_ignored() {
        let lanes = predictor().classify(&[car_at(100.0, 10.0, 20.0)], 0, 100.0, 0);
        assert_eq!(lanes, LaneClassification::default());
    }

    #[test]
    fn test_off_road_neighbors_are_filtered() {
        let cars = [car_at(110.0, -2.0, 5.0), car_at(110.0, 12.5, 5.0)];
        let lanes = predictor().classify(&cars, 0, 100.0, 0);
        assert_eq!(lanes, LaneClassification::default());
        let lanes = predictor().classify(&cars, 2, 100.0, 0);
        assert_eq!(lanes, LaneClassification::default());
    }

    #[test]
    fn test_last_blocking_car_sets_lead_speed() {
        let cars = [car_at(110.0, 6.0, 10.0), car_at(105.0, 6.0, 5.0)];
        let lanes = predictor().classify(&cars, 1, 100.0, 0);
        assert!((lanes.lead_speed - 11.2).abs() < 1e-9);
    }

    #[test]
    fn test_gap_wraps_around_track() {
        let p = predictor();
        assert!((p.gap(TRACK - 10.0, 5.0) - 15.0).abs() < 1e-9);
        assert!((p.gap(5.0, TRACK - 10.0) + 15.0).abs() < 1e-9);

        let lanes = p.classify(&[car_at(5.0, 6.0, 10.0)], 1, TRACK - 10.0, 0);
        assert!(lanes.ahead_blocked);
    }
}
