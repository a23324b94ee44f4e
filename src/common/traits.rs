//! Common traits defining the seams of the planning pipeline

use crate::common::types::*;
use crate::mission_planning::{Decision, SessionState};
use crate::prediction::LaneClassification;

/// Road-relative coordinate frame (Frenet `s`, `d`) over a closed track
pub trait FrenetFrame {
    /// Map a longitudinal/lateral road coordinate to world coordinates
    fn to_cartesian(&self, s: f64, d: f64) -> Point2D;

    /// Map a world point to the road coordinate of its nearest segment
    fn to_frenet(&self, point: Point2D) -> (f64, f64);

    /// Track length after which `s` wraps back to zero
    fn max_s(&self) -> f64;
}

/// Discrete lane/speed decision re-evaluated every planning cycle
pub trait BehaviorPolicy {
    fn decide(&self, ego: &EgoState, lanes: &LaneClassification, session: &SessionState) -> Decision;
}

/// Trait for things that can draw themselves
pub trait Visualizable {
    /// Draw current state to visualizer
    fn visualize(&self, vis: &mut crate::utils::Visualizer);
}
