//! Trajectory synthesis
//!
//! Turns a lane/speed decision into the next fixed-length path.
//!
//! The unconsumed tail of the previous path is kept verbatim. A local frame is
//! anchored at its last point (or at the vehicle on cold start), with the x
//! axis along the current heading. Two continuity points and a few forward
//! anchors in the target lane are expressed in that frame, where the path is
//! a single-valued `y = f(x)` fitted by a natural cubic spline. The spline is
//! then sampled at a constant x step chosen so consecutive points are one
//! tick apart at the reference speed, and mapped back to world coordinates.
//!
//! The frame trick only holds while the anchors are strictly increasing in
//! local x; anything else is reported as a planning error.

use crate::common::{EgoState, FrenetFrame, Path2D, PlannerConfig, PlannerError, PlannerResult, Point2D, Pose2D};

use super::cubic_spline::{is_strictly_increasing, CubicSpline};

/// Shortest tail segment that still defines a heading [m]
const MIN_HEADING_BASELINE: f64 = 1e-6;

/// Local frame and fitting anchors of one cycle
#[derive(Debug, Clone)]
pub struct AnchorSet {
    /// Origin and heading of the local frame
    pub frame: Pose2D,
    /// Anchors in world coordinates, continuity points first
    pub points: Vec<Point2D>,
}

impl AnchorSet {
    pub fn to_local(&self) -> (Vec<f64>, Vec<f64>) {
        self.points.iter().map(|p| self.frame.to_local(*p)).map(|p| (p.x, p.y)).unzip()
    }
}

#[derive(Debug, Clone)]
pub struct TrajectorySynthesizer {
    config: PlannerConfig,
}

impl TrajectorySynthesizer {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Reference frame and the two points that keep heading continuous
    pub fn reference(&self, ego: &EgoState, previous: &Path2D) -> (Pose2D, [Point2D; 2]) {
        let prev_size = previous.len();
        if prev_size < 2 {
            let behind = Point2D::new(ego.x - ego.yaw.cos(), ego.y - ego.yaw.sin());
            (ego.pose(), [behind, ego.position()])
        } else {
            let last = previous.points[prev_size - 1];
            let before = previous.points[prev_size - 2];
            if last.distance(&before) < MIN_HEADING_BASELINE {
                // standing still: the tail carries no heading
                let behind = Point2D::new(last.x - ego.yaw.cos(), last.y - ego.yaw.sin());
                return (Pose2D::new(last.x, last.y, ego.yaw), [behind, last]);
            }
            let yaw = (last.y - before.y).atan2(last.x - before.x);
            (Pose2D::new(last.x, last.y, yaw), [before, last])
        }
    }

    /// Continuity points followed by forward anchors in the center of `lane`
    pub fn anchors<F: FrenetFrame>(&self, map: &F, ego: &EgoState, previous: &Path2D, lane: usize) -> AnchorSet {
        let (frame, continuity) = self.reference(ego, previous);
        let d = self.config.lane_center_d(lane);
        let mut points = continuity.to_vec();
        points.extend(
            (1..=self.config.anchor_count)
                .map(|k| map.to_cartesian(ego.s + k as f64 * self.config.anchor_spacing, d)),
        );
        AnchorSet { frame, points }
    }

    /// Local x increment between consecutive new points at `reference_speed`
    pub fn step_x(&self, spline: &CubicSpline, reference_speed: f64) -> f64 {
        let target_x = self.config.lookahead;
        let target_dist = target_x.hypot(spline.calc(target_x));
        let per_tick = self.config.tick_duration * self.config.to_mps(reference_speed.max(0.0));
        if target_dist > 0.0 {
            target_x * per_tick / target_dist
        } else {
            0.0
        }
    }

    /// Build the next `horizon_count` points
    pub fn synthesize<F: FrenetFrame>(
        &self,
        map: &F,
        ego: &EgoState,
        previous: &Path2D,
        lane: usize,
        reference_speed: f64,
    ) -> PlannerResult<Path2D> {
        let horizon = self.config.horizon_count;
        let anchors = self.anchors(map, ego, previous, lane);
        let (xs, ys) = anchors.to_local();
        if !is_strictly_increasing(&xs) {
            log::warn!(
                "anchors not monotonic in the local frame (yaw {:.3}): {:?}",
                anchors.frame.yaw,
                xs
            );
            return Err(PlannerError::PlanningError(
                "anchors are not strictly increasing in the local frame".to_string(),
            ));
        }
        let spline = CubicSpline::new(&xs, &ys)?;

        let mut path = Path2D::with_capacity(horizon);
        path.points.extend(previous.points.iter().take(horizon).copied());

        let step_x = self.step_x(&spline, reference_speed);
        let missing = horizon - path.len();
        for i in 1..=missing {
            let x = step_x * i as f64;
            let local = Point2D::new(x, spline.calc(x));
            path.push(anchors.frame.to_global(local));
        }
        Ok(path)
    }
}
