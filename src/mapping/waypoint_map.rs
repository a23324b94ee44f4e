//! Waypoint map of the highway centerline
//!
//! Holds the static `s, x, y, dx, dy` table of a closed track and converts
//! between Frenet `(s, d)` road coordinates and world `(x, y)`.
//!
//! A query `s` is wrapped into `[0, max_s)`; the segment whose `s` bracket
//! contains it (including the closing segment from the last waypoint back to
//! the first) is interpolated linearly in `s`, then offset by `d` along the
//! waypoint normals blended across the segment. At a waypoint the offset
//! direction is exactly that waypoint's normal, so lanes stay continuous
//! from one segment to the next and across the wrap at `max_s`.

use std::f64::consts::PI;
use std::path::Path;

use itertools::Itertools;
use nalgebra::Vector2;
use ordered_float::OrderedFloat;
use serde::Deserialize;

use crate::common::{FrenetFrame, Path2D, PlannerError, PlannerResult, Point2D, Visualizable};
use crate::utils::{colors, PathStyle, Visualizer};

/// Blended normals shorter than this are treated as degenerate
const MIN_NORMAL: f64 = 1e-9;
/// Tolerance on the segment parameter when locating a point
const SEGMENT_SLACK: f64 = 1e-9;

/// One centerline sample. Field order follows the map file columns.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    /// Arc length along the centerline
    pub s: f64,
    /// Unit normal towards increasing `d`
    pub dx: f64,
    pub dy: f64,
}

impl Waypoint {
    pub fn new(s: f64, x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, s, dx, dy }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.s, self.dx, self.dy].iter().all(|v| v.is_finite())
    }
}

/// A centerline segment between two consecutive waypoints
struct Segment<'a> {
    start: &'a Waypoint,
    end: &'a Waypoint,
    length: f64,
}

impl<'a> Segment<'a> {
    fn chord(&self) -> Vector2<f64> {
        self.end.position().to_vector() - self.start.position().to_vector()
    }

    /// Waypoint normals blended by `t`, not normalized
    fn blended_normal(&self, t: f64) -> Vector2<f64> {
        Vector2::new(self.start.dx, self.start.dy) * (1.0 - t) + Vector2::new(self.end.dx, self.end.dy) * t
    }

    /// Unit normal at parameter `t`, towards increasing `d`
    fn normal(&self, t: f64) -> Vector2<f64> {
        let n = self.blended_normal(t);
        if n.norm() > MIN_NORMAL {
            return n.normalize();
        }
        // opposite normals cancel out; fall back to the chord perpendicular
        let chord = self.chord();
        let perp = Vector2::new(chord[1], -chord[0]).normalize();
        if perp.dot(&Vector2::new(self.start.dx, self.start.dy)) < 0.0 {
            -perp
        } else {
            perp
        }
    }

    fn point(&self, t: f64, d: f64) -> Vector2<f64> {
        self.start.position().to_vector() + self.chord() * t + self.normal(t) * d
    }

    /// Parameters `t` at which the normal line through the centerline passes
    /// through `p`. Roots of `(q - t*u) x (n0 + t*w) = 0`.
    fn normal_roots(&self, p: Vector2<f64>) -> Vec<f64> {
        let q = p - self.start.position().to_vector();
        let u = self.chord();
        let n0 = self.blended_normal(0.0);
        let w = self.blended_normal(1.0) - n0;

        let a = -u.perp(&w);
        let b = q.perp(&w) - u.perp(&n0);
        let c = q.perp(&n0);
        if a.abs() < 1e-12 {
            return if b.abs() < 1e-12 { vec![] } else { vec![-c / b] };
        }
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return vec![];
        }
        let k = -0.5 * (b + b.signum() * disc.sqrt());
        if k == 0.0 {
            vec![0.0]
        } else {
            vec![k / a, c / k]
        }
    }

    /// Frenet `(t, d)` of `p` on this segment, if `p` lies on a normal line
    /// through it
    fn locate(&self, p: Vector2<f64>) -> Option<(f64, f64)> {
        self.normal_roots(p)
            .into_iter()
            .filter(|t| *t >= -SEGMENT_SLACK && *t <= 1.0 + SEGMENT_SLACK)
            .map(|t| {
                let foot = self.start.position().to_vector() + self.chord() * t;
                (t, (p - foot).dot(&self.normal(t)))
            })
            .min_by_key(|(_, d)| OrderedFloat(d.abs()))
    }
}

/// Read-only table of centerline waypoints ordered by `s`
#[derive(Debug, Clone)]
pub struct WaypointMap {
    waypoints: Vec<Waypoint>,
    max_s: f64,
}

impl WaypointMap {
    /// Build a map from waypoints ordered by strictly increasing `s`
    pub fn new(waypoints: Vec<Waypoint>, max_s: f64) -> PlannerResult<Self> {
        if waypoints.len() < 2 {
            return Err(PlannerError::MapError(format!(
                "need at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if let Some(i) = waypoints.iter().position(|w| !w.is_finite()) {
            return Err(PlannerError::MapError(format!("waypoint {} is not finite", i)));
        }
        if let Some((i, _)) = waypoints
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b.s <= a.s)
        {
            return Err(PlannerError::MapError(format!(
                "waypoint s must be strictly increasing (index {})",
                i + 1
            )));
        }
        let last_s = waypoints[waypoints.len() - 1].s;
        if !(max_s.is_finite() && max_s > last_s) {
            return Err(PlannerError::MapError(format!(
                "max_s {} must exceed the last waypoint s {}",
                max_s, last_s
            )));
        }
        Ok(Self { waypoints, max_s })
    }

    /// Load whitespace separated `x y s dx dy` rows
    pub fn from_csv<P: AsRef<Path>>(path: P, max_s: f64) -> PlannerResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b' ')
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        let mut waypoints = Vec::new();
        for row in reader.deserialize() {
            let waypoint: Waypoint = row?;
            waypoints.push(waypoint);
        }
        let map = Self::new(waypoints, max_s)?;
        log::info!(
            "loaded {} waypoints from {} (max_s {:.3})",
            map.len(),
            path.as_ref().display(),
            map.max_s
        );
        Ok(map)
    }

    /// Closed counter-clockwise circle; `d` grows outwards and `s` is the
    /// cumulative chord length, so `max_s` is the polygon perimeter.
    pub fn ring(radius: f64, count: usize) -> PlannerResult<Self> {
        if count < 3 || !(radius > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "ring needs radius > 0 and at least 3 waypoints (radius {}, count {})",
                radius, count
            )));
        }
        let step = 2.0 * PI / count as f64;
        let chord = 2.0 * radius * (step / 2.0).sin();
        let waypoints = (0..count)
            .map(|i| {
                let theta = step * i as f64;
                Waypoint::new(
                    chord * i as f64,
                    radius * theta.cos(),
                    radius * theta.sin(),
                    theta.cos(),
                    theta.sin(),
                )
            })
            .collect();
        Self::new(waypoints, chord * count as f64)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Wrap any longitudinal coordinate into `[0, max_s)`
    pub fn wrap_s(&self, s: f64) -> f64 {
        s.rem_euclid(self.max_s)
    }

    fn segment(&self, index: usize) -> Segment<'_> {
        let start = &self.waypoints[index];
        let end = &self.waypoints[(index + 1) % self.waypoints.len()];
        let mut length = end.s - start.s;
        if length <= 0.0 {
            length += self.max_s;
        }
        Segment { start, end, length }
    }

    /// Index of the waypoint that starts the segment containing `s`
    fn segment_index(&self, s: f64) -> usize {
        let after = self.waypoints.partition_point(|w| w.s <= s);
        if after == 0 {
            self.waypoints.len() - 1
        } else {
            after - 1
        }
    }

    fn closest_waypoint(&self, point: Point2D) -> usize {
        self.waypoints
            .iter()
            .position_min_by_key(|w| OrderedFloat(w.position().distance(&point)))
            .unwrap_or(0)
    }

    /// Closest point of the segment chord: (parameter, distance)
    fn project(&self, index: usize, point: Point2D) -> (f64, f64) {
        let segment = self.segment(index);
        let a = segment.start.position().to_vector();
        let ab = segment.chord();
        let t = ((point.to_vector() - a).dot(&ab) / ab.norm_squared()).max(0.0).min(1.0);
        let foot = a + ab * t;
        (t, (point.to_vector() - foot).norm())
    }
}

impl FrenetFrame for WaypointMap {
    fn to_cartesian(&self, s: f64, d: f64) -> Point2D {
        let s = self.wrap_s(s);
        let segment = self.segment(self.segment_index(s));
        let mut along = s - segment.start.s;
        if along < 0.0 {
            along += self.max_s;
        }
        Point2D::from(segment.point(along / segment.length, d))
    }

    fn to_frenet(&self, point: Point2D) -> (f64, f64) {
        let n = self.waypoints.len();
        let closest = self.closest_waypoint(point);
        let before = (closest + n - 1) % n;
        let p = point.to_vector();

        // on ties the segment starting at the closest waypoint wins
        let located = [closest, before]
            .iter()
            .filter_map(|&i| self.segment(i).locate(p).map(|(t, d)| (i, t, d)))
            .min_by_key(|(_, _, d)| OrderedFloat(d.abs()));
        let (index, t, d) = match located {
            Some(found) => found,
            None => {
                // off every normal line of both segments: nearest chord point
                let index = [closest, before]
                    .iter()
                    .copied()
                    .min_by_key(|&i| OrderedFloat(self.project(i, point).1))
                    .unwrap_or(closest);
                let segment = self.segment(index);
                let (t, _) = self.project(index, point);
                let foot = segment.start.position().to_vector() + segment.chord() * t;
                (index, t, (p - foot).dot(&segment.normal(t)))
            }
        };
        let segment = self.segment(index);
        (self.wrap_s(segment.start.s + t * segment.length), d)
    }

    fn max_s(&self) -> f64 {
        self.max_s
    }
}

impl Visualizable for WaypointMap {
    fn visualize(&self, vis: &mut Visualizer) {
        let (mut x, mut y): (Vec<f64>, Vec<f64>) =
            self.waypoints.iter().map(|w| (w.x, w.y)).unzip();
        x.push(self.waypoints[0].x);
        y.push(self.waypoints[0].y);
        vis.plot_path_xy(&x, &y, &PathStyle::new(colors::CENTERLINE, "Centerline").with_line_width(1.0));
    }
}

/// Draw closed lines at constant lateral offsets (lane boundaries)
pub fn plot_lane_edges(vis: &mut Visualizer, map: &WaypointMap, offsets: &[f64]) {
    for &d in offsets {
        let edge = Path2D::from_points(
            map.waypoints
                .iter()
                .chain(map.waypoints.first())
                .map(|w| map.to_cartesian(w.s, d))
                .collect(),
        );
        vis.plot_path(&edge, &PathStyle::new(colors::LANE_EDGE, "").with_line_width(0.5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_map() -> WaypointMap {
        let waypoints = (0..10)
            .map(|i| Waypoint::new(10.0 * i as f64, 10.0 * i as f64, 0.0, 0.0, -1.0))
            .collect();
        WaypointMap::new(waypoints, 100.0).unwrap()
    }

    #[test]
    fn test_rejects_empty_map() {
        assert!(matches!(WaypointMap::new(vec![], 10.0), Err(PlannerError::MapError(_))));
    }

    #[test]
    fn test_rejects_unordered_s() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0, -1.0),
            Waypoint::new(5.0, 5.0, 0.0, 0.0, -1.0),
            Waypoint::new(5.0, 10.0, 0.0, 0.0, -1.0),
        ];
        assert!(WaypointMap::new(waypoints, 20.0).is_err());
    }

    #[test]
    fn test_rejects_short_max_s() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0, -1.0),
            Waypoint::new(5.0, 5.0, 0.0, 0.0, -1.0),
        ];
        assert!(WaypointMap::new(waypoints, 5.0).is_err());
    }

    #[test]
    fn test_to_cartesian_straight() {
        let map = straight_map();
        // normals point to -y, so positive d is to the right of +x travel
        let p = map.to_cartesian(25.0, 6.0);
        assert!((p.x - 25.0).abs() < 1e-9);
        assert!((p.y + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_frenet_round_trip_straight() {
        let map = straight_map();
        for &(s, d) in &[(13.0, 2.0), (41.5, 6.0), (77.0, 10.0)] {
            let p = map.to_cartesian(s, d);
            let (s2, d2) = map.to_frenet(p);
            assert!((s2 - s).abs() < 1e-6, "s {} -> {}", s, s2);
            assert!((d2 - d).abs() < 1e-6, "d {} -> {}", d, d2);
        }
    }

    #[test]
    fn test_frenet_round_trip_ring() {
        let map = WaypointMap::ring(200.0, 72).unwrap();
        let max_s = map.max_s();
        for i in 0..40 {
            let s = max_s * i as f64 / 40.0 + 1.3;
            for &d in &[0.5, 2.0, 6.0, 10.0, 11.5] {
                let p = map.to_cartesian(s, d);
                let (s2, d2) = map.to_frenet(p);
                let ds = (s2 - map.wrap_s(s)).abs();
                assert!(ds < 1e-6 || (max_s - ds) < 1e-6, "s {} -> {}", s, s2);
                assert!((d2 - d).abs() < 1e-6, "d {} -> {}", d, d2);
            }
        }
    }

    #[test]
    fn test_ring_lateral_offset_is_outwards() {
        let map = WaypointMap::ring(100.0, 36).unwrap();
        let center = map.to_cartesian(0.0, 0.0);
        let outside = map.to_cartesian(0.0, 6.0);
        assert!((center.distance(&Point2D::origin()) - 100.0).abs() < 1e-9);
        assert!((outside.distance(&Point2D::origin()) - 106.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_around_is_continuous() {
        let map = WaypointMap::ring(150.0, 50).unwrap();
        let max_s = map.max_s();
        let before = map.to_cartesian(max_s - 0.5, 6.0);
        let after = map.to_cartesian(0.5, 6.0);
        let beyond = map.to_cartesian(max_s + 0.5, 6.0);
        assert!(before.distance(&after) < 1.5);
        assert!(after.distance(&beyond) < 1e-9);
    }

    #[test]
    fn test_lanes_are_continuous_across_waypoints() {
        let map = WaypointMap::ring(150.0, 50).unwrap();
        let max_s = map.max_s();
        for &d in &[2.0, 6.0, 10.0] {
            let before = map.to_cartesian(max_s - 1e-6, d);
            let after = map.to_cartesian(1e-6, d);
            assert!(before.distance(&after) < 1e-4, "wrap gap {} at d {}", before.distance(&after), d);
            for k in &[1, 10, 49] {
                let s = map.waypoints()[*k].s;
                let before = map.to_cartesian(s - 1e-6, d);
                let after = map.to_cartesian(s + 1e-6, d);
                assert!(before.distance(&after) < 1e-4, "gap {} at waypoint {}", before.distance(&after), k);
            }
        }
    }

    #[test]
    fn test_offset_at_waypoint_follows_its_normal() {
        let map = WaypointMap::ring(150.0, 50).unwrap();
        let w = map.waypoints()[7];
        let p = map.to_cartesian(w.s, 4.0);
        assert!((p.x - (w.x + 4.0 * w.dx)).abs() < 1e-9);
        assert!((p.y - (w.y + 4.0 * w.dy)).abs() < 1e-9);
        let (s, d) = map.to_frenet(p);
        assert!((s - w.s).abs() < 1e-6);
        assert!((d - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_csv() {
        let dir = std::env::temp_dir().join("highway_planner_map_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.csv");
        std::fs::write(
            &path,
            "784.6001 1135.571 0 -0.02359831 -0.9997216\n\
             815.2679 1134.93 30.6744785308838 -0.01099479 -0.9999396\n\
             844.6398 1134.911 60.0463714599609 -0.002048373 -0.9999979\n",
        )
        .unwrap();
        let map = WaypointMap::from_csv(&path, 6945.554).unwrap();
        assert_eq!(map.len(), 3);
        assert!((map.waypoints()[1].s - 30.6744785308838).abs() < 1e-9);
        assert!((map.waypoints()[0].dy + 0.9997216).abs() < 1e-9);
    }

    #[test]
    fn test_from_csv_missing_file() {
        let result = WaypointMap::from_csv("does/not/exist.csv", 100.0);
        assert!(result.is_err());
    }
}
