// Natural cubic spline y = f(x) through a set of knots
//
// Author: Atsushi Sakai(@Atsushi_twi)
//         TAI Lei
//         Ryohei Sasaki(@rsasaki0109)

extern crate nalgebra as na;

use crate::common::{PlannerError, PlannerResult};

/// Piecewise cubic `a + b*dx + c*dx^2 + d*dx^3` with zero curvature at both ends.
///
/// Knot `x` must be strictly increasing. Queries outside the knot range use the
/// cubic of the first or last segment.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

/// True when every element is larger than the one before it
pub fn is_strictly_increasing(x: &[f64]) -> bool {
    x.windows(2).all(|w| w[1] > w[0])
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> PlannerResult<CubicSpline> {
        let nx = x.len();
        if nx < 2 || nx != y.len() {
            return Err(PlannerError::InvalidParameter(format!(
                "spline needs at least 2 knots with matching x/y (got {} x, {} y)",
                nx,
                y.len()
            )));
        }
        if !is_strictly_increasing(x) {
            return Err(PlannerError::PlanningError(format!(
                "spline knots must be strictly increasing in x: {:?}",
                x
            )));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();
        let a_mat = CubicSpline::calc_a(&h);
        let b_vec = CubicSpline::calc_b(&h, &a);

        let c_na = a_mat
            .lu()
            .solve(&b_vec)
            .ok_or_else(|| PlannerError::NumericalError("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b: Vec<f64> = Vec::with_capacity(nx - 1);
        let mut d: Vec<f64> = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(CubicSpline { a, b, c, d, x: x.to_vec() })
    }

    pub fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// Segment index for `t`, clamped to the first and last segment
    fn search_index(&self, t: f64) -> usize {
        let segments = self.x.len() - 1;
        self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(segments - 1)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx.saturating_sub(2) {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_knots() {
        let x = [-1.0, 0.0, 30.0, 60.0, 90.0];
        let y = [0.1, 0.0, 2.0, 4.0, 4.0];
        let sp = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((sp.calc(*xi) - yi).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reproduces_straight_line() {
        let x = [0.0, 1.0, 3.0, 7.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let sp = CubicSpline::new(&x, &y).unwrap();
        for t in &[0.5, 2.0, 5.5, 6.9] {
            assert!((sp.calc(*t) - (2.0 * t + 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_natural_boundary_and_smoothness() {
        let x = [0.0, 10.0, 20.5, 30.0, 40.5, 50.0];
        let y = [0.0, -6.0, 5.0, 6.5, 0.0, -4.0];
        let sp = CubicSpline::new(&x, &y).unwrap();
        // zero curvature at both ends
        let h = 1e-3;
        for &end in &[0.0, 50.0] {
            let curvature = (sp.calc(end + h) - 2.0 * sp.calc(end) + sp.calc(end - h)) / (h * h);
            assert!(curvature.abs() < 1e-4, "curvature {} at {}", curvature, end);
        }
        // slope is continuous across an interior knot
        let eps = 1e-6;
        let left = (sp.calc(20.5) - sp.calc(20.5 - eps)) / eps;
        let right = (sp.calc(20.5 + eps) - sp.calc(20.5)) / eps;
        assert!((left - right).abs() < 1e-3);
    }

    #[test]
    fn test_two_knots_is_linear() {
        let sp = CubicSpline::new(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert!((sp.calc(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_monotonic_knots() {
        let result = CubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]);
        assert!(matches!(result, Err(PlannerError::PlanningError(_))));
        let result = CubicSpline::new(&[0.0, 0.0], &[0.0, 1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let result = CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]);
        assert!(matches!(result, Err(PlannerError::InvalidParameter(_))));
    }
}
