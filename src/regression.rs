//! Single-predictor least-squares regression and residual diagnostics.
//!
//! [`LinearModel::fit`] is the closed-form ordinary least squares estimator
//! (unweighted, with intercept). The sum-of-squares helpers and the
//! gradient-descent utilities are independent of it and take any line.

use crate::error::{HeadroomError, HeadroomResult};
use crate::stats::mean;
use crate::types::LinearModel;

impl LinearModel {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// The model produced by degenerate input
    pub fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    /// Fit `y = slope * x + intercept` by ordinary least squares.
    ///
    /// Fewer than two points, mismatched lengths or zero variance in `x`
    /// produce [`HeadroomError::DegenerateRegression`].
    pub fn try_fit(x: &[f64], y: &[f64]) -> HeadroomResult<Self> {
        if x.len() != y.len() {
            return Err(HeadroomError::degenerate_regression(
                x.len().min(y.len()),
                format!("x has {} values but y has {}", x.len(), y.len()),
            ));
        }
        let n = x.len();
        if n < 2 {
            return Err(HeadroomError::degenerate_regression(n, "need at least two points"));
        }

        let x_mean = mean(x);
        let y_mean = mean(y);

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            sxy += dx * (yi - y_mean);
            sxx += dx * dx;
        }

        if sxx == 0.0 {
            return Err(HeadroomError::degenerate_regression(n, "x has zero variance"));
        }

        let slope = sxy / sxx;
        Ok(Self::new(slope, y_mean - slope * x_mean))
    }

    /// Like [`LinearModel::try_fit`] but yields an all-NaN model on degenerate input
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        Self::try_fit(x, y).unwrap_or_else(|_| Self::undefined())
    }

    pub fn is_defined(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// The `x` at which the line reaches `y`, `None` for a flat or undefined line
    pub fn x_at(&self, y: f64) -> Option<f64> {
        if !self.is_defined() || self.slope == 0.0 {
            return None;
        }
        let x = (y - self.intercept) / self.slope;
        x.is_finite().then_some(x)
    }
}

/// Residual sum of squares, Σ(y − ŷ)²
pub fn sse(x: &[f64], y: &[f64], model: &LinearModel) -> f64 {
    x.iter()
        .zip(y)
        .map(|(xi, yi)| {
            let d = yi - model.predict(*xi);
            d * d
        })
        .sum()
}

/// Total sum of squares about the mean of `y`
pub fn sst(y: &[f64]) -> f64 {
    let m = mean(y);
    y.iter().map(|yi| (yi - m) * (yi - m)).sum()
}

/// Σ((y − ŷ) − (y − ȳ))².
///
/// This compares each residual against the deviation from the mean. It is
/// not the textbook regression sum of squares and `sst != sse + ssr` in general.
pub fn ssr(x: &[f64], y: &[f64], model: &LinearModel) -> f64 {
    let m = mean(y);
    x.iter()
        .zip(y)
        .map(|(xi, yi)| {
            let residual = yi - model.predict(*xi);
            let deviation = yi - m;
            let d = residual - deviation;
            d * d
        })
        .sum()
}

/// Mean squared residual, 1/N · Σ(y − (m·x + c))²
pub fn cost(x: &[f64], y: &[f64], model: &LinearModel) -> f64 {
    sse(x, y, model) / x.len() as f64
}

/// Partial derivatives of [`cost`] with respect to slope and intercept
pub fn gradient(x: &[f64], y: &[f64], model: &LinearModel) -> (f64, f64) {
    let mut d_slope = 0.0;
    let mut d_intercept = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let d = yi - model.predict(*xi);
        d_slope -= xi * d;
        d_intercept -= d;
    }
    let n = x.len() as f64;
    (2.0 / n * d_slope, 2.0 / n * d_intercept)
}

/// Iteratively fit a line by plain gradient descent on [`cost`].
///
/// Returns `initial` untouched for empty input.
pub fn gradient_descent(
    x: &[f64],
    y: &[f64],
    initial: LinearModel,
    learning_rate: f64,
    iterations: usize,
) -> LinearModel {
    if x.is_empty() {
        return initial;
    }
    let mut model = initial;
    for _ in 0..iterations {
        let (d_slope, d_intercept) = gradient(x, y, &model);
        model.slope -= learning_rate * d_slope;
        model.intercept -= learning_rate * d_intercept;
    }
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn fits_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let model = LinearModel::fit(&x, &y);
        assert!((model.slope - 2.0).abs() < EPS);
        assert!((model.intercept - 1.0).abs() < EPS);
        assert!(sse(&x, &y, &model).abs() < EPS);
    }

    #[test]
    fn fit_minimizes_squared_residuals() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.2, 7.8, 10.1];
        let model = LinearModel::fit(&x, &y);
        let best = sse(&x, &y, &model);
        for (ds, di) in [(0.01, 0.0), (-0.01, 0.0), (0.0, 0.01), (0.0, -0.01)] {
            let nudged = LinearModel::new(model.slope + ds, model.intercept + di);
            assert!(sse(&x, &y, &nudged) > best);
        }
        // gradient vanishes at the optimum
        let (gs, gi) = gradient(&x, &y, &model);
        assert!(gs.abs() < 1e-9 && gi.abs() < 1e-9);
    }

    #[test]
    fn line_passes_through_centroid() {
        let x = [10.0, 20.0, 35.0, 50.0];
        let y = [12.0, 19.0, 33.0, 41.0];
        let model = LinearModel::fit(&x, &y);
        assert!((model.predict(mean(&x)) - mean(&y)).abs() < EPS);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(matches!(
            LinearModel::try_fit(&[1.0], &[2.0]),
            Err(HeadroomError::DegenerateRegression { points: 1, .. })
        ));
        assert!(matches!(
            LinearModel::try_fit(&[], &[]),
            Err(HeadroomError::DegenerateRegression { points: 0, .. })
        ));
        assert!(matches!(
            LinearModel::try_fit(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]),
            Err(HeadroomError::DegenerateRegression { points: 3, .. })
        ));
        assert!(LinearModel::try_fit(&[1.0, 2.0], &[1.0]).is_err());

        let model = LinearModel::fit(&[3.0, 3.0], &[1.0, 2.0]);
        assert!(model.slope.is_nan() && model.intercept.is_nan());
        assert!(!model.is_defined());
        assert_eq!(model.x_at(100.0), None);
    }

    #[test]
    fn x_at_crossing() {
        let model = LinearModel::new(2.0, 1.0);
        assert_eq!(model.x_at(100.0), Some(49.5));
        assert_eq!(LinearModel::new(0.0, 5.0).x_at(100.0), None);
    }

    #[test]
    fn sum_of_squares_helpers() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 6.0];
        let model = LinearModel::new(1.0, 1.0);
        // residuals 0, 0, 3
        assert!((sse(&x, &y, &model) - 9.0).abs() < EPS);
        // mean 3 → deviations -2, -1, 3
        assert!((sst(&y) - 14.0).abs() < EPS);
        // (0 - -2)^2 + (0 - -1)^2 + (3 - 3)^2
        assert!((ssr(&x, &y, &model) - 5.0).abs() < EPS);
        assert!((cost(&x, &y, &model) - 3.0).abs() < EPS);
    }

    #[test]
    fn gradient_matches_hand_computation() {
        let x = [1.0, 2.0];
        let y = [3.0, 5.0];
        let model = LinearModel::new(0.0, 0.0);
        // residuals 3, 5 → dm = 2/2 * -(1*3 + 2*5) = -13, dc = 2/2 * -(3 + 5) = -8
        let (dm, dc) = gradient(&x, &y, &model);
        assert!((dm + 13.0).abs() < EPS);
        assert!((dc + 8.0).abs() < EPS);
    }

    #[test]
    fn gradient_descent_converges_to_closed_form() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.2, 2.8, 5.1, 7.0, 8.9];
        let closed = LinearModel::fit(&x, &y);
        let iterative = gradient_descent(&x, &y, LinearModel::new(0.0, 0.0), 0.05, 5_000);
        assert!((iterative.slope - closed.slope).abs() < 1e-6);
        assert!((iterative.intercept - closed.intercept).abs() < 1e-6);
    }

    #[test]
    fn gradient_descent_ignores_empty_input() {
        let start = LinearModel::new(1.0, 2.0);
        assert_eq!(gradient_descent(&[], &[], start, 0.1, 10), start);
    }
}
