//! Fitness metrics.
//!
//! A [`Metric`] reduces a prediction vector and a target vector to one
//! scalar. Non-finite predictions are not errors: any metric whose
//! accumulation turns non-finite reports its worst value, so degenerate
//! expressions lose selection without aborting the run.

use crate::stat::MeanVarianceCalculator;
use crate::Scalar;

/// Contract for fitness metrics.
///
/// `higher_is_better` exposes the metric's monotonicity; consumers that
/// require minimization (the evaluator does) negate accordingly.
pub trait Metric: Send + Sync {
    fn evaluate(&self, predicted: &[Scalar], actual: &[Scalar]) -> Scalar;

    fn higher_is_better(&self) -> bool {
        false
    }

    /// The value reported for degenerate inputs; also the sentinel used
    /// when evaluation is skipped.
    fn worst(&self) -> Scalar {
        if self.higher_is_better() {
            Scalar::NEG_INFINITY
        } else {
            Scalar::INFINITY
        }
    }

    fn name(&self) -> &'static str;
}

fn check_inputs(predicted: &[Scalar], actual: &[Scalar]) {
    assert_eq!(
        predicted.len(),
        actual.len(),
        "predicted and actual must have equal length"
    );
    assert!(!predicted.is_empty(), "metrics require at least one sample");
}

fn guard(value: f64, worst: Scalar) -> Scalar {
    let value = value as Scalar;
    if value.is_finite() {
        value
    } else {
        worst
    }
}

/// Mean squared error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Metric for MeanSquaredError {
    fn evaluate(&self, predicted: &[Scalar], actual: &[Scalar]) -> Scalar {
        check_inputs(predicted, actual);
        let sum: f64 = predicted
            .iter()
            .zip(actual)
            .map(|(&p, &a)| {
                let d = f64::from(p) - f64::from(a);
                d * d
            })
            .sum();
        guard(sum / predicted.len() as f64, self.worst())
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}

/// Mean absolute error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAbsoluteError;

impl Metric for MeanAbsoluteError {
    fn evaluate(&self, predicted: &[Scalar], actual: &[Scalar]) -> Scalar {
        check_inputs(predicted, actual);
        let sum: f64 = predicted
            .iter()
            .zip(actual)
            .map(|(&p, &a)| (f64::from(p) - f64::from(a)).abs())
            .sum();
        guard(sum / predicted.len() as f64, self.worst())
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

/// Mean squared error normalized by the target variance.
///
/// A value of 1 matches the constant mean predictor; lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMeanSquaredError;

impl Metric for NormalizedMeanSquaredError {
    fn evaluate(&self, predicted: &[Scalar], actual: &[Scalar]) -> Scalar {
        check_inputs(predicted, actual);
        let variance = MeanVarianceCalculator::of(actual).naive_variance();
        if variance <= 0.0 {
            return self.worst();
        }
        let mse = f64::from(MeanSquaredError.evaluate(predicted, actual));
        guard(mse / variance, self.worst())
    }

    fn name(&self) -> &'static str {
        "nmse"
    }
}

/// Coefficient of determination, `1 - ss_res / ss_tot`. Higher is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct RSquared;

impl Metric for RSquared {
    fn evaluate(&self, predicted: &[Scalar], actual: &[Scalar]) -> Scalar {
        check_inputs(predicted, actual);
        let ss_tot = MeanVarianceCalculator::of(actual).sum_of_squares();
        if ss_tot <= 0.0 {
            return self.worst();
        }
        let ss_res: f64 = predicted
            .iter()
            .zip(actual)
            .map(|(&p, &a)| {
                let d = f64::from(p) - f64::from(a);
                d * d
            })
            .sum();
        guard(1.0 - ss_res / ss_tot, self.worst())
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}
