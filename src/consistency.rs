//! Filter consistency metrics.
//!
//! NEES compares an estimate against ground truth, normalized by the
//! covariance the filter reported. For a consistent filter with state
//! dimension `n` its expectation is `n`, so the average over many steps or
//! Monte-Carlo runs (ANEES) should land close to `n`.

pub mod bounds;

use crate::config::{ConsistencyConfig, LengthPolicy};
use crate::error::{ensure_shape, ConsistencyError, Result};
use crate::state_estimator::{GaussParams, GroundTruthState, TrackOutput};
use bounds::{anees_bounds, AcceptanceInterval};
use itertools::izip;
use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};

pub trait Consistency {
    type GroundTruth;

    fn NEES(&self, x_gt: &Self::GroundTruth) -> Result<f64>;
}

impl Consistency for GaussParams {
    type GroundTruth = GroundTruthState;

    fn NEES(&self, x_gt: &GroundTruthState) -> Result<f64> {
        let n = self.x.len();
        ensure_shape("ground truth state", (n, 1), x_gt.x.shape())?;
        let x_err = &self.x - &x_gt.x;
        normalized_error_squared(&x_err, &self.P, "estimate covariance")
    }
}

/// `d' P^-1 d` through the Cholesky factor `P = L L'`: solve `L y = d` by
/// forward substitution and sum the squares of `y`.
fn normalized_error_squared(
    d: &DVector<f64>,
    P: &DMatrix<f64>,
    operation: &'static str,
) -> Result<f64> {
    let n = d.len();
    ensure_shape(operation, (n, n), P.shape())?;
    let chol = P.clone().cholesky().ok_or(ConsistencyError::NotPositiveDefinite)?;
    let y = chol
        .l()
        .solve_lower_triangular(d)
        .ok_or(ConsistencyError::NotPositiveDefinite)?;
    Ok(y.norm_squared())
}

/// NEES of a single estimate against its ground truth
pub fn nees(estimate: &GaussParams, x_gt: &GroundTruthState) -> Result<f64> {
    estimate.NEES(x_gt)
}

/// Normalized innovation squared, `v' S^-1 v`
pub fn nis(innovation: &DVector<f64>, S: &DMatrix<f64>) -> Result<f64> {
    normalized_error_squared(innovation, S, "innovation covariance")
}

/// NEES at every step. The sequences must have equal length; a failing step
/// is reported as `AtStep`.
pub fn compute_nees(estimates: &[GaussParams], truths: &[GroundTruthState]) -> Result<Vec<f64>> {
    compute_nees_with(estimates, truths, &ConsistencyConfig::default())
}

/// NEES at every step, pairing the sequences according to
/// `config.length_policy`
pub fn compute_nees_with(
    estimates: &[GaussParams],
    truths: &[GroundTruthState],
    config: &ConsistencyConfig,
) -> Result<Vec<f64>> {
    check_lengths(estimates.len(), truths.len(), config.length_policy)?;
    nees_sequence(izip!(estimates, truths))
}

/// NEES at every step of a recorded track
pub fn nees_for_track<T: TrackOutput>(
    track: &T,
    truths: &[GroundTruthState],
    config: &ConsistencyConfig,
) -> Result<Vec<f64>> {
    check_lengths(track.num_steps(), truths.len(), config.length_policy)?;
    nees_sequence((0..track.num_steps()).map(|k| track.estimate(k)).zip(truths))
}

fn check_lengths(num_estimates: usize, num_truths: usize, policy: LengthPolicy) -> Result<()> {
    if num_estimates == num_truths {
        return Ok(());
    }
    match policy {
        LengthPolicy::FailFast => Err(ConsistencyError::LengthMismatch {
            left: num_estimates,
            right: num_truths,
        }),
        LengthPolicy::Truncate => {
            warn!(
                "{} estimates vs {} ground truths, truncating to {}",
                num_estimates,
                num_truths,
                num_estimates.min(num_truths)
            );
            Ok(())
        }
    }
}

fn nees_sequence<'a, I>(pairs: I) -> Result<Vec<f64>>
where
    I: Iterator<Item = (&'a GaussParams, &'a GroundTruthState)>,
{
    let nees = pairs
        .enumerate()
        .map(|(k, (estimate, x_gt))| {
            let value = estimate.NEES(x_gt).map_err(|e| e.at_step(k))?;
            trace!("NEES[{}] = {}", k, value);
            Ok(value)
        })
        .collect::<Result<Vec<f64>>>()?;
    debug!("computed NEES over {} steps", nees.len());
    Ok(nees)
}

/// Arithmetic mean of a NEES sequence. Empty input is an error, never NaN.
pub fn compute_anees(nees: &[f64]) -> Result<f64> {
    if nees.is_empty() {
        return Err(ConsistencyError::EmptyInput);
    }
    Ok(nees.iter().sum::<f64>() / nees.len() as f64)
}

/// Per-step NEES averaged over independent Monte-Carlo runs
pub fn average_nees_over_runs(runs: &[Vec<f64>]) -> Result<Vec<f64>> {
    let first = runs.first().ok_or(ConsistencyError::EmptyInput)?;
    let steps = first.len();
    if let Some(run) = runs.iter().find(|run| run.len() != steps) {
        return Err(ConsistencyError::LengthMismatch {
            left: steps,
            right: run.len(),
        });
    }
    let m = runs.len() as f64;
    let averaged = (0..steps)
        .map(|k| runs.iter().map(|run| run[k]).sum::<f64>() / m)
        .collect();
    Ok(averaged)
}

/// ANEES together with its chi-square acceptance interval
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub anees: f64,
    pub bounds: AcceptanceInterval,
    pub dim: usize,
    pub num_samples: usize,
}

impl ConsistencyReport {
    /// Report for a NEES sequence of a state with dimension `dim`
    pub fn evaluate(nees: &[f64], dim: usize, config: &ConsistencyConfig) -> Result<Self> {
        let anees = compute_anees(nees)?;
        Self::from_anees(anees, dim, nees.len(), config)
    }

    /// Report for an ANEES that averages `num_samples` independent NEES values
    pub fn from_anees(
        anees: f64,
        dim: usize,
        num_samples: usize,
        config: &ConsistencyConfig,
    ) -> Result<Self> {
        config.validate()?;
        let bounds = anees_bounds(dim, num_samples, config.confidence)?;
        let report = ConsistencyReport {
            anees,
            bounds,
            dim,
            num_samples,
        };
        if report.is_consistent() {
            debug!("ANEES {:.3} within [{:.3}, {:.3}]", anees, bounds.lower, bounds.upper);
        } else {
            warn!(
                "ANEES {:.3} outside [{:.3}, {:.3}] at {} confidence",
                anees, bounds.lower, bounds.upper, bounds.confidence
            );
        }
        Ok(report)
    }

    pub fn is_consistent(&self) -> bool {
        self.bounds.contains(self.anees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gauss(x: &[f64], P: DMatrix<f64>) -> GaussParams {
        GaussParams::new(DVector::from_row_slice(x), P)
    }

    fn truth(x: &[f64]) -> GroundTruthState {
        GroundTruthState::new(DVector::from_row_slice(x))
    }

    #[test]
    fn test_nees_known_1d() {
        let estimate = gauss(&[5.], DMatrix::from_element(1, 1, 4.));
        let value = nees(&estimate, &truth(&[3.])).unwrap();
        assert_relative_eq!(value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nees_matches_mahalanobis() {
        let P = DMatrix::from_row_slice(2, 2, &[2., 0.5, 0.5, 1.]);
        let estimate = gauss(&[1., -1.], P.clone());
        let x_gt = truth(&[0., 0.5]);
        let d = &estimate.x - &x_gt.x;
        let expected = d.dot(&(P.try_inverse().unwrap() * &d));
        assert_relative_eq!(nees(&estimate, &x_gt).unwrap(), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_nees_zero_when_exact() {
        let P = DMatrix::from_diagonal_element(4, 4, 0.3);
        let estimates: Vec<_> = (0..5).map(|k| gauss(&[k as f64, 1., 2., 3.], P.clone())).collect();
        let truths: Vec<_> = estimates.iter().map(|e| GroundTruthState::new(e.x.clone())).collect();
        let values = compute_nees(&estimates, &truths).unwrap();
        assert_eq!(values.len(), 5);
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nees_non_negative() {
        let P = DMatrix::from_row_slice(2, 2, &[1., 0.9, 0.9, 1.]);
        let estimates: Vec<_> = (0..10)
            .map(|k| gauss(&[(k as f64).sin(), (k as f64).cos()], P.clone()))
            .collect();
        let truths: Vec<_> = (0..10).map(|k| truth(&[0.1 * k as f64, -0.2])).collect();
        let values = compute_nees(&estimates, &truths).unwrap();
        assert!(values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_nees_dimension_mismatch() {
        let estimate = gauss(&[1., 2.], DMatrix::identity(3, 3));
        let err = compute_nees(&[estimate], &[truth(&[1., 2.])]).unwrap_err();
        assert_eq!(err.step(), Some(0));
        assert!(matches!(err.root(), ConsistencyError::DimensionMismatch { .. }));

        let estimate = gauss(&[1., 2.], DMatrix::identity(2, 2));
        let err = nees(&estimate, &truth(&[1., 2., 3.])).unwrap_err();
        assert!(matches!(err, ConsistencyError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_nees_not_positive_definite_reports_step() {
        let good = gauss(&[1.], DMatrix::from_element(1, 1, 1.));
        let bad = gauss(&[1.], DMatrix::from_element(1, 1, -1.));
        let truths = vec![truth(&[0.]); 3];
        let err = compute_nees(&[good.clone(), good, bad], &truths).unwrap_err();
        assert_eq!(err.step(), Some(2));
        assert_eq!(err.root(), &ConsistencyError::NotPositiveDefinite);
    }

    #[test]
    fn test_length_policy() {
        let estimates = vec![gauss(&[1.], DMatrix::from_element(1, 1, 1.)); 3];
        let truths = vec![truth(&[0.]); 2];
        assert_eq!(
            compute_nees(&estimates, &truths),
            Err(ConsistencyError::LengthMismatch { left: 3, right: 2 })
        );
        let config = ConsistencyConfig {
            length_policy: LengthPolicy::Truncate,
            ..ConsistencyConfig::default()
        };
        let values = compute_nees_with(&estimates, &truths, &config).unwrap();
        assert_eq!(values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_loaded_config_controls_pairing() {
        let estimates = vec![gauss(&[2.], DMatrix::from_element(1, 1, 1.)); 4];
        let truths = vec![truth(&[0.]); 3];

        let strict = ConsistencyConfig::from_json_str("{}").unwrap();
        assert_eq!(
            compute_nees_with(&estimates, &truths, &strict),
            Err(ConsistencyError::LengthMismatch { left: 4, right: 3 })
        );

        let lenient = ConsistencyConfig::from_json_str(r#"{"length_policy": "truncate"}"#).unwrap();
        assert_eq!(
            compute_nees_with(&estimates, &truths, &lenient).unwrap(),
            vec![4.0, 4.0, 4.0]
        );
    }

    #[test]
    fn test_nis() {
        let v = DVector::from_row_slice(&[2., 0.]);
        let S = DMatrix::from_diagonal_element(2, 2, 4.);
        assert_relative_eq!(nis(&v, &S).unwrap(), 1.0, epsilon = 1e-12);
        assert!(nis(&v, &DMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn test_anees() {
        assert_relative_eq!(compute_anees(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert_eq!(compute_anees(&[]), Err(ConsistencyError::EmptyInput));
    }

    #[test]
    fn test_average_over_runs() {
        let runs = vec![vec![1., 2., 3.], vec![3., 4., 5.]];
        assert_eq!(average_nees_over_runs(&runs).unwrap(), vec![2., 3., 4.]);
        assert_eq!(average_nees_over_runs(&[]), Err(ConsistencyError::EmptyInput));
        assert_eq!(
            average_nees_over_runs(&[vec![1.], vec![1., 2.]]),
            Err(ConsistencyError::LengthMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn test_report() {
        let config = ConsistencyConfig::default();
        let report = ConsistencyReport::evaluate(&[2.0; 50], 2, &config).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.num_samples, 50);

        let report = ConsistencyReport::evaluate(&[20.0; 50], 2, &config).unwrap();
        assert!(!report.is_consistent());

        let report = ConsistencyReport::evaluate(&[0.1; 50], 2, &config).unwrap();
        assert!(!report.is_consistent());
    }
}
