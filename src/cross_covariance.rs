//! Cross-covariance of the estimation errors of two local filters.
//!
//! Two filters tracking the same target with separate Kalman filters have
//! correlated errors through the shared process noise. The recursion here
//! carries that correlation from one step to the next:
//!
//! ```text
//! P_ij(k) = (I - K_i H_i) (F_i P_ij(k-1) F_i' + Q)^-1 (I - K_j H_j)'
//! ```

use crate::error::{ensure_shape, ConsistencyError, Result};
use crate::state_estimator::{LocalFilterStep, TrackOutput};
use log::{debug, trace};
use nalgebra::DMatrix;

/// Updated cross-covariance of the estimation errors of filters `i` and `j`.
///
/// `est_j.F` is only shape-checked. The inverse is applied through an LU
/// solve, so the result is the formula above up to rounding.
pub fn compute_cross_covariance(
    est_i: &LocalFilterStep,
    est_j: &LocalFilterStep,
    Q: &DMatrix<f64>,
    prev_cross_cov: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = prev_cross_cov.nrows();
    ensure_shape("cross covariance", (n, n), prev_cross_cov.shape())?;
    ensure_shape("transition matrix F_i", (n, n), est_i.F.shape())?;
    ensure_shape("transition matrix F_j", (n, n), est_j.F.shape())?;
    ensure_shape("process noise Q", (n, n), Q.shape())?;
    check_gain(est_i, n, ("measurement matrix H_i", "kalman gain K_i"))?;
    check_gain(est_j, n, ("measurement matrix H_j", "kalman gain K_j"))?;

    let I = DMatrix::<f64>::identity(n, n);
    let Jo_i = &I - &est_i.K * &est_i.H;
    let Jo_j = &I - &est_j.K * &est_j.H;

    let M = &est_i.F * prev_cross_cov * est_i.F.transpose() + Q;

    // M^-1 (I - K_j H_j)'
    let M_inv_Jo_j = M
        .lu()
        .solve(&Jo_j.transpose())
        .ok_or(ConsistencyError::SingularMatrix {
            operation: "propagated cross covariance",
        })?;
    if M_inv_Jo_j.iter().any(|v| !v.is_finite()) {
        return Err(ConsistencyError::SingularMatrix {
            operation: "propagated cross covariance",
        });
    }

    let cross_cov = Jo_i * M_inv_Jo_j;
    trace!("cross covariance: {}", cross_cov);
    Ok(cross_cov)
}

fn check_gain(est: &LocalFilterStep, n: usize, names: (&'static str, &'static str)) -> Result<()> {
    let m = est.H.nrows();
    ensure_shape(names.0, (m, n), est.H.shape())?;
    ensure_shape(names.1, (n, m), est.K.shape())
}

/// Threads the cross-covariance through a sequence of filter steps.
///
/// Each item of `steps` is `(step_i, step_j, Q)` for one time instant. The
/// iterator yields the cross-covariance after every step, and stops after
/// the first error. That error is tagged with the step index.
pub struct CrossCovarianceRecursion<I> {
    steps: I,
    cross_cov: DMatrix<f64>,
    k: usize,
    failed: bool,
}

impl<I> CrossCovarianceRecursion<I> {
    pub fn new(initial: DMatrix<f64>, steps: I) -> Self {
        CrossCovarianceRecursion {
            steps,
            cross_cov: initial,
            k: 0,
            failed: false,
        }
    }

    /// Start from a zero cross-covariance of dimension `n`
    pub fn from_zero(n: usize, steps: I) -> Self {
        Self::new(DMatrix::zeros(n, n), steps)
    }

    /// Most recent cross-covariance, or the initial value before the first step
    pub fn current(&self) -> &DMatrix<f64> {
        &self.cross_cov
    }
}

impl<'a, I> Iterator for CrossCovarianceRecursion<I>
where
    I: Iterator<Item = (&'a LocalFilterStep, &'a LocalFilterStep, &'a DMatrix<f64>)>,
{
    type Item = Result<DMatrix<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (step_i, step_j, Q) = self.steps.next()?;
        let k = self.k;
        self.k += 1;
        match compute_cross_covariance(step_i, step_j, Q, &self.cross_cov) {
            Ok(cross_cov) => {
                self.cross_cov = cross_cov.clone();
                Some(Ok(cross_cov))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.at_step(k)))
            }
        }
    }
}

/// Cross-covariance at every step of two recorded tracks sharing the
/// process noise `Q`.
pub fn cross_covariance_for_tracks<T, U>(
    track_i: &T,
    track_j: &U,
    Q: &DMatrix<f64>,
    initial: DMatrix<f64>,
) -> Result<Vec<DMatrix<f64>>>
where
    T: TrackOutput,
    U: TrackOutput,
{
    let (len_i, len_j) = (track_i.num_steps(), track_j.num_steps());
    if len_i != len_j {
        return Err(ConsistencyError::LengthMismatch {
            left: len_i,
            right: len_j,
        });
    }
    debug!("cross covariance recursion over {} steps", len_i);

    let steps = (0..len_i).map(|k| (track_i.filter_step(k), track_j.filter_step(k), Q));
    CrossCovarianceRecursion::new(initial, steps).collect()
}
