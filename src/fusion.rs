use crate::error::{ensure_shape, ConsistencyError, Result};
use crate::state_estimator::GaussParams;
use log::trace;
use nalgebra::DMatrix;

/// Bar-Shalom–Campo fusion of two track estimates with error
/// cross-covariance `P_ij`.
///
/// With `U = P_i + P_j - P_ij - P_ij'`:
///
/// ```text
/// x = x_i + (P_i - P_ij) U^-1 (x_j - x_i)
/// P = P_i - (P_i - P_ij) U^-1 (P_i - P_ij)'
/// ```
pub fn fuse(est_i: &GaussParams, est_j: &GaussParams, P_ij: &DMatrix<f64>) -> Result<GaussParams> {
    let n = est_i.dim();
    ensure_shape("state x_j", (n, 1), est_j.x.shape())?;
    ensure_shape("covariance P_i", (n, n), est_i.P.shape())?;
    ensure_shape("covariance P_j", (n, n), est_j.P.shape())?;
    ensure_shape("cross covariance P_ij", (n, n), P_ij.shape())?;

    let U = &est_i.P + &est_j.P - P_ij - P_ij.transpose();
    let A = &est_i.P - P_ij;

    let lu = U.lu();
    let singular = || ConsistencyError::SingularMatrix {
        operation: "fusion innovation covariance",
    };
    // U^-1 (x_j - x_i) and U^-1 A'
    let U_inv_dx = lu.solve(&(&est_j.x - &est_i.x)).ok_or_else(singular)?;
    let U_inv_At = lu.solve(&A.transpose()).ok_or_else(singular)?;

    let x = &est_i.x + &A * U_inv_dx;
    let P = &est_i.P - &A * U_inv_At;
    if x.iter().chain(P.iter()).any(|v| !v.is_finite()) {
        return Err(singular());
    }
    trace!("fused estimate: x = {}", x);

    Ok(GaussParams::new(x, P))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn test_independent_equal_tracks() {
        let P = DMatrix::identity(2, 2) * 2.;
        let est_i = GaussParams::new(DVector::from_row_slice(&[0., 0.]), P.clone());
        let est_j = GaussParams::new(DVector::from_row_slice(&[2., 4.]), P);
        let fused = fuse(&est_i, &est_j, &DMatrix::zeros(2, 2)).unwrap();

        assert!(fused.x.relative_eq(&DVector::from_row_slice(&[1., 2.]), 1e-12, 1e-12));
        assert!(fused.P.relative_eq(&DMatrix::identity(2, 2), 1e-12, 1e-12));
    }

    #[test]
    fn test_correlation_reduces_gain() {
        let est_i = GaussParams::new(DVector::from_element(1, 0.), DMatrix::from_element(1, 1, 1.));
        let est_j = GaussParams::new(DVector::from_element(1, 1.), DMatrix::from_element(1, 1, 4.));

        let independent = fuse(&est_i, &est_j, &DMatrix::zeros(1, 1)).unwrap();
        let correlated = fuse(&est_i, &est_j, &DMatrix::from_element(1, 1, 0.5)).unwrap();

        // (1 - 0)/(1 + 4) = 0.2 versus (1 - 0.5)/(1 + 4 - 1) = 0.125
        assert!((independent.x[0] - 0.2).abs() < 1e-12);
        assert!((correlated.x[0] - 0.125).abs() < 1e-12);
        assert!(correlated.P[(0, 0)] > independent.P[(0, 0)]);
    }

    #[test]
    fn test_identical_tracks_are_singular() {
        let est = GaussParams::new(DVector::from_row_slice(&[1.]), DMatrix::from_element(1, 1, 1.));
        let err = fuse(&est, &est, &est.P).unwrap_err();
        assert!(matches!(err, ConsistencyError::SingularMatrix { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let est_i = GaussParams::new(DVector::zeros(2), DMatrix::identity(2, 2));
        let est_j = GaussParams::new(DVector::zeros(3), DMatrix::identity(3, 3));
        let err = fuse(&est_i, &est_j, &DMatrix::zeros(2, 2)).unwrap_err();
        assert!(matches!(err, ConsistencyError::DimensionMismatch { .. }));
    }
}
