use super::DynamicModel;
use nalgebra::DMatrix;

/// Nearly constant velocity in `ndim` spatial dimensions.
///
/// State ordering is interleaved, `[x, vx, y, vy, ...]`, with one
/// independent white-acceleration block per dimension.
#[derive(Debug, Clone)]
pub struct ConstantVelocity {
    // Acceleration noise standard deviation
    sigma_a: f64,
    ndim: usize,
}

impl ConstantVelocity {
    pub fn new(sigma_a: f64, ndim: usize) -> Self {
        ConstantVelocity { sigma_a, ndim }
    }
}

impl DynamicModel for ConstantVelocity {
    fn state_dim(&self) -> usize {
        2 * self.ndim
    }

    fn F(&self, ts: f64) -> DMatrix<f64> {
        let n = self.state_dim();
        let mut F = DMatrix::<f64>::identity(n, n);
        for d in 0..self.ndim {
            F[(2 * d, 2 * d + 1)] = ts;
        }
        F
    }

    fn Q(&self, ts: f64) -> DMatrix<f64> {
        let n = self.state_dim();
        let block = DMatrix::<f64>::from_row_slice(
            2,
            2,
            &[
                ts.powi(3) / 3.0, ts.powi(2) / 2.0,
                ts.powi(2) / 2.0, ts,
            ],
        );
        let mut Q = DMatrix::zeros(n, n);
        for d in 0..self.ndim {
            Q.view_mut((2 * d, 2 * d), (2, 2)).copy_from(&block);
        }
        Q *= self.sigma_a.powi(2);
        Q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn test_CV_f() {
        let sigma_a = 0.01;
        let ts = 1.0;
        let x = DVector::from_row_slice(&[1., 3., 2., 4.]);
        let cv = ConstantVelocity::new(sigma_a, 2);
        let x_correct = DVector::from_row_slice(&[4., 3., 6., 4.]);
        let x_next = cv.f(&x, ts);
        assert!(x_correct.relative_eq(&x_next, 1e-5, 1e-5));
    }

    #[test]
    fn test_CV_F() {
        let ts = 0.5;
        let cv = ConstantVelocity::new(0.01, 2);
        let F_correct = DMatrix::from_row_slice(
            4,
            4,
            &[
                1., ts, 0., 0.,
                0., 1., 0., 0.,
                0., 0., 1., ts,
                0., 0., 0., 1.,
            ],
        );
        assert!(F_correct.relative_eq(&cv.F(ts), 1e-5, 1e-5));
    }

    #[test]
    fn test_CV_Q() {
        let sigma_a = 0.01;
        let ts = 1.0;
        let cv = ConstantVelocity::new(sigma_a, 2);
        let Q_correct = DMatrix::<f64>::from_row_slice(
            4,
            4,
            &[
                1. / 3., 0.5, 0., 0.,
                0.5, 1., 0., 0.,
                0., 0., 1. / 3., 0.5,
                0., 0., 0.5, 1.,
            ],
        ) * sigma_a
            * sigma_a;
        let Q_test = cv.Q(ts);
        assert!(Q_correct.relative_eq(&Q_test, 1e-12, 1e-5));
        assert!(Q_test.cholesky().is_some());
    }

    #[test]
    fn test_CV_one_dimension() {
        let cv = ConstantVelocity::new(1.0, 1);
        assert_eq!(cv.state_dim(), 2);
        assert_eq!(cv.Q(2.0).shape(), (2, 2));
        assert_eq!(cv.F(2.0)[(0, 1)], 2.0);
    }
}
