pub mod dynamic;
pub mod measurement;

use nalgebra::{DMatrix, DVector};

/// Linear transition model `x_k = F x_{k-1} + w`, `w ~ N(0, Q)`
pub trait DynamicModel {
    fn state_dim(&self) -> usize;
    fn F(&self, ts: f64) -> DMatrix<f64>;
    fn Q(&self, ts: f64) -> DMatrix<f64>;

    fn f(&self, x: &DVector<f64>, ts: f64) -> DVector<f64> {
        self.F(ts) * x
    }
}

/// Linear measurement model `z = H x + v`, `v ~ N(0, R)`
pub trait MeasurementModel {
    fn measurement_dim(&self) -> usize;
    fn H(&self) -> DMatrix<f64>;
    fn R(&self) -> DMatrix<f64>;

    fn h(&self, x: &DVector<f64>) -> DVector<f64> {
        self.H() * x
    }
}
