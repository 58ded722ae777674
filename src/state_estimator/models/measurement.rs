use super::MeasurementModel;
use nalgebra::DMatrix;

/// Measures a subset of the state directly. Measurement row `i` observes
/// state component `mapping[i]`.
#[derive(Debug, Clone)]
pub struct LinearGaussian {
    ndim_state: usize,
    mapping: Vec<usize>,
    noise_covar: DMatrix<f64>,
}

impl LinearGaussian {
    /// Returns `None` if a mapped index is out of range or `noise_covar`
    /// does not match the number of mapped components.
    pub fn new(ndim_state: usize, mapping: Vec<usize>, noise_covar: DMatrix<f64>) -> Option<Self> {
        let m = mapping.len();
        if mapping.iter().any(|&i| i >= ndim_state) || noise_covar.shape() != (m, m) {
            return None;
        }
        Some(LinearGaussian {
            ndim_state,
            mapping,
            noise_covar,
        })
    }

    /// Position measurement with isotropic noise `sigma_p`
    pub fn position(ndim_state: usize, mapping: Vec<usize>, sigma_p: f64) -> Option<Self> {
        let m = mapping.len();
        let R = DMatrix::<f64>::identity(m, m) * sigma_p.powi(2);
        Self::new(ndim_state, mapping, R)
    }
}

impl MeasurementModel for LinearGaussian {
    fn measurement_dim(&self) -> usize {
        self.mapping.len()
    }

    fn H(&self) -> DMatrix<f64> {
        let mut H = DMatrix::zeros(self.mapping.len(), self.ndim_state);
        for (row, &col) in self.mapping.iter().enumerate() {
            H[(row, col)] = 1.0;
        }
        H
    }

    fn R(&self) -> DMatrix<f64> {
        self.noise_covar.clone()
    }
}
