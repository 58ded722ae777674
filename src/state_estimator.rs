pub mod models;

use nalgebra::{DMatrix, DVector};

/// Mean and covariance of one estimator at one time step
#[derive(Debug, Clone, PartialEq)]
pub struct GaussParams {
    pub x: DVector<f64>,
    pub P: DMatrix<f64>,
}

impl GaussParams {
    pub fn new(x: DVector<f64>, P: DMatrix<f64>) -> Self {
        GaussParams { x, P }
    }

    pub fn dim(&self) -> usize {
        self.x.len()
    }
}

/// True state at one time step, paired by index with a `GaussParams`
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthState {
    pub x: DVector<f64>,
}

impl GroundTruthState {
    pub fn new(x: DVector<f64>) -> Self {
        GroundTruthState { x }
    }
}

impl From<DVector<f64>> for GroundTruthState {
    fn from(x: DVector<f64>) -> Self {
        GroundTruthState::new(x)
    }
}

/// Matrices one local filter used at one step: measurement matrix `H`,
/// Kalman gain `K` and state transition `F`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFilterStep {
    pub H: DMatrix<f64>,
    pub K: DMatrix<f64>,
    pub F: DMatrix<f64>,
}

impl LocalFilterStep {
    pub fn new(H: DMatrix<f64>, K: DMatrix<f64>, F: DMatrix<f64>) -> Self {
        LocalFilterStep { H, K, F }
    }

    /// State dimension implied by the transition matrix
    pub fn state_dim(&self) -> usize {
        self.F.nrows()
    }
}

/// Read-only view of a finished run of an external tracking filter.
///
/// Step `k` of `estimate` and `filter_step` refer to the same time instant.
pub trait TrackOutput {
    fn num_steps(&self) -> usize;

    fn estimate(&self, k: usize) -> &GaussParams;

    fn filter_step(&self, k: usize) -> &LocalFilterStep;
}

/// Owned record of a tracking run, filled in by the caller step by step
#[derive(Debug, Clone, Default)]
pub struct RecordedTrack {
    estimates: Vec<GaussParams>,
    steps: Vec<LocalFilterStep>,
}

impl RecordedTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        RecordedTrack {
            estimates: Vec::with_capacity(n),
            steps: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, estimate: GaussParams, step: LocalFilterStep) {
        self.estimates.push(estimate);
        self.steps.push(step);
    }

    pub fn estimates(&self) -> &[GaussParams] {
        &self.estimates
    }

    pub fn steps(&self) -> &[LocalFilterStep] {
        &self.steps
    }
}

impl TrackOutput for RecordedTrack {
    fn num_steps(&self) -> usize {
        self.estimates.len()
    }

    fn estimate(&self, k: usize) -> &GaussParams {
        &self.estimates[k]
    }

    fn filter_step(&self, k: usize) -> &LocalFilterStep {
        &self.steps[k]
    }
}
