//! Chi-square acceptance intervals for NEES and ANEES.
//!
//! For a consistent filter, the sum of `N` independent NEES values of
//! dimension `n` is chi-square distributed with `N * n` degrees of freedom.

use crate::error::{ConsistencyError, Result};
use serde::Serialize;
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};

/// Two-sided interval an (A)NEES value should fall in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

impl AcceptanceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Quantile `p` of the chi-square distribution with `dof` degrees of freedom
pub fn chi_squared_quantile(p: f64, dof: usize) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(ConsistencyError::InvalidConfidence(p));
    }
    if dof == 0 {
        return Err(ConsistencyError::InvalidDegreesOfFreedom(dof));
    }
    let chi = ChiSquared::new(dof as f64)
        .map_err(|_| ConsistencyError::InvalidDegreesOfFreedom(dof))?;

    // Polish the library inverse with bracketed Newton steps on the cdf
    let mut x = chi.inverse_cdf(p);
    let mut lo = 0.0;
    let mut hi = if x.is_finite() { x.max(1.0) } else { dof as f64 };
    while chi.cdf(hi) < p {
        hi *= 2.0;
    }
    if !(x > lo && x < hi) {
        x = 0.5 * (lo + hi);
    }
    for _ in 0..200 {
        let err = chi.cdf(x) - p;
        if err < 0.0 {
            lo = x;
        } else {
            hi = x;
        }
        let mut next = x - err / chi.pdf(x);
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }
        if (next - x).abs() <= 1e-15 * x.abs() {
            return Ok(next);
        }
        x = next;
    }
    Ok(x)
}

/// Interval for the average of `num_samples` NEES values of dimension `dim`
pub fn anees_bounds(dim: usize, num_samples: usize, confidence: f64) -> Result<AcceptanceInterval> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ConsistencyError::InvalidConfidence(confidence));
    }
    if dim == 0 {
        return Err(ConsistencyError::InvalidDegreesOfFreedom(0));
    }
    if num_samples == 0 {
        return Err(ConsistencyError::EmptyInput);
    }
    let dof = dim * num_samples;
    let alpha = 1.0 - confidence;
    let n = num_samples as f64;
    let lower = chi_squared_quantile(alpha / 2.0, dof)? / n;
    let upper = chi_squared_quantile(1.0 - alpha / 2.0, dof)? / n;
    Ok(AcceptanceInterval {
        lower,
        upper,
        confidence,
    })
}

/// Interval for a single NEES value of dimension `dim`
pub fn nees_bounds(dim: usize, confidence: f64) -> Result<AcceptanceInterval> {
    anees_bounds(dim, 1, confidence)
}
