#![allow(non_snake_case)]
//! Filter diagnostics for offline tracking experiments: the cross-covariance
//! of the estimation errors of two local filters, NEES/ANEES consistency
//! metrics and track-to-track fusion.
//!
//! The tracking filter itself is external. It hands over estimates, gains
//! and model matrices through the types in [`state_estimator`].
pub mod error;
pub mod config;
pub mod state_estimator;
pub mod cross_covariance;
pub mod consistency;
pub mod fusion;
pub mod plotting;

pub use config::{ConsistencyConfig, LengthPolicy};
pub use consistency::{compute_anees, compute_nees, ConsistencyReport};
pub use cross_covariance::compute_cross_covariance;
pub use error::{ConsistencyError, Result};
pub use state_estimator::{
    GaussParams, GroundTruthState, LocalFilterStep, RecordedTrack, TrackOutput,
};
