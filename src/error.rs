use thiserror::Error;

/// Errors raised by the cross-covariance and consistency computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("dimension mismatch in {operation}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        operation: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("singular matrix in {operation}")]
    SingularMatrix { operation: &'static str },

    #[error("covariance is not positive definite")]
    NotPositiveDefinite,

    #[error("sequence lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("mean of an empty sequence is undefined")]
    EmptyInput,

    #[error("confidence level must lie in (0, 1), got {0}")]
    InvalidConfidence(f64),

    #[error("chi-square degrees of freedom must be positive, got {0}")]
    InvalidDegreesOfFreedom(usize),

    #[error("step {step}: {source}")]
    AtStep {
        step: usize,
        #[source]
        source: Box<ConsistencyError>,
    },
}

impl ConsistencyError {
    pub(crate) fn at_step(self, step: usize) -> Self {
        ConsistencyError::AtStep {
            step,
            source: Box::new(self),
        }
    }

    /// Innermost error, with any step context stripped
    pub fn root(&self) -> &ConsistencyError {
        match self {
            ConsistencyError::AtStep { source, .. } => source.root(),
            other => other,
        }
    }

    /// Step at which the failure occurred, if known
    pub fn step(&self) -> Option<usize> {
        match self {
            ConsistencyError::AtStep { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsistencyError>;

/// Checks that `found` equals `expected`, naming `operation` on failure
pub(crate) fn ensure_shape(
    operation: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(ConsistencyError::DimensionMismatch {
            operation,
            expected,
            found,
        })
    }
}
