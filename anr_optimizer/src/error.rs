use thiserror::Error;

/// Failures local to a single facility solve or to input preparation.
///
/// A solver that terminates without an optimal solution is not represented
/// here: that outcome is a valid economic conclusion and is reported as an
/// absent result by [`crate::DeploymentOptimizer::solve_facility`].
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Missing {entity}: {key}")]
    MissingData { entity: &'static str, key: String },

    #[error("Duplicate {entity}: {key}")]
    DuplicateData { entity: &'static str, key: String },

    #[error("Invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OptimizerResult<T> = Result<T, OptimizerError>;

impl OptimizerError {
    pub(crate) fn missing(entity: &'static str, key: impl Into<String>) -> Self {
        Self::MissingData {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}
