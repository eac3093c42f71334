//! Fatal error types.
//!
//! Only configuration defects abort a run. Problems with individual jobs
//! are reported through [`crate::validation`] and never surface here.

use thiserror::Error;

use crate::models::{Category, Department, OvertimeTier};

/// A configuration defect detected before any job is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("department pipeline is empty")]
    EmptyPipeline,

    #[error("department {0} appears more than once in the pipeline")]
    DuplicateDepartment(Department),

    #[error("no capacity configured for department {0}")]
    MissingCapacity(Department),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("batching cutoff {0} is not part of the pipeline")]
    CutoffOutsidePipeline(Department),

    #[error("category precedence is missing {0}")]
    MissingCategory(Category),

    #[error("no overtime allowance configured for {0}")]
    MissingOvertime(OvertimeTier),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
