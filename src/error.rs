//! Error taxonomy for the analysis pipeline
//!
//! Every fallible stage returns [`AnalysisError`]. Empty or singleton groups are
//! not errors; see [`crate::aggregate::AggregateWarning`].

use thiserror::Error;

/// Errors raised while ingesting, validating or modelling experiment data
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Schema error: table '{table}' is missing required column '{column}'")]
    Schema { table: String, column: String },

    #[error("Mapping error: column '{column}' has unrecognized label '{value}'")]
    Mapping { column: String, value: String },

    #[error("Invalid value in column '{column}': '{value}'")]
    InvalidValue { column: String, value: String },

    #[error("Duplicate key '{key}' in table '{table}'")]
    DuplicateKey { table: String, key: String },

    #[error(
        "Condition mismatch for workerid '{workerid}': participant is '{participant}', response says '{response}'"
    )]
    ConditionMismatch {
        workerid: String,
        participant: String,
        response: String,
    },

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn schema(table: &str, column: &str) -> Self {
        Self::Schema {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn mapping(column: &str, value: &str) -> Self {
        Self::Mapping {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid(column: &str, value: &str) -> Self {
        Self::InvalidValue {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
