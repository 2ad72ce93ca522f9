// ⚠️ Error Taxonomy
// One error type for the whole analysis, plus localized item errors so a
// bad record or subscription never aborts its siblings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while ingesting, classifying, aggregating or forecasting
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Malformed record on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Transaction year {year} is outside the configured range {start}..={end}")]
    OutOfRange { year: i32, start: i32, end: i32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot infer cadence: first two transactions share the same date ({first} / {second})")]
    UndefinedCadence { first: NaiveDate, second: NaiveDate },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    /// Short machine-friendly code, used by the report and the HTTP API
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Parse { .. } => "parse_error",
            AnalysisError::OutOfRange { .. } => "out_of_range",
            AnalysisError::InvalidArgument(_) => "invalid_argument",
            AnalysisError::UndefinedCadence { .. } => "undefined_cadence",
            AnalysisError::Config(_) => "config_error",
            AnalysisError::Io(_) => "io_error",
            AnalysisError::Csv(_) => "csv_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

// ============================================================================
// ITEM ERRORS
// ============================================================================

/// What kind of item an error is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorScope {
    Record,
    Transaction,
    Subscription,
    Cadence,
}

/// A failure localized to one record/transaction/subscription/cadence type.
///
/// The run keeps going; these are collected alongside the successful results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub scope: ErrorScope,
    /// Line number, transaction id, subscription id or cadence code
    pub id: String,
    pub code: String,
    pub message: String,
}

impl ItemError {
    pub fn new(scope: ErrorScope, id: impl ToString, error: &AnalysisError) -> Self {
        ItemError {
            scope,
            id: id.to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?} {}] {}", self.scope, self.id, self.message)
    }
}
