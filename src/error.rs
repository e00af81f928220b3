use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Machine-readable failure category carried in every error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidDate,
    DatabaseError,
    AnalysisError,
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidDate => "INVALID_DATE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::AnalysisError => "ANALYSIS_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid date format. Use YYYY-MM-DD (got `{0}`)")]
    InvalidDate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Daily analysis failed: {0}")]
    Analysis(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn database(message: impl Into<String>) -> Self {
        AnalysisError::Database(message.into())
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "feedback::analysis", %message, "analysis fault");
        AnalysisError::Analysis(message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        AnalysisError::Config(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::InvalidDate(_) => ErrorCode::InvalidDate,
            AnalysisError::Database(_) => ErrorCode::DatabaseError,
            AnalysisError::Analysis(_) => ErrorCode::AnalysisError,
            AnalysisError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

impl From<sqlx::Error> for AnalysisError {
    fn from(err: sqlx::Error) -> Self {
        AnalysisError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AnalysisError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AnalysisError::Database(err.to_string())
    }
}

/// JSON body emitted in place of a report when an invocation fails.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub code: ErrorCode,
    pub timestamp: DateTime<Utc>,
}

impl From<&AnalysisError> for ErrorReport {
    fn from(err: &AnalysisError) -> Self {
        ErrorReport {
            error: true,
            message: err.to_string(),
            code: err.code(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        assert_eq!(
            AnalysisError::InvalidDate("2024-13-01".into()).code().as_str(),
            "INVALID_DATE"
        );
        assert_eq!(
            AnalysisError::database("connection refused").code().as_str(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AnalysisError::analysis("rating 9 out of range").code().as_str(),
            "ANALYSIS_ERROR"
        );
    }

    #[test]
    fn error_report_serializes_type_field() {
        let err = AnalysisError::database("connection refused");
        let report = ErrorReport::from(&err);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["error"], true);
        assert_eq!(json["type"], "DATABASE_ERROR");
        assert_eq!(json["message"], "Database error: connection refused");
    }
}
