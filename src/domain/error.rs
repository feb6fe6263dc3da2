//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for riskplan.
#[derive(Debug, thiserror::Error)]
pub enum RiskplanError {
    #[error("missing input: {table} ({reason})")]
    MissingInput { table: String, reason: String },

    #[error("no overlapping dates between {left} ({left_rows} rows) and {right} ({right_rows} rows)")]
    EmptyJoin {
        left: String,
        left_rows: usize,
        right: String,
        right_rows: usize,
    },

    #[error("invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RiskplanError {
    pub fn missing(table: &str, reason: impl Into<String>) -> Self {
        RiskplanError::MissingInput {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        RiskplanError::Data {
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for RiskplanError {
    fn from(err: csv::Error) -> Self {
        RiskplanError::data(format!("CSV error: {err}"))
    }
}

impl From<&RiskplanError> for std::process::ExitCode {
    fn from(err: &RiskplanError) -> Self {
        let code: u8 = match err {
            RiskplanError::Io(_) => 1,
            RiskplanError::ConfigParse { .. }
            | RiskplanError::ConfigMissing { .. }
            | RiskplanError::ConfigInvalid { .. } => 2,
            RiskplanError::InvalidBar { .. } | RiskplanError::Data { .. } => 3,
            RiskplanError::MissingInput { .. } => 4,
            RiskplanError::EmptyJoin { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
