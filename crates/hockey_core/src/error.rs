use thiserror::Error;

/// Errors raised by the aggregation core.
///
/// Undefined ratios, empty inputs and unmatched roster ids are not errors:
/// they surface as `None` cells, empty tables and log lines respectively.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Missing column `{column}` required by {stage}")]
    MissingColumn { column: &'static str, stage: &'static str },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid strength state: {0:?} (expected \"AvH\", e.g. \"5v5\")")]
    InvalidStrength(String),

    #[error("Invalid season type: {0:?}")]
    InvalidSeasonType(String),

    #[error("Event source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StatsError {
    /// Whether the failure was caused by the caller's input (schema, filter
    /// values, configuration) rather than a collaborator.
    pub fn is_input_error(&self) -> bool {
        match self {
            StatsError::MissingColumn { .. } => true,
            StatsError::InvalidFilter(_) => true,
            StatsError::InvalidStrength(_) => true,
            StatsError::InvalidSeasonType(_) => true,
            StatsError::Config(_) => true,
            StatsError::Json(_) | StatsError::Yaml(_) => true,
            StatsError::Source(_) | StatsError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_names_field_and_stage() {
        let err = StatsError::MissingColumn {
            column: "home_on_1_id",
            stage: "on-ice aggregation",
        };
        let msg = err.to_string();
        assert!(msg.contains("home_on_1_id"));
        assert!(msg.contains("on-ice aggregation"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_source_errors_are_not_input_errors() {
        assert!(!StatsError::Source("timeout".into()).is_input_error());
        assert!(StatsError::InvalidStrength("5-5".into()).is_input_error());
    }
}
