use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("invalid filter {key}: {reason}")]
    InvalidFilter { key: String, reason: String },

    #[error("aggregation query failed: {0}")]
    Source(String),
}

impl ReportError {
    pub fn invalid_filter(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
