use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("malformed condition '{condition}': {reason}")]
    Format { condition: String, reason: String },

    #[error("inconsistent rules: {0}")]
    InconsistentRules(String),

    #[error("malformed fitted tree: {0}")]
    MalformedTree(String),

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl CompressError {
    pub(crate) fn format(condition: &str, reason: impl Into<String>) -> Self {
        CompressError::Format {
            condition: condition.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
