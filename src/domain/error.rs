use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid option `{option}`: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },
    #[error("failed to serialize chart configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DomainError {
    pub fn invalid_option(option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            message: message.into(),
        }
    }
}
