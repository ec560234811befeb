use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;

use crate::{
    config::LoadError,
    domain::error::DomainError,
    infra::{client::RenderError, error::InfraError},
};

/// Failure of a single export call.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl ExportError {
    /// True when the export server answered with something other than image
    /// content or a redirect token.
    pub fn is_unexpected_response(&self) -> bool {
        matches!(
            self,
            ExportError::Render(RenderError::UnexpectedResponse { .. })
        )
    }
}

/// Top-level error for the command-line binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("failed to read chart configuration {path}: {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Messages of an error and all of its sources, outermost first.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        let message = inner.to_string();
        if messages.last() != Some(&message) {
            messages.push(message);
        }
        current = inner.source();
    }
    messages
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn unexpected_response_is_detected_through_wrapper() {
        let err = ExportError::from(RenderError::UnexpectedResponse {
            status: StatusCode::OK,
            detail: "nope".into(),
        });
        assert!(err.is_unexpected_response());

        let err = ExportError::from(DomainError::invalid_option("width", "zero"));
        assert!(!err.is_unexpected_response());
    }

    #[test]
    fn error_chain_collects_sources() {
        let io = std::io::Error::other("disk full");
        let err = AppError::from(ExportError::from(InfraError::output("chart.png", io)));

        let chain = error_chain(&err);
        assert_eq!(
            chain,
            vec![
                "failed to write output file chart.png: disk full".to_string(),
                "disk full".to_string(),
            ]
        );
    }
}
