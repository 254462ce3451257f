use thiserror::Error;

use crate::types::Facet;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Failed to fetch {endpoint}: {cause}")]
    FetchFailed { endpoint: String, cause: String },

    #[error("Failed to fetch {facet}: {cause}")]
    PartialFacetFailure { facet: Facet, cause: String },

    #[error("Analysis request failed ({status}): {message}")]
    AnalysisFailed { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0} is not configured")]
    ConfigurationMissing(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FinderError {
    pub fn fetch(endpoint: &str, cause: impl std::fmt::Display) -> Self {
        FinderError::FetchFailed {
            endpoint: endpoint.to_string(),
            cause: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
