//! Error taxonomy shared by the engines, the HTTP front-end and the CLI.

use std::time::Duration;

use thiserror::Error;

/// Failures reported by an LLM service client. Never retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed LLM response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse category of an [`Error`], for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Service,
    Validation,
    Timeout,
    Handler,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `stage` is the fan-out task name, `synthesis` or `classification`.
    #[error("{stage}: {source}")]
    Service {
        stage: String,
        #[source]
        source: ServiceError,
    },

    #[error("{0}")]
    Validation(String),

    #[error("timed out after {0:?} waiting for the fan-out to settle")]
    Timeout(Duration),

    #[error("handler `{handler}` failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn service(stage: impl Into<String>, source: ServiceError) -> Self {
        Self::Service {
            stage: stage.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Service { .. } => ErrorKind::Service,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Handler { .. } => ErrorKind::Handler,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
