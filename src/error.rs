use std::time::Duration;

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::domain::Version;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<std::convert::Infallible> for FeedError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Coarse classification used by the transport layer to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// Bad input from the caller (4xx).
    Client,
    /// An upstream collaborator failed or timed out (5xx, safe to retry).
    Retryable,
    /// Backend data is inconsistent or malformed; needs operator attention.
    Integrity,
    /// Misconfiguration of the engine itself.
    Internal,
}

impl FeedError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Upstream(UpstreamError::Malformed(_)) => ErrorClass::Integrity,
            Self::Upstream(_) => ErrorClass::Retryable,
            Self::Request(_) => ErrorClass::Client,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Config(_) => ErrorClass::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

/// Errors raised by the time-series provider, the horizon provider or the analytics store.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("Malformed upstream payload: {0}")]
    Malformed(String),

    #[error("Deadline of {0:?} exceeded while computing page")]
    DeadlineExceeded(Duration),

    #[error("Page computation cancelled by caller")]
    Cancelled,
}

impl UpstreamError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors caused by the caller's input.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid cursor: '{0}'")]
    InvalidCursor(String),

    #[error("Invalid page size {requested} (allowed: 1..={max})")]
    InvalidPageSize { requested: usize, max: usize },

    #[error("Invalid account address: {0}")]
    InvalidAddress(String),
}

/// Inconsistencies between the balance history and the transaction tables.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("No transaction record found for version {version}")]
    UnresolvedTransaction { version: Version },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid feed configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse feed configuration")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read feed configuration")]
    Io(#[from] std::io::Error),

    #[error("Invalid duration in feed configuration")]
    Duration(#[from] humantime::DurationError),
}
