use std::{error::Error as StdError, fmt};

use axum::http::StatusCode;
use realmsync_gateway::UpstreamError;
use thiserror::Error;

/// One or more problems with caller-supplied input
///
/// Messages are collected rather than reported one at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    /// An empty set of problems
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// The problems recorded so far
    #[inline]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether no problems were recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Folds the problems of `other` into this one
    pub fn merge(&mut self, other: ValidationError) {
        self.messages.extend(other.messages);
    }

    /// `Ok` when no problems were recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("\n"))
    }
}

impl StdError for ValidationError {}

impl<S: Into<String>> FromIterator<S> for ValidationError {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// The ways a user or role operation can fail
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The identity provider failed or rejected a call
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// The caller supplied invalid input
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The requested resource does not exist
    #[error("{0}")]
    NotFound(String),
    /// Anything else
    #[error("unexpected error")]
    Unexpected(#[source] Box<dyn StdError + Send + Sync>),
}

impl ServiceError {
    /// Wraps an unanticipated failure
    pub fn unexpected(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Unexpected(err.into())
    }

    /// The status reported for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(err) => err.status_code(),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined_by_newlines() {
        let err: ValidationError = ["username must not be empty", "invalid email address"]
            .into_iter()
            .collect();
        assert_eq!(
            err.to_string(),
            "username must not be empty\ninvalid email address"
        );
    }

    #[test]
    fn empty_validation_is_ok() {
        assert_eq!(ValidationError::new().into_result(), Ok(()));
    }

    #[test]
    fn upstream_status_is_passed_through() {
        let err = ServiceError::from(UpstreamError::status(StatusCode::CONFLICT, "exists"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn unexpected_is_internal() {
        let err = ServiceError::unexpected("boom");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
