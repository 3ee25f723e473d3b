use http::StatusCode;
use thiserror::Error;

/// A failed call to the identity provider
///
/// Failures are never retried. Each carries the status and reason that
/// should be reported to the caller.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider answered with a non-success status
    #[error("identity provider responded with {status}: {reason}")]
    Status {
        /// The status returned by the provider
        status: StatusCode,
        /// The response body, or the canonical reason phrase when empty
        reason: String,
    },
    /// The provider could not be reached in time
    #[error("identity provider unavailable: {reason}")]
    Unavailable {
        /// What went wrong
        reason: String,
    },
    /// The provider answered with a body that could not be understood
    #[error("unable to decode identity provider response: {reason}")]
    Decode {
        /// What went wrong
        reason: String,
    },
}

impl UpstreamError {
    /// Builds a status failure from the response body
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        let reason = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_owned()
        } else {
            body
        };

        Self::Status { status, reason }
    }

    /// The status to report for this failure
    ///
    /// An unreachable provider is reported as `503 Service Unavailable` and an
    /// unreadable answer as `502 Bad Gateway`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Decode { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// The reason to report for this failure
    pub fn reason(&self) -> &str {
        match self {
            Self::Status { reason, .. }
            | Self::Unavailable { reason }
            | Self::Decode { reason } => reason,
        }
    }
}

impl From<reqwest_middleware::Error> for UpstreamError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::Unavailable {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            reason: err.to_string(),
        }
    }
}
