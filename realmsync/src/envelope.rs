use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::ServiceError;

const INTERNAL_ERROR_MESSAGE: &str = "an unexpected error occurred";

/// The uniform body of every user and role operation
///
/// An envelope describes either a complete success or a complete failure.
/// Consumers should rely only on `message` and `statusCode`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    message: String,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl ResponseEnvelope {
    /// An envelope without a payload
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: status.as_u16(),
            data: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// A successful envelope carrying `data`
    ///
    /// A payload that cannot be represented as JSON turns the envelope into
    /// an internal failure.
    pub fn success<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                data: Some(data),
                ..Self::new(status, "Success")
            },
            Err(err) => Self::failure(&ServiceError::unexpected(err)),
        }
    }

    /// A failed envelope describing `err`
    pub fn failure(err: &ServiceError) -> Self {
        let status = err.status_code();

        match err {
            ServiceError::Upstream(err) => {
                tracing::warn!(status = status.as_u16(), reason = err.reason(), "upstream failure");
                Self::new(status, err.reason())
            }
            ServiceError::Validation(err) => {
                tracing::info!(reason = %err, "invalid input");
                Self::new(status, err.to_string())
            }
            ServiceError::NotFound(what) => Self::new(status, what.as_str()),
            ServiceError::Unexpected(source) => {
                tracing::error!(error = %source, details = ?source, "unexpected failure");
                Self::new(status, INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    /// The human readable outcome
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The status of the outcome
    #[inline]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The payload of a successful outcome
    #[inline]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// When the outcome was determined
    #[inline]
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

impl From<ServiceError> for ResponseEnvelope {
    #[inline]
    fn from(err: ServiceError) -> Self {
        Self::failure(&err)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use realmsync_gateway::UpstreamError;
    use serde_json::json;

    use super::*;
    use crate::ValidationError;

    #[test]
    fn success_carries_the_payload() {
        let envelope = ResponseEnvelope::success(StatusCode::ACCEPTED, &json!({ "id": "5e1b" }));

        assert_eq!(envelope.status(), StatusCode::ACCEPTED);
        assert_eq!(envelope.message(), "Success");
        assert_eq!(envelope.data(), Some(&json!({ "id": "5e1b" })));
    }

    #[test]
    fn upstream_failure_keeps_status_and_reason() {
        let envelope: ResponseEnvelope =
            ServiceError::from(UpstreamError::status(StatusCode::CONFLICT, "User exists")).into();

        assert_eq!(envelope.status(), StatusCode::CONFLICT);
        assert_eq!(envelope.message(), "User exists");
        assert_eq!(envelope.data(), None);
    }

    #[test]
    fn validation_failure_is_bad_request() {
        let err: ValidationError = ["a", "b"].into_iter().collect();
        let envelope = ResponseEnvelope::from(ServiceError::from(err));

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.message(), "a\nb");
    }

    #[test]
    fn unexpected_failure_hides_details() {
        let envelope = ResponseEnvelope::from(ServiceError::unexpected("database password leaked"));

        assert_eq!(envelope.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!envelope.message().contains("password"));
    }

    #[test]
    fn serializes_stable_fields_in_camel_case() {
        let envelope = ResponseEnvelope::new(StatusCode::NOT_FOUND, "no such user");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["message"], "no such user");
        assert_eq!(json["statusCode"], 404);
        assert!(json.get("data").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
