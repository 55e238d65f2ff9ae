use serde::{Deserialize, Serialize};
use std::fmt;

use crate::upstream::UpstreamError;

/// The single wire shape of every error the relay returns.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed inbound fields; never reaches the upstream.
    BadRequest(String),
    /// Any method other than POST/OPTIONS.
    MethodNotAllowed,
    /// Transport failure, timeout, or non-2xx from the model provider.
    Upstream(String),
    /// Serialization and other unexpected failures.
    InternalServerError(String),
}

impl fmt::Display for ApiError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            ApiError::MethodNotAllowed => write!(f, "Method not allowed"),
            ApiError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            ApiError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal_server_error(msg: impl Into<String>) -> Self {
        ApiError::InternalServerError(msg.into())
    }

    /// HTTP status the error maps to, shared by both deployment surfaces.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::MethodNotAllowed => 405,
            ApiError::Upstream(_) | ApiError::InternalServerError(_) => 500,
        }
    }

    /// Message carried in the `error` field of the response body.
    ///
    /// Upstream messages are passed through so the widget can show what the
    /// model provider reported; upstream 4xx and 5xx are not distinguished.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::MethodNotAllowed => "Method Not Allowed".to_string(),
            ApiError::Upstream(msg) => msg.clone(),
            ApiError::InternalServerError(msg) => {
                format!("An unexpected server error occurred: {msg}")
            }
        }
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.status())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request("nope").status(), 400);
        assert_eq!(ApiError::MethodNotAllowed.status(), 405);
        assert_eq!(ApiError::Upstream("down".to_string()).status(), 500);
        assert_eq!(ApiError::internal_server_error("boom").status(), 500);
    }

    #[test]
    fn test_method_not_allowed_message_is_exact() {
        assert_eq!(ApiError::MethodNotAllowed.message(), "Method Not Allowed");
    }

    #[test]
    fn test_upstream_message_passes_through() {
        let err = ApiError::from(UpstreamError::Status {
            status: 503,
            message: "overloaded".to_string(),
        });
        assert!(err.message().contains("overloaded"));
        assert_eq!(err.status(), 500);
    }
}
