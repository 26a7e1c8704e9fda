//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use modelres_sdk::{ErrorBody, ResourceError, StatusCategory};
use thiserror::Error;

/// Server error type
#[derive(Error, Debug)]
pub enum ServerError {
    /// A resource operation failed
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// No resource is registered under the requested name
    #[error("No resource named '{0}'")]
    UnknownResource(String),

    /// An interceptor refused the request
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Resource(err) => match err.status() {
                StatusCategory::BadRequest => StatusCode::BAD_REQUEST,
                StatusCategory::NotFound => StatusCode::NOT_FOUND,
                StatusCategory::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::UnknownResource(_) => StatusCode::NOT_FOUND,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{message, errors?}` response body
    pub fn body(&self) -> ErrorBody {
        match self {
            ServerError::Resource(err) => err.body(),
            other => ErrorBody {
                message: other.to_string(),
                errors: Default::default(),
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_status_codes() {
        let cases = [
            (ResourceError::MissingKey("x".into()), StatusCode::BAD_REQUEST),
            (ResourceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ResourceError::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ResourceError::UnsupportedOrdering, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ServerError::UnknownResource("ghosts".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ServerError::Forbidden("read-only".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_body_uses_resource_message() {
        let err = ServerError::from(ResourceError::malformed_body());
        assert_eq!(
            err.body().message,
            "The data sent in the request was malformed"
        );
        assert_eq!(
            ServerError::UnknownResource("ghosts".into()).body().message,
            "No resource named 'ghosts'"
        );
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let err: ServerError = anyhow::anyhow!("something went wrong").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    }
}
