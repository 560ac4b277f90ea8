use crate::constants::STORE_FAILURE_MESSAGE;
use crate::error::AccessError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

/// Error rendered by the REST surface as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let status = match &err {
            AccessError::Validation { .. } => StatusCode::BAD_REQUEST,
            AccessError::NotFound { .. } => StatusCode::NOT_FOUND,
            AccessError::Conflict { .. } => StatusCode::CONFLICT,
            AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match err {
            AccessError::Store(_) => STORE_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        };
        Self { status, message }
    }
}

// Malformed input is a client error, never the framework's default 422.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(format!("Invalid id: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            warn!("{} {}", self.status.as_u16(), self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn access_errors_map_to_statuses() {
        let cases = [
            (AccessError::validation("name", "name is required"), StatusCode::BAD_REQUEST),
            (AccessError::not_found("Post", 3), StatusCode::NOT_FOUND),
            (
                AccessError::Conflict {
                    message: "Email already exists".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                AccessError::Store(StoreError::database("disk I/O error")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn store_failures_are_opaque() {
        let err = ApiError::from(AccessError::Store(StoreError::database("no such table")));
        assert_eq!(err.message, "Database error");
    }
}
