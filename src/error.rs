// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::ai::AiError;
use crate::database::DatabaseError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        details: Option<Value>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to the `{ success: false, error }` envelope
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { details: Some(details), .. } = self {
            response["details"] = details.clone();
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, details: Option<Value>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Map a store failure to a response, using `context` as the client
    /// message for anything that is not a recognised constraint or outage.
    pub fn from_database(err: DatabaseError, context: &str) -> Self {
        if err.is_not_found() {
            return ApiError::not_found(format!("{context}: record not found"));
        }
        if err.is_unique_violation() {
            return ApiError::conflict(format!("{context}: a conflicting record already exists"));
        }
        if err.is_foreign_key_violation() {
            return ApiError::bad_request(format!("{context}: a referenced record does not exist"));
        }
        if err.is_unavailable() {
            tracing::error!("{}: database unavailable: {}", context, err);
            return ApiError::service_unavailable("Database temporarily unavailable");
        }
        tracing::error!("{}: {}", context, err);
        ApiError::internal_server_error(context.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::from_database(err, "An error occurred while processing your request")
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        tracing::error!("AI provider error: {}", err);
        match err {
            AiError::EmptyResponse => {
                ApiError::service_unavailable("AI service returned no content. Please try again later.")
            }
            _ => ApiError::service_unavailable("AI service is currently unavailable. Please try again later."),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_success_false_and_message() {
        let body = ApiError::forbidden("nope").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
        assert_eq!(body["code"], "FORBIDDEN");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn validation_details_are_included() {
        let err = ApiError::validation_error("Invalid request body", Some(json!({"workflowName": "required"})));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["details"]["workflowName"], "required");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = ApiError::from_database(DatabaseError::Sqlx(sqlx::Error::RowNotFound), "Failed to fetch claim");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn pool_timeout_maps_to_503() {
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn unknown_database_errors_keep_context_message() {
        let err = ApiError::from_database(DatabaseError::Sqlx(sqlx::Error::Protocol("boom".into())), "Error updating brand");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Error updating brand");
    }
}
