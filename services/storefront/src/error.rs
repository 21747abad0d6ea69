//! Custom error types for the storefront service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the storefront service
///
/// Every variant maps to a 4xx status except `Unavailable`, which covers
/// store-level failures and maps to 503.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No credential was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// The presented credential is invalid or expired, or a login failed
    #[error("Invalid username or password")]
    InvalidCredential,

    /// The requested resource does not exist for this caller
    #[error("{0}")]
    NotFound(String),

    /// Requested quantity exceeds the available stock
    #[error("Insufficient stock")]
    InsufficientStock { available: i32 },

    /// Order placement with no items
    #[error("Cart is empty")]
    EmptyCart,

    /// Missing or malformed input fields
    #[error("{0}")]
    Validation(String),

    /// Duplicate username or email
    #[error("{0}")]
    Conflict(String),

    /// The store is unreachable or timed out
    #[error("Service unavailable")]
    Unavailable,

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthenticated | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientStock { .. } | ApiError::EmptyCart | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            // The frontend redirects to the login page on these
            ApiError::Unauthenticated | ApiError::InvalidCredential => Json(json!({
                "error": self.to_string(),
                "needsLogin": true,
            })),
            ApiError::InsufficientStock { available } => Json(json!({
                "error": self.to_string(),
                "available": available,
            })),
            _ => Json(json!({
                "error": self.to_string(),
            })),
        };

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            err if err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()) =>
            {
                ApiError::Conflict("Email or username already registered".to_string())
            }
            err => {
                tracing::error!("Store error: {}", err);
                ApiError::Unavailable
            }
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredential.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InsufficientStock { available: 2 }
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::EmptyCart.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("dup".to_string()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_login_failure_message_does_not_name_the_field() {
        // Wrong username and wrong password must be indistinguishable
        assert_eq!(
            ApiError::InvalidCredential.to_string(),
            "Invalid username or password"
        );
    }
}
