//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses are `{"error": string}` JSON bodies with
//! conventional status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::orders::OrderError;
use crate::db::payments::PaymentError;
use crate::gateway::GatewayError;
use crate::middleware::auth::GateError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication gate rejected the request.
    #[error("Auth gate error: {0}")]
    Gate(#[from] GateError),

    /// Credential/OTP operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order transaction sequence failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Payment round-trip failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Payment gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Domain conflict (state does not allow the operation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Gate(err) => match err {
                GateError::Forbidden => StatusCode::FORBIDDEN,
                GateError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::AccountDeactivated => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::InvalidOrExpiredOtp
                | AuthError::MissingProfileFields => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::ProductNotFound(_) | OrderError::OrderNotFound => {
                    StatusCode::NOT_FOUND
                }
                OrderError::InsufficientStock { .. } | OrderError::NotCancellable(_) => {
                    StatusCode::CONFLICT
                }
                OrderError::EmptyCart | OrderError::InvalidQuantity => StatusCode::BAD_REQUEST,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::OrderNotFound | PaymentError::PaymentNotFound => {
                    StatusCode::NOT_FOUND
                }
                PaymentError::AlreadyPaid
                | PaymentError::OrderCancelled
                | PaymentError::NotCaptured => StatusCode::CONFLICT,
                PaymentError::InvalidSignature | PaymentError::InvalidAmount => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leak for 5xx responses.
    fn message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Resource not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Gate(err) => match err {
                GateError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Order(err) => match err {
                OrderError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Payment(err) => match err {
                PaymentError::Repository(_) => "Internal server error".to_string(),
                PaymentError::Gateway(_) => "Payment gateway error".to_string(),
                other => other.to_string(),
            },
            Self::Gateway(_) => "Payment gateway error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() || matches!(self, Self::Gateway(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order".to_string());
        assert_eq!(err.to_string(), "Not found: Order");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Gate(GateError::TokenExpired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Gate(GateError::Forbidden)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_domain_conflicts_are_409() {
        let err = AppError::Order(OrderError::InsufficientStock {
            name: "Widget".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let err = AppError::Payment(PaymentError::AlreadyPaid);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let err = AppError::Payment(PaymentError::NotCaptured);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_signature_mismatch_is_400() {
        let err = AppError::Payment(PaymentError::InvalidSignature);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let err = AppError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.message(), "Internal server error");
    }
}
