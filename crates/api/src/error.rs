//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the same JSON shape:
//!
//! ```json
//! { "error": "bad_request", "message": "...", "details": { "kind": "...", ... } }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::{ErrorKind, ServiceError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Sign-in failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client (malformed body, path or query).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Service(err) => err.kind() == ErrorKind::Internal,
            Self::Auth(err) => !matches!(err, AuthError::InvalidCredentials),
            Self::Session(_) | Self::Internal(_) => true,
            Self::Unauthorized(_) | Self::Forbidden(_) | Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Service(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return ErrorBody {
                error: "internal",
                message: "Internal server error".to_string(),
                details: None,
            };
        }

        match self {
            Self::Service(ServiceError::NotFound { entity, id }) => ErrorBody {
                error: "not_found",
                message: self.to_string(),
                details: Some(serde_json::json!({ "entity": entity, "id": id })),
            },
            Self::Service(ServiceError::BadRequest(violation)) => ErrorBody {
                error: "bad_request",
                message: violation.to_string(),
                details: serde_json::to_value(violation).ok(),
            },
            Self::Auth(_) => ErrorBody {
                error: "unauthorized",
                message: "Invalid credentials".to_string(),
                details: None,
            },
            Self::Unauthorized(msg) => ErrorBody {
                error: "unauthorized",
                message: msg.clone(),
                details: None,
            },
            Self::Forbidden(msg) => ErrorBody {
                error: "forbidden",
                message: msg.clone(),
                details: None,
            },
            Self::BadRequest(msg) => ErrorBody {
                error: "bad_request",
                message: msg.clone(),
                details: None,
            },
            _ => ErrorBody {
                error: "internal",
                message: "Internal server error".to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
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

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use ecommerce_core::{CategoryId, ProductId};

    use super::*;
    use crate::db::RepositoryError;
    use crate::services::{Entity, Violation};

    async fn json_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let id = CategoryId::generate();
        let (status, body) =
            json_of(ServiceError::not_found(Entity::Category, id).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["details"]["entity"], "category");
        assert_eq!(body["details"]["id"], id.to_string());
    }

    #[tokio::test]
    async fn test_violation_body_lists_products() {
        let p2 = ProductId::generate();
        let err: AppError = ServiceError::from(Violation::ProductsUnavailable {
            product_ids: vec![p2],
        })
        .into();
        let (status, body) = json_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["details"]["kind"], "products_unavailable");
        assert_eq!(body["details"]["product_ids"][0], p2.to_string());
        assert!(body["message"].as_str().unwrap().contains(&p2.to_string()));
    }

    #[tokio::test]
    async fn test_internal_errors_are_hidden() {
        let err: AppError = ServiceError::from(RepositoryError::DataCorruption(
            "secret detail".to_string(),
        ))
        .into();
        let (status, body) = json_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal");
        assert_eq!(body["message"], "Internal server error");
        assert!(body["details"].is_null());
    }

    #[tokio::test]
    async fn test_auth_statuses() {
        let (status, body) = json_of(AppError::Auth(AuthError::InvalidCredentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, _) = json_of(AppError::Forbidden("admins only".to_string())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = json_of(AppError::Unauthorized("sign in".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }
}
