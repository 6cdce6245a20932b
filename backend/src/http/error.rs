//! HTTP error handling.
//!
//! Handlers return [`AppError`]. Its response carries an [`ErrorDetails`]
//! extension rather than a body;
//! [`envelope_errors`](super::middleware::envelope_errors) turns it into the
//! uniform error envelope once the request method and URL are known.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::db::RepositoryError;
use crate::services::{FieldError, ServiceError};

/// Message and field errors for one failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ErrorDetails {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// One or more fields failed validation
    Validation(Vec<FieldError>),
    /// No credentials supplied
    Unauthorized(String),
    /// Credentials supplied but not accepted
    Forbidden(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RepositoryError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                RepositoryError::Conflict { .. } => StatusCode::CONFLICT,
                RepositoryError::ConnectionError { .. }
                | RepositoryError::ConfigurationError { .. }
                | RepositoryError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn details(&self) -> ErrorDetails {
        match self {
            AppError::Unauthorized(msg) | AppError::Forbidden(msg) => {
                ErrorDetails::new(msg.clone())
            }
            AppError::Validation(errors) => ErrorDetails {
                message: "Validation failed".to_string(),
                errors: errors.clone(),
            },
            AppError::Repository(e) => {
                let mut details = ErrorDetails::new(e.message());
                if let Some(field) = &e.context().field {
                    details.errors.push(FieldError::new(field.clone(), e.message()));
                }
                details
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }
        let mut response = status.into_response();
        response.extensions_mut().insert(self.details());
        response
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => AppError::Validation(errors),
            ServiceError::Repository(e) => AppError::Repository(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ErrorContext;

    #[test]
    fn test_repository_errors_map_to_statuses() {
        let cases = [
            (RepositoryError::not_found("gone"), StatusCode::NOT_FOUND),
            (RepositoryError::validation("bad"), StatusCode::BAD_REQUEST),
            (RepositoryError::conflict("dup"), StatusCode::CONFLICT),
            (
                RepositoryError::connection("down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RepositoryError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_conflict_with_field_reports_field_error() {
        let err = AppError::from(RepositoryError::conflict_with_context(
            "Category with this name already exists",
            ErrorContext::new("insert_item").with_field("name"),
        ));
        let details = err.details();
        assert_eq!(details.message, "Category with this name already exists");
        assert_eq!(details.errors[0].field, "name");
    }

    #[test]
    fn test_every_variant_has_a_distinct_status() {
        let validation = AppError::from(ServiceError::field("price", "Price cannot be negative"));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.details().errors[0].field, "price");

        let guard = [
            AppError::Unauthorized("Authentication required".to_string()),
            AppError::Forbidden("Admin access required".to_string()),
        ];
        let statuses: Vec<_> = guard.iter().map(AppError::status).collect();
        assert_eq!(statuses, vec![StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN]);

        let repo = AppError::from(ServiceError::from(RepositoryError::not_found("gone")));
        assert_eq!(repo.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_response_carries_details_extension() {
        let response = AppError::Forbidden("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let details = response.extensions().get::<ErrorDetails>().unwrap();
        assert_eq!(details.message, "nope");
    }
}
