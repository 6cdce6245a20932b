//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! validate payloads, enforce cross-record rules (duplicate names, product
//! counters) and log what they change. Every function is generic over
//! [`FullRepository`](crate::db::FullRepository), so the same rules apply to
//! any storage backend.

pub mod events;
pub mod products;
pub mod promocodes;
pub mod taxonomy;
pub mod validation;

pub use validation::FieldError;

use crate::db::RepositoryError;

/// Errors raised by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// One or more payload fields failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}
