//! Data Transfer Objects for the HTTP API.
//!
//! Every response, success or failure, is wrapped in the same envelope:
//!
//! ```json
//! {
//!   "success": true,
//!   "statusCode": 200,
//!   "request": { "method": "GET", "url": "/v1/categories" },
//!   "message": "Categories retrieved successfully",
//!   "data": { ... }
//! }
//! ```
//!
//! Failures set `success` to false, `data` to null and may add an `errors`
//! list of `{ field, message }` entries.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use super::error::ErrorDetails;
use crate::services::FieldError;

/// Method and URL of the request being answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
}

impl RequestInfo {
    pub fn new(method: &Method, url: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            url: url.into(),
        }
    }

    fn from_parts(parts: &Parts) -> Self {
        let url = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.to_string())
            .unwrap_or_else(|| parts.uri.to_string());
        Self::new(&parts.method, url)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestInfo>()
            .cloned()
            .unwrap_or_else(|| Self::from_parts(parts)))
    }
}

/// Wire form of the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub request: RequestInfo,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeFieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeFieldError {
    pub field: String,
    pub message: String,
}

impl From<FieldError> for EnvelopeFieldError {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

impl Envelope<()> {
    pub fn failure(status: StatusCode, request: RequestInfo, details: ErrorDetails) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            request,
            message: details.message,
            data: None,
            errors: details.errors.into_iter().map(Into::into).collect(),
        }
    }
}

/// Successful handler response.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    request: RequestInfo,
    message: String,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(request: RequestInfo, message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, request, message, data)
    }

    pub fn created(request: RequestInfo, message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, request, message, data)
    }

    pub fn accepted(request: RequestInfo, message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::ACCEPTED, request, message, data)
    }

    pub fn with_status(
        status: StatusCode,
        request: RequestInfo,
        message: impl Into<String>,
        data: T,
    ) -> Self {
        Self {
            status,
            request,
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            success: true,
            status_code: self.status.as_u16(),
            request: self.request,
            message: self.message,
            data: Some(self.data),
            errors: Vec::new(),
        };
        (self.status, Json(envelope)).into_response()
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Result of an analytics ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcceptedEvents {
    pub accepted: usize,
}
